use std::collections::HashMap;

/// Normalizes a column name for lookup: uppercase, trimmed, inner
/// whitespace collapsed, byte-order mark removed.
pub fn column_key(name: &str) -> String {
    name.trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Case- and whitespace-insensitive mapping from column names to positions.
///
/// When two headers normalize to the same key the first one wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnLookup {
    map: HashMap<String, usize>,
}

impl ColumnLookup {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (idx, name) in names.into_iter().enumerate() {
            map.entry(column_key(name.as_ref())).or_insert(idx);
        }
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.map.get(&column_key(name)).copied()
    }
}
