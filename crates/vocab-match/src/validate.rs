//! Domain validation by substring containment.
//!
//! Each corpus is a list of lowercased, flattened row texts. A term is
//! tagged with the name of the first corpus (in configured order) that
//! contains it anywhere, independent of how or whether it was matched.
//! Short terms can hit unrelated longer phrases; no word-boundary check is
//! applied.

use vocab_model::{NOT_FOUND, Table};

#[derive(Debug, Clone)]
pub struct DomainCorpus {
    name: String,
    blobs: Vec<String>,
}

impl DomainCorpus {
    /// Corpus from already flattened rows; blobs are lowercased here.
    pub fn new<I, S>(name: impl Into<String>, blobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            blobs: blobs
                .into_iter()
                .map(|blob| blob.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_table(name: impl Into<String>, table: &Table) -> Self {
        Self {
            name: name.into(),
            blobs: table.flattened_rows(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// `needle` must already be lowercase.
    fn contains(&self, needle: &str) -> bool {
        self.blobs.iter().any(|blob| blob.contains(needle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DomainValidator {
    corpora: Vec<DomainCorpus>,
}

impl DomainValidator {
    pub fn new(corpora: Vec<DomainCorpus>) -> Self {
        Self { corpora }
    }

    pub fn corpora(&self) -> &[DomainCorpus] {
        &self.corpora
    }

    /// Name of the first corpus containing `term`, or [`NOT_FOUND`].
    pub fn validate(&self, term: &str) -> &str {
        let needle = term.to_lowercase();
        if needle.trim().is_empty() {
            return NOT_FOUND;
        }
        self.corpora
            .iter()
            .find(|corpus| corpus.contains(&needle))
            .map_or(NOT_FOUND, DomainCorpus::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> DomainValidator {
        DomainValidator::new(vec![
            DomainCorpus::new(
                "echo_valve.csv",
                ["Mitral Valve E Wave Velocity cm/s", "Aortic valve area"],
            ),
            DomainCorpus::new("echo_chamber.csv", ["Left ventricular ejection fraction"]),
            DomainCorpus::new("echo_all.csv", ["aortic valve area", "ejection fraction"]),
        ])
    }

    #[test]
    fn first_corpus_hit_wins() {
        assert_eq!(validator().validate("Aortic Valve Area"), "echo_valve.csv");
        assert_eq!(validator().validate("ejection fraction"), "echo_chamber.csv");
    }

    #[test]
    fn substring_of_a_longer_phrase_counts() {
        assert_eq!(validator().validate("e wave"), "echo_valve.csv");
    }

    #[test]
    fn absent_or_empty_term_is_not_found() {
        assert_eq!(validator().validate("heart rate"), NOT_FOUND);
        assert_eq!(validator().validate(""), NOT_FOUND);
        assert_eq!(DomainValidator::default().validate("ef"), NOT_FOUND);
    }

    #[test]
    fn table_rows_are_flattened() {
        let table = Table::new(
            "echo_all.csv",
            vec!["NAME".to_string(), "UNIT".to_string()],
            vec![vec!["LA Volume".to_string(), "mL".to_string()]],
        );
        let validator = DomainValidator::new(vec![DomainCorpus::from_table("echo_all.csv", &table)]);
        assert_eq!(validator.validate("volume ml"), "echo_all.csv");
    }
}
