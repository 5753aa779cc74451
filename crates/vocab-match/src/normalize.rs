//! Term normalization.
//!
//! Two policies are used in practice:
//! - [`Normalizer::MINIMAL`]: lowercase, trim, collapse whitespace. Used for
//!   vocabulary labels and synonyms.
//! - [`Normalizer::CANONICAL`]: additionally drops punctuation and sorts
//!   tokens, for loosely formatted long names where word order varies.

use serde::{Deserialize, Serialize};

/// Text canonicalization policy. Pure: the same input always yields the
/// same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Normalizer {
    /// Remove every character that is not an ASCII letter, digit or whitespace.
    pub strip_punctuation: bool,
    /// Re-join tokens in lexicographic order.
    pub sort_tokens: bool,
}

impl Normalizer {
    pub const MINIMAL: Self = Self {
        strip_punctuation: false,
        sort_tokens: false,
    };

    pub const CANONICAL: Self = Self {
        strip_punctuation: true,
        sort_tokens: true,
    };

    /// Normalize `text` into a comparison key. Empty or blank text yields
    /// an empty key, which never matches anything.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let filtered: String = if self.strip_punctuation {
            lowered
                .chars()
                .filter(|ch| ch.is_ascii_alphanumeric() || ch.is_whitespace())
                .collect()
        } else {
            lowered
        };
        let mut tokens: Vec<&str> = filtered.split_whitespace().collect();
        if self.sort_tokens {
            tokens.sort_unstable();
        }
        tokens.join(" ")
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::MINIMAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn minimal_lowercases_and_collapses_whitespace() {
        assert_eq!(
            Normalizer::MINIMAL.normalize("Ejection  Fraction "),
            "ejection fraction"
        );
        assert_eq!(Normalizer::MINIMAL.normalize("LV E/A ratio"), "lv e/a ratio");
    }

    #[test]
    fn canonical_strips_punctuation_and_sorts_tokens() {
        assert_eq!(
            Normalizer::CANONICAL.normalize("Fraction, Ejection (LV)"),
            "ejection fraction lv"
        );
        assert_eq!(Normalizer::CANONICAL.normalize("E/A-ratio"), "earatio");
    }

    #[test]
    fn blank_text_normalizes_to_empty() {
        assert_eq!(Normalizer::MINIMAL.normalize(""), "");
        assert_eq!(Normalizer::CANONICAL.normalize("  --  "), "");
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(text in "[ A-Za-z0-9,./()éÉ\t-]{0,40}") {
            for policy in [Normalizer::MINIMAL, Normalizer::CANONICAL] {
                let once = policy.normalize(&text);
                prop_assert_eq!(policy.normalize(&once), once.clone());
            }
        }

        #[test]
        fn canonical_is_token_order_invariant(a in "[a-z0-9]{1,8}", b in "[a-z0-9]{1,8}") {
            let forward = Normalizer::CANONICAL.normalize(&format!("{a} {b}"));
            let backward = Normalizer::CANONICAL.normalize(&format!("{b} {a}"));
            prop_assert_eq!(forward, backward);
        }
    }
}
