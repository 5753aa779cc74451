//! String similarity scoring.
//!
//! The default scorer is the normalized Indel similarity
//! `2 * LCS / (|a| + |b|)` over Unicode scalar values, which is the
//! matching-block ratio used for terminology comparison: 1.0 for identical
//! strings, symmetric, and growing with the length of the shared material.

use rapidfuzz::fuzz;

/// A normalized similarity ratio in `[0, 1]`.
pub trait Similarity: Send + Sync {
    /// Similarity of two normalized keys.
    fn ratio(&self, a: &str, b: &str) -> f64;

    /// Upper bound of [`Similarity::ratio`] for strings of the given
    /// character lengths. Used to skip candidates that cannot win; the
    /// default never skips anything.
    fn upper_bound(&self, _a_len: usize, _b_len: usize) -> f64 {
        1.0
    }
}

/// Normalized Indel similarity (`rapidfuzz::fuzz::ratio`).
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl Similarity for IndelRatio {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        fuzz::ratio(a.chars(), b.chars())
    }

    fn upper_bound(&self, a_len: usize, b_len: usize) -> f64 {
        let total = a_len + b_len;
        if total == 0 {
            return 1.0;
        }
        (2 * a_len.min(b_len)) as f64 / total as f64
    }
}

/// Convert a ratio to the reported 0-100 score.
pub fn score_percent(ratio: f64) -> u8 {
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
