//! Bounded similarity scoring between company names
//!
//! Scores are integers in `0..=100`:
//!
//! ```text
//! round(100 * (1 - distance(a, b) / (len(a) + len(b))))
//! ```
//!
//! Lengths count Unicode scalar values. Halves round to even. The default
//! distance is insertion/deletion only (a substitution costs 2), which is the
//! classic Levenshtein ratio. `SimilarityMetric::Levenshtein` uses unit-cost
//! substitutions via `strsim` and scores slightly more leniently.

use serde::{Deserialize, Serialize};

use super::normalize::{default_normalizer, Normalizer};

/// Edit distance used to compute the ratio
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Insertions and deletions only
    #[default]
    Indel,
    /// Insertions, deletions and unit-cost substitutions
    Levenshtein,
}

impl SimilarityMetric {
    /// Edit distance between two strings under this metric
    pub fn distance(self, a: &str, b: &str) -> usize {
        match self {
            SimilarityMetric::Indel => indel_distance(a, b),
            SimilarityMetric::Levenshtein => strsim::levenshtein(a, b),
        }
    }

    /// Ratio of two already-normalized strings.
    ///
    /// Returns 0 when either side is empty.
    pub fn ratio(self, a: &str, b: &str) -> u8 {
        let total = a.chars().count() + b.chars().count();
        if a.is_empty() || b.is_empty() {
            return 0;
        }

        let distance = self.distance(a, b).min(total);
        let score = 100.0 * (total - distance) as f64 / total as f64;
        score.round_ties_even().clamp(0.0, 100.0) as u8
    }
}

/// Ratio of two already-normalized strings with the default metric
pub fn ratio(a: &str, b: &str) -> u8 {
    SimilarityMetric::default().ratio(a, b)
}

/// Similarity of two raw company names.
///
/// Both names are normalized first; raw strings are never compared.
///
/// # Examples
///
/// ```
/// use cik_merge::entity_linking::similarity::similarity;
///
/// assert_eq!(similarity("Acme, Inc.", "ACME CORP"), 100);
/// assert!(similarity("Acme", "Zenith") < 50);
/// ```
pub fn similarity(a: &str, b: &str) -> u8 {
    similarity_with(default_normalizer(), SimilarityMetric::default(), a, b)
}

/// Similarity of two raw names with an explicit normalizer and metric
pub fn similarity_with(normalizer: &Normalizer, metric: SimilarityMetric, a: &str, b: &str) -> u8 {
    metric.ratio(&normalizer.normalize(a), &normalizer.normalize(b))
}

/// `len(a) + len(b) - 2 * lcs(a, b)`
fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * lcs_len(&a, &b)
}

/// Longest common subsequence length, two-row table
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
