//! Order-guided name resolution against a sorted registry
//!
//! The resolver runs a modified binary search. Each probe scores the query
//! against the midpoint entry; a score at or above the threshold ends the
//! search immediately (first acceptable match, not best match). Otherwise the
//! raw names are compared case-insensitively to decide which half to keep.
//!
//! Direction uses raw names while acceptance uses normalized names. If
//! normalization reorders two names relative to their raw order, the search
//! can narrow away from the true match. `SearchStrategy::Linear` avoids that
//! at O(N) cost.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::normalize::Normalizer;
use super::registry::{CikRegistry, RegistryEntry};
use super::similarity::SimilarityMetric;

/// Default acceptance threshold
pub const DEFAULT_THRESHOLD: u8 = 90;

/// Rendering of a missing identifier or name in output records
pub const NOT_FOUND: &str = "N/A";

static DEFAULT_RESOLVER: Lazy<Resolver> = Lazy::new(Resolver::default);

/// How the registry is searched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Modified binary search, O(log N) probes
    #[default]
    Bisect,
    /// Scan in registry order, first entry at or above the threshold wins
    Linear,
}

/// Resolver tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Minimum similarity (0-100) to accept a candidate
    pub threshold: u8,
    pub metric: SimilarityMetric,
    pub strategy: SearchStrategy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metric: SimilarityMetric::default(),
            strategy: SearchStrategy::default(),
        }
    }
}

/// A registry entry accepted for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryMatch<'r> {
    pub entry: &'r RegistryEntry,
    /// Index of the entry in the registry
    pub position: usize,
    pub score: u8,
}

/// Outcome of resolving one name. `NotFound` is an ordinary result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult<'r> {
    Matched(RegistryMatch<'r>),
    NotFound,
}

impl<'r> MatchResult<'r> {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }

    pub fn identifier(&self) -> Option<&'r str> {
        match self {
            MatchResult::Matched(m) => Some(m.entry.identifier.as_str()),
            MatchResult::NotFound => None,
        }
    }

    pub fn matched_name(&self) -> Option<&'r str> {
        match self {
            MatchResult::Matched(m) => Some(m.entry.name.as_str()),
            MatchResult::NotFound => None,
        }
    }

    pub fn score(&self) -> Option<u8> {
        match self {
            MatchResult::Matched(m) => Some(m.score),
            MatchResult::NotFound => None,
        }
    }
}

/// One similarity evaluation during a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub lo: usize,
    pub hi: usize,
    pub mid: usize,
    pub score: u8,
}

/// Every probe made while resolving one query, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchTrace {
    pub probes: Vec<Probe>,
}

impl SearchTrace {
    pub fn evaluations(&self) -> usize {
        self.probes.len()
    }
}

/// Resolves company names to registry entries.
///
/// Holds no mutable state; one resolver can serve many threads against a
/// shared registry.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
    normalizer: Normalizer,
}

impl Resolver {
    pub fn new(config: ResolverConfig, normalizer: Normalizer) -> Self {
        Self { config, normalizer }
    }

    /// Default resolver with a different acceptance threshold
    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            config: ResolverConfig {
                threshold,
                ..ResolverConfig::default()
            },
            normalizer: Normalizer::default(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Normalize a name the same way `resolve` does
    pub fn normalize(&self, name: &str) -> String {
        self.normalizer.normalize(name)
    }

    /// Resolve a raw name against the registry.
    ///
    /// The registry must be sorted ascending by name, case-insensitively,
    /// for `SearchStrategy::Bisect`. An unsorted registry degrades to missed
    /// matches, never to a panic.
    pub fn resolve<'r>(&self, query: &str, registry: &'r CikRegistry) -> MatchResult<'r> {
        self.resolve_traced(query, registry).0
    }

    /// Resolve and return every probe made along the way
    pub fn resolve_traced<'r>(
        &self,
        query: &str,
        registry: &'r CikRegistry,
    ) -> (MatchResult<'r>, SearchTrace) {
        let query_norm = self.normalizer.normalize(query);
        let (result, trace) = match self.config.strategy {
            SearchStrategy::Bisect => self.bisect(query, &query_norm, registry),
            SearchStrategy::Linear => self.scan(&query_norm, registry),
        };

        match &result {
            MatchResult::Matched(m) => tracing::debug!(
                query,
                cik = %m.entry.identifier,
                matched = %m.entry.name,
                score = m.score,
                probes = trace.evaluations(),
                "Resolved"
            ),
            MatchResult::NotFound => tracing::debug!(
                query,
                probes = trace.evaluations(),
                "No registry entry met the threshold"
            ),
        }

        (result, trace)
    }

    fn score(&self, query_norm: &str, entry: &RegistryEntry) -> u8 {
        self.config
            .metric
            .ratio(query_norm, &self.normalizer.normalize(&entry.name))
    }

    fn bisect<'r>(
        &self,
        query: &str,
        query_norm: &str,
        registry: &'r CikRegistry,
    ) -> (MatchResult<'r>, SearchTrace) {
        let mut trace = SearchTrace::default();
        let entries = registry.entries();

        let Some(mut hi) = entries.len().checked_sub(1) else {
            return (MatchResult::NotFound, trace);
        };
        let mut lo = 0usize;
        let query_key = query.to_lowercase();

        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let entry = &entries[mid];
            let score = self.score(query_norm, entry);

            tracing::trace!(lo, hi, mid, score, candidate = %entry.name, "Probe");
            trace.probes.push(Probe { lo, hi, mid, score });

            if score >= self.config.threshold {
                let found = RegistryMatch {
                    entry,
                    position: mid,
                    score,
                };
                return (MatchResult::Matched(found), trace);
            }

            // Stable two-element sort: on a tie the query stays first
            if query_key <= entry.name.to_lowercase() {
                match mid.checked_sub(1) {
                    Some(next_hi) => hi = next_hi,
                    None => break,
                }
            } else {
                lo = mid + 1;
            }
        }

        (MatchResult::NotFound, trace)
    }

    fn scan<'r>(&self, query_norm: &str, registry: &'r CikRegistry) -> (MatchResult<'r>, SearchTrace) {
        let mut trace = SearchTrace::default();
        let last = registry.len().saturating_sub(1);

        for (position, entry) in registry.entries().iter().enumerate() {
            let score = self.score(query_norm, entry);
            trace.probes.push(Probe {
                lo: position,
                hi: last,
                mid: position,
                score,
            });

            if score >= self.config.threshold {
                let found = RegistryMatch {
                    entry,
                    position,
                    score,
                };
                return (MatchResult::Matched(found), trace);
            }
        }

        (MatchResult::NotFound, trace)
    }
}

/// Resolve with the default resolver (threshold 90, binary search)
pub fn resolve<'r>(query: &str, registry: &'r CikRegistry) -> MatchResult<'r> {
    DEFAULT_RESOLVER.resolve(query, registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(rows: &[(&str, &str)]) -> CikRegistry {
        CikRegistry::new(
            rows.iter()
                .map(|(id, name)| RegistryEntry::new(*id, *name))
                .collect(),
        )
    }

    fn abc_registry() -> CikRegistry {
        registry(&[("01", "Acme Co"), ("02", "Beta LLC"), ("03", "Gamma Corp")])
    }

    #[test]
    fn test_punctuated_llc_resolves_to_middle_entry() {
        let reg = abc_registry();
        let result = resolve("Beta, L.L.C.", &reg);
        assert_eq!(result.identifier(), Some("02"));
        assert_eq!(result.matched_name(), Some("Beta LLC"));
        assert_eq!(result.score(), Some(100));
    }

    #[test]
    fn test_exact_match_single_entry() {
        let reg = registry(&[("0000123", "Acme Inc")]);
        assert_eq!(resolve("ACME, INC.", &reg).identifier(), Some("0000123"));
    }

    #[test]
    fn test_search_moves_both_directions() {
        let reg = abc_registry();
        // mid is "Beta LLC"; "Acme" sorts before it, "Gamma" after
        let (acme, trace) = Resolver::default().resolve_traced("Acme Co.", &reg);
        assert_eq!(acme.identifier(), Some("01"));
        assert_eq!(trace.probes.len(), 2);
        assert_eq!(trace.probes[1].mid, 0);

        let (gamma, trace) = Resolver::default().resolve_traced("GAMMA CORPORATION", &reg);
        assert_eq!(gamma.identifier(), Some("03"));
        assert_eq!(trace.probes[1].mid, 2);
    }

    #[test]
    fn test_miss_returns_not_found() {
        let reg = abc_registry();
        let result = resolve("Zzyzx Holdings", &reg);
        assert_eq!(result, MatchResult::NotFound);
        assert_eq!(result.identifier(), None);
        assert_eq!(result.matched_name(), None);
    }

    #[test]
    fn test_empty_registry_and_query() {
        let empty = CikRegistry::default();
        let (result, trace) = Resolver::default().resolve_traced("Acme", &empty);
        assert_eq!(result, MatchResult::NotFound);
        assert_eq!(trace.evaluations(), 0);

        assert_eq!(resolve("", &abc_registry()), MatchResult::NotFound);
        assert_eq!(resolve("   ", &abc_registry()), MatchResult::NotFound);
    }

    #[test]
    fn test_left_edge_terminates() {
        // Query sorts before everything: narrowing left from index 0 must stop
        let reg = abc_registry();
        let (result, trace) = Resolver::default().resolve_traced("Aaron Industries", &reg);
        assert!(!result.is_found());
        assert_eq!(trace.probes.last().map(|p| p.mid), Some(0));
    }

    fn single_score(query: &str, name: &str) -> u8 {
        let reg = registry(&[("01", name)]);
        Resolver::default().resolve_traced(query, &reg).1.probes[0].score
    }

    #[test]
    fn test_threshold_boundary() {
        // one substitution in 10 chars -> 90, in 9 chars -> 89, in 11 chars -> 91
        assert_eq!(single_score("Abcdefghik", "Abcdefghij"), 90);
        assert_eq!(single_score("Abcdefghk", "Abcdefghi"), 89);
        assert_eq!(single_score("Abcdefghijx", "Abcdefghijk"), 91);

        let reg = registry(&[("01", "Abcdefghij")]);
        assert!(Resolver::with_threshold(89).resolve("Abcdefghik", &reg).is_found());
        assert!(Resolver::with_threshold(90).resolve("Abcdefghik", &reg).is_found());
        assert!(!Resolver::with_threshold(91).resolve("Abcdefghik", &reg).is_found());

        let reg = registry(&[("01", "Abcdefghi")]);
        assert!(!Resolver::default().resolve("Abcdefghk", &reg).is_found());

        let reg = registry(&[("01", "Abcdefghijk")]);
        assert!(Resolver::default().resolve("Abcdefghijx", &reg).is_found());
    }

    #[test]
    fn test_name_trimmed_onto_suffix_matches_itself() {
        let reg = registry(&[("01", "LPS INC")]);
        let result = resolve("LPS Inc", &reg);
        assert_eq!(result.identifier(), Some("01"));
        assert_eq!(result.score(), Some(100));
    }

    #[test]
    fn test_first_acceptable_not_best() {
        // The midpoint scores 96 and wins although index 0 would score 100
        let reg = registry(&[
            ("01", "Acme Widgets"),
            ("02", "Acme Widgetz"),
            ("03", "Zeta"),
        ]);
        let result = resolve("Acme Widgets", &reg);
        assert_eq!(result.identifier(), Some("02"));
    }

    #[test]
    fn test_linear_strategy_finds_what_bisect_skips() {
        // The apostrophe sorts "Kohl's" before "Kohlberg", but the query
        // "Kohls" sorts after it, so bisection narrows the wrong way.
        let reg = registry(&[
            ("01", "Kohl's Department Stores Inc"),
            ("02", "Kohlberg Capital"),
            ("03", "Kohler Co"),
        ]);
        assert!(reg.is_sorted());

        let (missed, trace) = Resolver::default().resolve_traced("Kohls Department Stores Inc", &reg);
        assert_eq!(missed, MatchResult::NotFound);
        assert_eq!(trace.probes.iter().map(|p| p.mid).collect::<Vec<_>>(), vec![1, 2]);

        let linear = Resolver::new(
            ResolverConfig {
                strategy: SearchStrategy::Linear,
                ..ResolverConfig::default()
            },
            Normalizer::default(),
        );
        let (result, trace) = linear.resolve_traced("Kohls Department Stores Inc", &reg);
        assert_eq!(result.identifier(), Some("01"));
        assert_eq!(result.score(), Some(98));
        assert_eq!(trace.evaluations(), 1);
    }

    #[test]
    fn test_levenshtein_metric_is_more_lenient() {
        let reg = registry(&[("01", "Acme Widgetz")]);
        let config = ResolverConfig {
            threshold: 95,
            metric: SimilarityMetric::Levenshtein,
            strategy: SearchStrategy::Bisect,
        };
        let lenient = Resolver::new(config, Normalizer::default());
        assert!(lenient.resolve("Acme Widgetx", &reg).is_found());
        // indel ratio 92, levenshtein ratio 96
        assert!(!Resolver::with_threshold(95).resolve("Acme Widgetx", &reg).is_found());
    }
}
