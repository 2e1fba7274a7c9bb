//! Integration tests for name resolution
//!
//! Tests verify:
//! 1. Normalization idempotence and suffix insensitivity
//! 2. Similarity bounds and symmetry through the public API
//! 3. Exact-match and miss behavior of the resolver
//! 4. Probe count bound and strict narrowing of the search range

use cik_merge::entity_linking::{
    normalize, similarity, CikRegistry, MatchResult, Normalizer, RegistryEntry, Resolver,
    ResolverConfig, SearchStrategy,
};
use proptest::prelude::*;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn sec_registry() -> CikRegistry {
    CikRegistry::sorted(vec![
        RegistryEntry::new("0001018724", "AMAZON COM INC"),
        RegistryEntry::new("0000320193", "Apple Inc."),
        RegistryEntry::new("0001067983", "BERKSHIRE HATHAWAY INC"),
        RegistryEntry::new("0000070858", "BANK OF AMERICA CORP /DE/"),
        RegistryEntry::new("0000019617", "JPMORGAN CHASE & CO"),
        RegistryEntry::new("0000789019", "MICROSOFT CORP"),
        RegistryEntry::new("0001045810", "NVIDIA CORP"),
        RegistryEntry::new("0001318605", "Tesla, Inc."),
        RegistryEntry::new("0000104169", "Walmart Inc."),
        RegistryEntry::new("0000034088", "EXXON MOBIL CORP"),
        RegistryEntry::new("0000200406", "JOHNSON & JOHNSON"),
    ])
}

fn ceil_log2(n: usize) -> usize {
    (usize::BITS - (n - 1).leading_zeros()) as usize
}

// ============================================================================
// NORMALIZATION
// ============================================================================

#[test]
fn test_suffix_insensitivity() {
    assert_eq!(normalize("Acme Corp."), normalize("Acme Corporation"));
    assert_eq!(normalize("Acme Corporation"), normalize("Acme"));
}

#[test]
fn test_llc_punctuation_normalizes_away() {
    assert_eq!(normalize("Beta, L.L.C."), "beta");
    assert_eq!(normalize("Beta LLC"), "beta");
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[test]
fn test_exact_match() {
    let registry = CikRegistry::new(vec![RegistryEntry::new("0000123", "Acme Inc")]);
    let result = Resolver::default().resolve("ACME, INC.", &registry);
    assert_eq!(result.identifier(), Some("0000123"));
    assert_eq!(result.matched_name(), Some("Acme Inc"));
}

#[test]
fn test_punctuated_llc_resolves_in_three_entry_registry() {
    let registry = CikRegistry::new(vec![
        RegistryEntry::new("01", "Acme Co"),
        RegistryEntry::new("02", "Beta LLC"),
        RegistryEntry::new("03", "Gamma Corp"),
    ]);
    assert_eq!(similarity("Beta, L.L.C.", "Beta LLC"), 100);
    assert_eq!(
        Resolver::default().resolve("Beta, L.L.C.", &registry).identifier(),
        Some("02")
    );
}

#[test]
fn test_miss() {
    let registry = sec_registry();
    let result = Resolver::default().resolve("Zzyzx Holdings", &registry);
    assert_eq!(result, MatchResult::NotFound);
}

#[test]
fn test_sec_style_names() {
    let registry = sec_registry();
    let resolver = Resolver::default();

    assert_eq!(resolver.resolve("Tesla Inc", &registry).identifier(), Some("0001318605"));
    assert_eq!(resolver.resolve("Microsoft Corporation", &registry).identifier(), Some("0000789019"));
    assert_eq!(resolver.resolve("Amazon.com, Inc.", &registry).identifier(), Some("0001018724"));
    assert_eq!(resolver.resolve("NVIDIA Corp.", &registry).identifier(), Some("0001045810"));
}

#[test]
fn test_every_entry_finds_itself() {
    let registry = sec_registry();
    let resolver = Resolver::default();

    for entry in registry.entries() {
        let result = resolver.resolve(&entry.name, &registry);
        assert_eq!(result.identifier(), Some(entry.identifier.as_str()), "{}", entry.name);
    }
}

#[test]
fn test_linear_and_bisect_agree_on_exact_names() {
    let registry = sec_registry();
    let linear = Resolver::new(
        ResolverConfig {
            strategy: SearchStrategy::Linear,
            ..ResolverConfig::default()
        },
        Normalizer::default(),
    );

    for entry in registry.entries() {
        assert_eq!(
            linear.resolve(&entry.name, &registry).identifier(),
            Resolver::default().resolve(&entry.name, &registry).identifier()
        );
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn arb_registry() -> impl Strategy<Value = CikRegistry> {
    prop::collection::vec("[A-Za-z][A-Za-z ,.]{0,16}", 1..200).prop_map(|names| {
        CikRegistry::sorted(
            names
                .into_iter()
                .enumerate()
                .map(|(i, n)| RegistryEntry::new(format!("{:010}", i), n))
                .collect(),
        )
    })
}

proptest! {
    #[test]
    fn normalize_idempotent(name in ".{0,48}") {
        let once = normalize(&name);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn similarity_bounded_and_symmetric(a in ".{0,24}", b in ".{0,24}") {
        let ab = similarity(&a, &b);
        prop_assert!(ab <= 100);
        prop_assert_eq!(ab, similarity(&b, &a));
    }

    #[test]
    fn resolve_probe_count_is_logarithmic(
        registry in arb_registry(),
        query in "[A-Za-z ,.]{0,16}",
        threshold in 0u8..=100,
    ) {
        let (_, trace) = Resolver::with_threshold(threshold).resolve_traced(&query, &registry);
        let bound = ceil_log2(registry.len()) + 1;
        prop_assert!(trace.evaluations() >= 1);
        prop_assert!(trace.evaluations() <= bound, "{} probes > {}", trace.evaluations(), bound);
    }

    #[test]
    fn resolve_range_strictly_shrinks(
        registry in arb_registry(),
        query in "[A-Za-z ,.]{0,16}",
    ) {
        let (result, trace) = Resolver::with_threshold(101).resolve_traced(&query, &registry);
        prop_assert_eq!(result, MatchResult::NotFound);

        for pair in trace.probes.windows(2) {
            let before = pair[0].hi as i64 - pair[0].lo as i64;
            let after = pair[1].hi as i64 - pair[1].lo as i64;
            prop_assert!(after < before);
            prop_assert!(pair[1].lo >= pair[0].lo && pair[1].hi <= pair[0].hi);
        }
    }

    #[test]
    fn accepted_match_meets_threshold(
        registry in arb_registry(),
        query in "[A-Za-z ,.]{0,16}",
        threshold in 50u8..=100,
    ) {
        let resolver = Resolver::with_threshold(threshold);
        if let MatchResult::Matched(found) = resolver.resolve(&query, &registry) {
            prop_assert!(found.score >= threshold);
            prop_assert_eq!(similarity(&query, &found.entry.name), found.score);
            prop_assert_eq!(registry.get(found.position), Some(found.entry));
        }
    }
}
