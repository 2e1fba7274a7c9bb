//! Company name resolution against the CIK registry
//!
//! Three layers, leaves first:
//!
//! ```text
//! normalize   "ACME, INC."  ->  "acme"
//! similarity  ("acme", "acme")  ->  100
//! resolver    binary search over the sorted registry, accept score >= 90
//! ```
//!
//! Nothing in this module performs I/O except `CikRegistry::load_csv`.

pub mod normalize;
pub mod registry;
pub mod resolver;
pub mod similarity;

pub use normalize::{normalize, Normalizer, LEGAL_SUFFIXES};
pub use registry::{CikRegistry, RegistryColumns, RegistryEntry, RegistryOrdering};
pub use resolver::{
    resolve, MatchResult, Probe, RegistryMatch, Resolver, ResolverConfig, SearchStrategy,
    SearchTrace, DEFAULT_THRESHOLD, NOT_FOUND,
};
pub use similarity::{ratio, similarity, SimilarityMetric};
