//! CIK merge - resolve free-text company names to SEC Central Index Keys
//!
//! Names from an investigations sheet rarely match the SEC registrant list
//! character for character. This crate normalizes both sides, scores them
//! with a bounded edit-distance ratio, and searches the name-sorted registry
//! with an order-guided binary search.
//!
//! # Usage
//!
//! ```
//! use cik_merge::entity_linking::{CikRegistry, RegistryEntry, Resolver};
//!
//! let registry = CikRegistry::sorted(vec![
//!     RegistryEntry::new("01", "Acme Co"),
//!     RegistryEntry::new("02", "Beta LLC"),
//!     RegistryEntry::new("03", "Gamma Corp"),
//! ]);
//!
//! let result = Resolver::default().resolve("Beta, L.L.C.", &registry);
//! assert_eq!(result.identifier(), Some("02"));
//! ```
//!
//! The `merge` module wires the resolver to CSV sources and sinks, and the
//! `cik_merge` binary exposes it on the command line.

pub mod config;
pub mod entity_linking;
pub mod error;
pub mod merge;

// Re-export main types
pub use config::MergeConfig;
pub use entity_linking::{
    normalize, resolve, CikRegistry, MatchResult, RegistryEntry, Resolver, ResolverConfig,
};
pub use error::{MergeError, Result};
pub use merge::{MatchRecord, MergePipeline, MergeSummary, Query, QuerySource, ResultSink};
