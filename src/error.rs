//! Error types for registry loading and the merge pipeline
//!
//! The name-resolution core never fails: a missing match is reported as
//! `MatchResult::NotFound`. Everything here belongs to the I/O boundary.

use thiserror::Error;

/// Main error type for loading data and running a merge
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error(
        "Registry is not sorted by name at position {position}: '{previous}' sorts after '{next}'"
    )]
    UnsortedRegistry {
        position: usize,
        previous: String,
        next: String,
    },
}

/// Result alias for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;
