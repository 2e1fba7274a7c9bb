//! Merge configuration
//!
//! Loads the YAML file that tells the merge pipeline where the registry,
//! the query sheet and the output live, and how the resolver is tuned.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::entity_linking::{
    Normalizer, RegistryColumns, RegistryOrdering, Resolver, ResolverConfig, SearchStrategy,
    SimilarityMetric, DEFAULT_THRESHOLD,
};
use crate::error::{MergeError, Result};

/// Default configuration path
pub const DEFAULT_CONFIG_PATH: &str = "config/cik_merge.yaml";

/// Environment variable overriding the configuration path
pub const CONFIG_ENV_VAR: &str = "CIK_MERGE_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    pub registry: RegistrySourceConfig,
    pub queries: QuerySourceConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub resolver: ResolverSettings,
    /// Resolve queries across a rayon pool
    #[serde(default)]
    pub parallel: bool,
}

/// Reference registry location and layout
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySourceConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub columns: RegistryColumns,
    #[serde(default)]
    pub ordering: RegistryOrdering,
}

/// Query sheet location and layout
#[derive(Debug, Clone, Deserialize)]
pub struct QuerySourceConfig {
    pub path: PathBuf,
    /// Header of the column holding company names
    #[serde(default = "default_query_column")]
    pub name_column: String,
}

fn default_query_column() -> String {
    "company".to_string()
}

/// Output CSV location
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
}

/// Resolver tuning as it appears in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSettings {
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default)]
    pub strategy: SearchStrategy,
    /// NFKC-fold names before normalization
    #[serde(default)]
    pub unicode_fold: bool,
    /// Suffixes dropped in addition to the built-in list
    #[serde(default)]
    pub extra_suffixes: Vec<String>,
}

fn default_threshold() -> u8 {
    DEFAULT_THRESHOLD
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metric: SimilarityMetric::default(),
            strategy: SearchStrategy::default(),
            unicode_fold: false,
            extra_suffixes: Vec::new(),
        }
    }
}

impl ResolverSettings {
    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(MergeError::InvalidConfig {
                message: format!("threshold must be 0-100, got {}", self.threshold),
            });
        }
        Ok(())
    }

    /// Build the resolver these settings describe
    pub fn build_resolver(&self) -> Result<Resolver> {
        self.validate()?;

        let mut normalizer = Normalizer::default().unicode_fold(self.unicode_fold);
        normalizer.extend_suffixes(self.extra_suffixes.iter().map(String::as_str));

        let config = ResolverConfig {
            threshold: self.threshold,
            metric: self.metric,
            strategy: self.strategy,
        };
        Ok(Resolver::new(config, normalizer))
    }
}

impl MergeConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: MergeConfig = serde_yaml::from_str(content)?;
        config.resolver.validate()?;
        Ok(config)
    }

    /// Configuration path from the environment, or the default
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}
