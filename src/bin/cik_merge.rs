//! CIK merge command line interface
//!
//! Resolves company names from an investigations sheet to SEC CIK numbers.
//!
//! # Usage
//!
//! ```bash
//! # Merge a query sheet against the registry (paths from config/cik_merge.yaml)
//! cik_merge merge
//!
//! # Override paths and threshold
//! cik_merge merge --config merge.yaml --queries q.csv --output out.csv --threshold 92
//!
//! # Resolve a single name
//! cik_merge resolve "Beta, L.L.C." --registry sec_cik_header_file.csv
//!
//! # Show normalized forms
//! cik_merge normalize "Amazon.com, Inc." "Acme Corporation"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cik_merge::config::{MergeConfig, ResolverSettings, CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
use cik_merge::entity_linking::{
    CikRegistry, RegistryColumns, RegistryOrdering, SearchStrategy, SimilarityMetric,
    DEFAULT_THRESHOLD, NOT_FOUND,
};
use cik_merge::merge::run_merge;

#[derive(Parser)]
#[command(name = "cik_merge")]
#[command(version)]
#[command(about = "Match company names to SEC CIK numbers by fuzzy name search")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json, text, or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Pretty,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Bisect,
    Linear,
}

impl From<StrategyArg> for SearchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Bisect => SearchStrategy::Bisect,
            StrategyArg::Linear => SearchStrategy::Linear,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    Indel,
    Levenshtein,
}

impl From<MetricArg> for SimilarityMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Indel => SimilarityMetric::Indel,
            MetricArg::Levenshtein => SimilarityMetric::Levenshtein,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every row of a query sheet and write the merged CSV
    Merge {
        /// YAML configuration file
        #[arg(short, long, env = CONFIG_ENV_VAR, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Registry CSV (overrides config)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Query CSV (overrides config)
        #[arg(long)]
        queries: Option<PathBuf>,

        /// Output CSV (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Acceptance threshold 0-100 (overrides config)
        #[arg(long)]
        threshold: Option<u8>,

        /// Resolve on all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Resolve a single company name
    Resolve {
        /// Company name as written in the source sheet
        name: String,

        /// Registry CSV, sorted by name
        #[arg(short, long)]
        registry: PathBuf,

        /// Header of the CIK column
        #[arg(long, default_value = "cik")]
        id_column: String,

        /// Header of the name column
        #[arg(long, default_value = "name")]
        name_column: String,

        /// Acceptance threshold 0-100
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u8,

        /// Search strategy
        #[arg(long, value_enum, default_value = "bisect")]
        strategy: StrategyArg,

        /// Edit distance behind the similarity ratio
        #[arg(long, value_enum, default_value = "indel")]
        metric: MetricArg,

        /// Sort the registry after loading
        #[arg(long)]
        sort: bool,
    },

    /// Print the normalized form of one or more names
    Normalize {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let result = match cli.command {
        Commands::Merge {
            config,
            registry,
            queries,
            output,
            threshold,
            parallel,
        } => cmd_merge(config, registry, queries, output, threshold, parallel, cli.format),
        Commands::Resolve {
            name,
            registry,
            id_column,
            name_column,
            threshold,
            strategy,
            metric,
            sort,
        } => {
            let settings = ResolverSettings {
                threshold,
                strategy: strategy.into(),
                metric: metric.into(),
                ..ResolverSettings::default()
            };
            let columns = RegistryColumns {
                id_column,
                name_column,
            };
            cmd_resolve(&name, registry, &columns, &settings, sort, cli.format)
        }
        Commands::Normalize { names } => cmd_normalize(&names, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool) {
    let default_filter = if quiet { "cik_merge=warn" } else { "cik_merge=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_merge(
    config_path: PathBuf,
    registry: Option<PathBuf>,
    queries: Option<PathBuf>,
    output: Option<PathBuf>,
    threshold: Option<u8>,
    parallel: bool,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!(path = %config_path.display(), "Loading configuration");
    let mut config = MergeConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    if let Some(path) = registry {
        config.registry.path = path;
    }
    if let Some(path) = queries {
        config.queries.path = path;
    }
    if let Some(path) = output {
        config.output.path = path;
    }
    if let Some(threshold) = threshold {
        config.resolver.threshold = threshold;
    }
    config.parallel |= parallel;

    let summary = run_merge(&config).context("Merge failed")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "output": config.output.path.display().to_string(),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => println!("{}", summary),
        OutputFormat::Pretty => {
            println!(
                "{} Wrote {}",
                "OK".green().bold(),
                config.output.path.display()
            );
            println!("{}", summary);
        }
    }

    Ok(())
}

fn cmd_resolve(
    name: &str,
    registry_path: PathBuf,
    columns: &RegistryColumns,
    settings: &ResolverSettings,
    sort: bool,
    format: OutputFormat,
) -> Result<()> {
    let resolver = settings.build_resolver()?;
    let ordering = if sort {
        RegistryOrdering::Sort
    } else {
        RegistryOrdering::Trust
    };
    let registry = CikRegistry::load_csv(&registry_path, columns)
        .and_then(|r| r.with_ordering(ordering))
        .with_context(|| format!("Failed to load registry {}", registry_path.display()))?;

    let (result, trace) = resolver.resolve_traced(name, &registry);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "query": name,
                "normalized": resolver.normalize(name),
                "found": result.is_found(),
                "cik": result.identifier(),
                "matched_company": result.matched_name(),
                "score": result.score(),
                "probes": trace.probes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "{}\t{}",
                result.identifier().unwrap_or(NOT_FOUND),
                result.matched_name().unwrap_or(NOT_FOUND)
            );
        }
        OutputFormat::Pretty => {
            println!("Query:      {}", name);
            println!("Normalized: {}", resolver.normalize(name));
            match (result.identifier(), result.matched_name(), result.score()) {
                (Some(cik), Some(matched), Some(score)) => {
                    println!("{} CIK {} ({}, score {})", "OK".green().bold(), cik, matched, score);
                }
                _ => println!("{} No matching CIK found", "MISS".yellow().bold()),
            }
            println!("Probes:     {}", trace.evaluations());
        }
    }

    Ok(())
}

fn cmd_normalize(names: &[String], format: OutputFormat) -> Result<()> {
    let normalized: Vec<String> = names
        .iter()
        .map(|n| cik_merge::entity_linking::normalize(n))
        .collect();

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = names
                .iter()
                .zip(&normalized)
                .map(|(raw, norm)| serde_json::json!({ "name": raw, "normalized": norm }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for norm in &normalized {
                println!("{}", norm);
            }
        }
        OutputFormat::Pretty => {
            for (raw, norm) in names.iter().zip(&normalized) {
                println!("{} {} {}", raw, "->".dimmed(), norm);
            }
        }
    }

    Ok(())
}
