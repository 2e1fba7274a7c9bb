//! Batch merge of a query sheet against the CIK registry
//!
//! The pipeline streams `Query` rows from a `QuerySource`, resolves each one
//! and hands a `MatchRecord` to a `ResultSink`. Sources and sinks are traits so
//! the resolver never sees a file; `sheet` provides the CSV implementations.
//!
//! ```text
//! QuerySource ──► Resolver (+ &CikRegistry) ──► ResultSink
//!                        │
//!                        ▼
//!                  MergeSummary
//! ```

pub mod sheet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::MergeConfig;
use crate::entity_linking::{CikRegistry, MatchResult, Resolver, NOT_FOUND};
use crate::error::Result;

pub use sheet::{CsvQuerySource, CsvResultSink};

/// One row of the query sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw_name: String,
    /// Row number in the source (spreadsheet-style, header is row 1)
    pub row_id: u64,
    /// Every cell of the source row, carried through to the output
    pub fields: Vec<String>,
}

impl Query {
    pub fn new(raw_name: impl Into<String>, row_id: u64) -> Self {
        Self {
            raw_name: raw_name.into(),
            row_id,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

/// Owned resolution outcome for one query row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub row_id: u64,
    pub query: String,
    pub identifier: Option<String>,
    pub matched_name: Option<String>,
    pub score: Option<u8>,
    /// Source row cells, written ahead of the resolved columns
    #[serde(skip)]
    pub fields: Vec<String>,
}

impl MatchRecord {
    pub fn from_result(query: &Query, result: &MatchResult<'_>) -> Self {
        Self {
            row_id: query.row_id,
            query: query.raw_name.clone(),
            identifier: result.identifier().map(str::to_string),
            matched_name: result.matched_name().map(str::to_string),
            score: result.score(),
            fields: query.fields.clone(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.identifier.is_some()
    }

    /// Identifier, or `N/A`
    pub fn identifier_or_na(&self) -> &str {
        self.identifier.as_deref().unwrap_or(NOT_FOUND)
    }

    /// Matched registry name, or `N/A`
    pub fn matched_name_or_na(&self) -> &str {
        self.matched_name.as_deref().unwrap_or(NOT_FOUND)
    }
}

/// Yields queries one at a time
pub trait QuerySource {
    fn next_query(&mut self) -> Result<Option<Query>>;
}

/// Accepts resolution records
pub trait ResultSink {
    fn write(&mut self, record: &MatchRecord) -> Result<()>;

    /// Flush buffered output
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl QuerySource for std::vec::IntoIter<Query> {
    fn next_query(&mut self) -> Result<Option<Query>> {
        Ok(self.next())
    }
}

impl ResultSink for Vec<MatchRecord> {
    fn write(&mut self, record: &MatchRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Counts for a finished merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
}

impl MergeSummary {
    fn record(&mut self, record: &MatchRecord) {
        self.total += 1;
        if record.is_found() {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
    }
}

impl std::fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Merge Summary:")?;
        writeln!(f, "  Companies: {}", self.total)?;
        writeln!(f, "  Matched: {}", self.matched)?;
        write!(f, "  No matching CIK: {}", self.unmatched)
    }
}

/// Resolves every query from a source against one registry
pub struct MergePipeline<'r> {
    resolver: Resolver,
    registry: &'r CikRegistry,
    parallel: bool,
}

impl<'r> MergePipeline<'r> {
    pub fn new(resolver: Resolver, registry: &'r CikRegistry) -> Self {
        Self {
            resolver,
            registry,
            parallel: false,
        }
    }

    /// Resolve the whole batch on the rayon pool. Output order is unchanged.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Resolve a single query
    pub fn resolve(&self, query: &Query) -> MatchRecord {
        let result = self.resolver.resolve(&query.raw_name, self.registry);
        MatchRecord::from_result(query, &result)
    }

    /// Drain `source`, writing one record per query to `sink`
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<MergeSummary>
    where
        S: QuerySource + ?Sized,
        K: ResultSink + ?Sized,
    {
        let summary = if self.parallel {
            self.run_parallel(source, sink)?
        } else {
            self.run_sequential(source, sink)?
        };

        sink.finish()?;
        info!(
            total = summary.total,
            matched = summary.matched,
            unmatched = summary.unmatched,
            "Merge complete"
        );
        Ok(summary)
    }

    fn run_sequential<S, K>(&self, source: &mut S, sink: &mut K) -> Result<MergeSummary>
    where
        S: QuerySource + ?Sized,
        K: ResultSink + ?Sized,
    {
        let mut summary = MergeSummary::default();

        while let Some(query) = source.next_query()? {
            log_search(&query, summary.total + 1);
            let record = self.resolve(&query);
            log_outcome(&record);

            sink.write(&record)?;
            summary.record(&record);
        }

        Ok(summary)
    }

    fn run_parallel<S, K>(&self, source: &mut S, sink: &mut K) -> Result<MergeSummary>
    where
        S: QuerySource + ?Sized,
        K: ResultSink + ?Sized,
    {
        let mut queries = Vec::new();
        while let Some(query) = source.next_query()? {
            queries.push(query);
        }
        info!(queries = queries.len(), "Resolving batch in parallel");

        let records: Vec<MatchRecord> = queries.par_iter().map(|q| self.resolve(q)).collect();

        let mut summary = MergeSummary::default();
        for (query, record) in queries.iter().zip(&records) {
            log_search(query, summary.total + 1);
            log_outcome(record);
            sink.write(record)?;
            summary.record(record);
        }

        Ok(summary)
    }
}

fn log_search(query: &Query, number: usize) {
    info!("Searching for {} (Company #{})", query.raw_name, number);
}

fn log_outcome(record: &MatchRecord) {
    match &record.identifier {
        Some(cik) => info!(
            row = record.row_id,
            cik = %cik,
            matched = record.matched_name_or_na(),
            "Matching CIK: {}",
            cik
        ),
        None => info!(row = record.row_id, query = %record.query, "No matching CIK found"),
    }
}

/// Load everything a config names and run the merge end to end
pub fn run_merge(config: &MergeConfig) -> Result<MergeSummary> {
    let resolver = config.resolver.build_resolver()?;

    let registry = CikRegistry::load_csv(&config.registry.path, &config.registry.columns)?
        .with_ordering(config.registry.ordering)?;

    let mut source = CsvQuerySource::from_path(&config.queries.path, &config.queries.name_column)?;
    let mut sink = CsvResultSink::from_path(&config.output.path, source.headers())?;

    MergePipeline::new(resolver, &registry)
        .parallel(config.parallel)
        .run(&mut source, &mut sink)
}
