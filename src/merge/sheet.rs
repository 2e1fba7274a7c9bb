//! CSV query source and result sink
//!
//! Row ids are the 1-based line of the record in the file, so with a header
//! line the first company is row 2, the same number it had in the workbook.
//! The output is the query sheet itself with `cik` and `matched_company`
//! appended to every row.

use std::fs::File;
use std::io;
use std::path::Path;

use super::{MatchRecord, Query, QuerySource, ResultSink};
use crate::entity_linking::registry::column_index;
use crate::error::Result;

/// Columns appended after the source sheet's own columns
pub const RESOLVED_HEADERS: [&str; 2] = ["cik", "matched_company"];

/// Reads company names from one column of a CSV file
pub struct CsvQuerySource<R: io::Read> {
    reader: csv::Reader<R>,
    headers: csv::StringRecord,
    name_idx: usize,
    record: csv::StringRecord,
}

impl CsvQuerySource<File> {
    pub fn from_path(path: &Path, name_column: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        Self::with_reader(reader, name_column, &path.display().to_string())
    }
}

impl<R: io::Read> CsvQuerySource<R> {
    pub fn from_reader(rdr: R, name_column: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
        Self::with_reader(reader, name_column, "query input")
    }

    fn with_reader(mut reader: csv::Reader<R>, name_column: &str, source_name: &str) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let name_idx = column_index(&headers, name_column, source_name)?;
        Ok(Self {
            reader,
            headers,
            name_idx,
            record: csv::StringRecord::new(),
        })
    }

    /// Header row of the query sheet
    pub fn headers(&self) -> &csv::StringRecord {
        &self.headers
    }
}

impl<R: io::Read> QuerySource for CsvQuerySource<R> {
    fn next_query(&mut self) -> Result<Option<Query>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }

        let row_id = self.record.position().map(|p| p.line()).unwrap_or_default();
        let name = self.record.get(self.name_idx).unwrap_or_default();
        let fields = self.record.iter().map(str::to_string).collect();
        Ok(Some(Query::new(name, row_id).with_fields(fields)))
    }
}

/// Writes each source row followed by its CIK and matched name; misses are `N/A`
pub struct CsvResultSink<W: io::Write> {
    writer: csv::Writer<W>,
    /// Column count of the source sheet; short rows are padded to it
    width: usize,
}

impl CsvResultSink<File> {
    pub fn from_path(path: &Path, source_headers: &csv::StringRecord) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        Self::new(writer, source_headers)
    }
}

impl<W: io::Write> CsvResultSink<W> {
    pub fn from_writer(wtr: W, source_headers: &csv::StringRecord) -> Result<Self> {
        let writer = csv::WriterBuilder::new().flexible(true).from_writer(wtr);
        Self::new(writer, source_headers)
    }

    fn new(mut writer: csv::Writer<W>, source_headers: &csv::StringRecord) -> Result<Self> {
        writer.write_record(source_headers.iter().chain(RESOLVED_HEADERS))?;
        Ok(Self {
            writer,
            width: source_headers.len(),
        })
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()).into())
    }
}

impl<W: io::Write> ResultSink for CsvResultSink<W> {
    fn write(&mut self, record: &MatchRecord) -> Result<()> {
        let padding = self.width.saturating_sub(record.fields.len());
        let cells = record
            .fields
            .iter()
            .map(String::as_str)
            .chain(std::iter::repeat("").take(padding))
            .chain([record.identifier_or_na(), record.matched_name_or_na()]);
        self.writer.write_record(cells)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
