//! Reference registry of CIK numbers and registrant names
//!
//! The registry is loaded once and treated as read-only while queries are
//! resolved. Binary search over it is only correct when entries are sorted
//! ascending by name, compared case-insensitively. That ordering is a
//! precondition of `Resolver::resolve`; use `RegistryOrdering` to verify it or
//! establish it on load.

use std::cmp::Ordering;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

/// A single registrant: CIK plus the name it is filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Central Index Key (kept as text to preserve leading zeros)
    pub identifier: String,
    /// Registrant name as it appears in the registry
    pub name: String,
}

impl RegistryEntry {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
        }
    }
}

/// How the loader treats the registry's sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryOrdering {
    /// Assume the file is sorted; log a warning if it is not
    #[default]
    Trust,
    /// Fail with `MergeError::UnsortedRegistry` if it is not
    Verify,
    /// Sort on load
    Sort,
}

/// Column layout of a registry CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryColumns {
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_name_column")]
    pub name_column: String,
}

fn default_id_column() -> String {
    "cik".to_string()
}

fn default_name_column() -> String {
    "name".to_string()
}

impl Default for RegistryColumns {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            name_column: default_name_column(),
        }
    }
}

/// Case-insensitive name order used by the registry and the resolver
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Immutable, name-ordered collection of registry entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CikRegistry {
    entries: Vec<RegistryEntry>,
}

impl CikRegistry {
    /// Wrap entries as given. The caller vouches for the sort order.
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    /// Sort entries case-insensitively by name (stable)
    pub fn sorted(mut entries: Vec<RegistryEntry>) -> Self {
        entries.sort_by_cached_key(|e| e.name.to_lowercase());
        Self { entries }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&RegistryEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry that sorts before its predecessor
    pub fn first_unsorted(&self) -> Option<usize> {
        self.entries
            .windows(2)
            .position(|pair| compare_names(&pair[0].name, &pair[1].name) == Ordering::Greater)
            .map(|i| i + 1)
    }

    pub fn is_sorted(&self) -> bool {
        self.first_unsorted().is_none()
    }

    /// Apply an ordering policy
    pub fn with_ordering(self, ordering: RegistryOrdering) -> Result<Self> {
        match ordering {
            RegistryOrdering::Sort => Ok(Self::sorted(self.entries)),
            RegistryOrdering::Trust => {
                if let Some(position) = self.first_unsorted() {
                    tracing::warn!(
                        position,
                        name = %self.entries[position].name,
                        "Registry is not sorted by name; binary search may miss matches"
                    );
                }
                Ok(self)
            }
            RegistryOrdering::Verify => match self.first_unsorted() {
                Some(position) => Err(MergeError::UnsortedRegistry {
                    position,
                    previous: self.entries[position - 1].name.clone(),
                    next: self.entries[position].name.clone(),
                }),
                None => Ok(self),
            },
        }
    }

    /// Load a registry CSV from disk
    pub fn load_csv(path: &Path, columns: &RegistryColumns) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;
        let registry = Self::read_csv(reader, columns, &path.display().to_string())?;

        tracing::info!(
            path = %path.display(),
            entries = registry.len(),
            "Loaded registry"
        );

        Ok(registry)
    }

    /// Load a registry CSV from any reader
    pub fn from_reader<R: io::Read>(rdr: R, columns: &RegistryColumns) -> Result<Self> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
        Self::read_csv(reader, columns, "registry input")
    }

    fn read_csv<R: io::Read>(
        mut reader: csv::Reader<R>,
        columns: &RegistryColumns,
        source_name: &str,
    ) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let id_idx = column_index(&headers, &columns.id_column, source_name)?;
        let name_idx = column_index(&headers, &columns.name_column, source_name)?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let identifier = record.get(id_idx).unwrap_or_default().trim();
            if identifier.is_empty() {
                continue;
            }
            entries.push(RegistryEntry::new(
                identifier,
                record.get(name_idx).unwrap_or_default(),
            ));
        }

        Ok(Self::new(entries))
    }
}

impl From<Vec<RegistryEntry>> for CikRegistry {
    fn from(entries: Vec<RegistryEntry>) -> Self {
        Self::new(entries)
    }
}

/// Locate a header by name (trimmed, ASCII case-insensitive)
pub(crate) fn column_index(
    headers: &csv::StringRecord,
    column: &str,
    source_name: &str,
) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(column))
        .ok_or_else(|| MergeError::MissingColumn {
            column: column.to_string(),
            source_name: source_name.to_string(),
        })
}
