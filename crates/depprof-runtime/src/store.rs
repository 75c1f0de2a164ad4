//! Profile persistence.
//!
//! The core hands final per-query counters to a [`ProfileStore`]; which
//! engine sits behind that trait is the collaborator's concern. Two
//! implementations ship here: an append-only file fallback and an in-memory
//! store for tests and embedding. A missing backend degrades to the file
//! fallback rather than aborting instrumentation, and absent feedback data
//! reads as "no data", never as an error.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Persistence error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identifies where a batch of records came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub application: String,
    pub source_file: String,
    pub file_id: u64,
}

/// Final accumulated counters for one unique reference id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileRecord {
    pub refid: u64,
    /// Activations in which the dependence was observed.
    pub count: u64,
    /// Executions observed in a prior run.
    pub total: u32,
    /// Region activations seen.
    pub entries: u64,
    /// Free-form extra counter (original: the "extra" column).
    pub extra: u64,
    /// Cumulative filter population at exits.
    pub population: u64,
}

/// Where final counters go.
pub trait ProfileStore {
    /// Persists a batch of records under a key.
    fn record(&mut self, key: &StoreKey, records: &[ProfileRecord]) -> Result<(), StoreError>;

    /// Looks up a prior run's count for a reference id. `None` means no
    /// data, which every caller must treat as a defined default.
    fn feedback(&self, toolname: &str, refid: u64) -> Option<u64>;
}

/// Append-only file fallback: one `refid,count,total` line per record, the
/// lowest common denominator every environment can absorb.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for FileStore {
    fn record(&mut self, key: &StoreKey, records: &[ProfileRecord]) -> Result<(), StoreError> {
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        tracing::debug!(path = %self.path.display(), app = %key.application, n = records.len(), "writing profile records");
        for r in records {
            writeln!(out, "{},{},{}", r.refid, r.count, r.total)?;
        }
        Ok(())
    }

    fn feedback(&self, _toolname: &str, _refid: u64) -> Option<u64> {
        // The flat file keeps no queryable history.
        None
    }
}

/// In-memory store for tests and in-process embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<StoreKey, Vec<ProfileRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn records(&self, key: &StoreKey) -> &[ProfileRecord] {
        self.records.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl ProfileStore for MemoryStore {
    fn record(&mut self, key: &StoreKey, records: &[ProfileRecord]) -> Result<(), StoreError> {
        self.records
            .entry(key.clone())
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }

    fn feedback(&self, _toolname: &str, refid: u64) -> Option<u64> {
        self.records
            .values()
            .flatten()
            .find(|r| r.refid == refid)
            .map(|r| r.count)
    }
}
