//! The profile context.
//!
//! The original kept application identity, path prefixes, and reference-id
//! state in process-wide singleton managers. Here the same state is an
//! explicitly constructed value passed down the pipeline, with an explicit
//! flush at the end of instrumentation.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::store::{FileStore, ProfileRecord, ProfileStore, StoreError, StoreKey};

/// Monotonic reference-id allocation, optionally persisted between runs so
/// ids stay unique across separately instrumented files.
#[derive(Debug)]
pub struct RefIdAllocator {
    start: u64,
    next: u64,
    backing: Option<PathBuf>,
}

impl RefIdAllocator {
    /// Starts counting from `start`, nothing persisted.
    pub fn new(start: u64) -> Self {
        RefIdAllocator {
            start,
            next: start,
            backing: None,
        }
    }

    /// Resumes from the counter stored in `path`, or from zero when the file
    /// is missing or unreadable.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let start = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        RefIdAllocator {
            start,
            next: start,
            backing: Some(path),
        }
    }

    /// The next id to be handed out.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Allocates the next id.
    pub fn alloc(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Writes the counter back to its backing file, if any ids were used.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.backing {
            if self.next != self.start {
                std::fs::write(path, format!("{}", self.next))?;
            }
        }
        Ok(())
    }
}

/// Everything the instrumentation pipeline needs to identify and persist a
/// profiling run.
pub struct ProfileContext {
    application: String,
    source_file: String,
    file_id: u64,
    refids: RefIdAllocator,
    store: Box<dyn ProfileStore>,
    pending: Vec<ProfileRecord>,
}

impl std::fmt::Debug for ProfileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileContext")
            .field("application", &self.application)
            .field("source_file", &self.source_file)
            .field("file_id", &self.file_id)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl ProfileContext {
    pub fn new(
        application: impl Into<String>,
        source_file: impl Into<String>,
        file_id: u64,
        refids: RefIdAllocator,
        store: Box<dyn ProfileStore>,
    ) -> Self {
        ProfileContext {
            application: application.into(),
            source_file: source_file.into(),
            file_id,
            refids,
            store,
            pending: Vec::new(),
        }
    }

    /// A context writing the file fallback under `dir`, for environments
    /// with no richer backend available.
    pub fn with_file_fallback(
        application: impl Into<String>,
        source_file: impl Into<String>,
        file_id: u64,
        dir: impl AsRef<Path>,
    ) -> Self {
        let application = application.into();
        let path = dir.as_ref().join(format!("{application}.prof.out"));
        warn!(path = %path.display(), "no profile backend configured; using file fallback");
        ProfileContext::new(
            application,
            source_file,
            file_id,
            RefIdAllocator::new(0),
            Box::new(FileStore::new(path)),
        )
    }

    pub fn key(&self) -> StoreKey {
        StoreKey {
            application: self.application.clone(),
            source_file: self.source_file.clone(),
            file_id: self.file_id,
        }
    }

    pub fn next_refid(&mut self) -> u64 {
        self.refids.alloc()
    }

    /// Prior-run count for a reference id; `None` means no data.
    pub fn feedback(&self, refid: u64) -> Option<u64> {
        self.store.feedback(&self.application, refid)
    }

    /// Queues records for the next flush.
    pub fn stage(&mut self, records: impl IntoIterator<Item = ProfileRecord>) {
        self.pending.extend(records);
    }

    /// Persists staged records and the reference-id counter.
    ///
    /// # Errors
    ///
    /// Propagates store failures; staged records are kept so a later flush
    /// can retry.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.pending.is_empty() {
            let key = self.key();
            self.store.record(&key, &self.pending)?;
            self.pending.clear();
        }
        self.refids.save()
    }
}
