//! File-backed collection store
//!
//! One append-only text file per collection under a data directory, one
//! record per line. Records are suffixed with a local timestamp at write
//! time, so two submissions of the same value at different times are
//! distinct records. Reads cap the total returned size at a line boundary.
//!
//! Writers take a per-collection lock: the duplicate-check-then-append and
//! read-rewrite-delete sequences are not atomic, and connections are handled
//! as independent tasks.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Maximum total bytes returned by a single read.
pub const READ_LIMIT: usize = 4096;

/// Timestamp layout appended to each record at write time.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Separator between the submitted value and its timestamp suffix.
const TIMESTAMP_SEPARATOR: &str = " | ";

/// Backing file used when no collection name is given.
const DEFAULT_FILE: &str = "data.txt";

/// Store-level failures. The display strings are the client-visible status
/// messages; the `STATUS:` prefix is added at the response boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Collection not found")]
    NotFound,

    #[error("Newline character is not allowed in data")]
    EmbeddedNewline,

    #[error("Data already exists in collection")]
    Duplicate,

    #[error("Data not found")]
    RecordNotFound,

    #[error("Error writing data")]
    Write(#[source] std::io::Error),
}

/// Store-specific result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Append-only flat-file storage for named collections.
///
/// Collections are created implicitly on first write and persist across
/// process restarts.
#[derive(Debug)]
pub struct CollectionStore {
    data_dir: PathBuf,
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CollectionStore {
    /// Create a store rooted at `data_dir`. The directory is created lazily
    /// on the first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn file_path(&self, collection: &str) -> PathBuf {
        if collection.is_empty() {
            self.data_dir.join(DEFAULT_FILE)
        } else {
            self.data_dir.join(format!("{collection}.txt"))
        }
    }

    /// Hand out the exclusive-access guard for one collection.
    fn lock_for(&self, collection: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Read the full contents of a collection, capped at [`READ_LIMIT`]
    /// bytes. If the next line would exceed the cap, reading stops early at
    /// the line boundary and a warning is logged; the caller still gets the
    /// accumulated text.
    pub async fn read(&self, collection: &str) -> Result<String> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;
        self.read_unlocked(collection)
    }

    fn read_unlocked(&self, collection: &str) -> Result<String> {
        let path = self.file_path(collection);
        let file = File::open(&path).map_err(|_| StoreError::NotFound)?;
        let reader = BufReader::new(file);

        let mut data = String::new();
        for line in reader.lines() {
            // Best-effort: a failed line read ends the scan, same as EOF.
            let Ok(line) = line else { break };
            if data.len() + line.len() + 1 > READ_LIMIT {
                warn!(
                    collection,
                    "read limit of {} bytes reached, response truncated at a line boundary",
                    READ_LIMIT
                );
                break;
            }
            data.push_str(&line);
            data.push('\n');
        }

        Ok(data)
    }

    /// Append a record, suffixed with the current local timestamp.
    pub async fn append(&self, collection: &str, value: &str) -> Result<()> {
        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.append_with_timestamp(collection, value, &stamp).await
    }

    /// Append a record with an explicit timestamp suffix.
    ///
    /// Rejects values with embedded newlines, and rejects the write when the
    /// normalized record already occurs as a line of the collection. The
    /// duplicate check runs against the capped read, so records past
    /// [`READ_LIMIT`] are not consulted.
    pub async fn append_with_timestamp(
        &self,
        collection: &str,
        value: &str,
        timestamp: &str,
    ) -> Result<()> {
        if value.contains('\n') {
            return Err(StoreError::EmbeddedNewline);
        }
        let record = format!("{value}{TIMESTAMP_SEPARATOR}{timestamp}");

        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        match self.read_unlocked(collection) {
            Ok(existing) => {
                if existing.lines().any(|line| line == record) {
                    return Err(StoreError::Duplicate);
                }
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e),
        }

        std::fs::create_dir_all(&self.data_dir).map_err(StoreError::Write)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(collection))
            .map_err(StoreError::Write)?;
        writeln!(file, "{record}").map_err(StoreError::Write)?;

        debug!(collection, "record appended");
        Ok(())
    }

    /// Remove the single line exactly equal to `record`, preserving the
    /// relative order of the remaining lines.
    pub async fn delete_record(&self, collection: &str, record: &str) -> Result<()> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        let path = self.file_path(collection);
        let existing = std::fs::read_to_string(&path).map_err(|_| StoreError::NotFound)?;

        let target = record.trim_end_matches('\n').trim_end_matches('\r');
        if !existing.lines().any(|line| line == target) {
            return Err(StoreError::RecordNotFound);
        }

        let remaining: String = existing
            .lines()
            .filter(|line| *line != target)
            .map(|line| format!("{line}\n"))
            .collect();
        std::fs::write(&path, remaining).map_err(StoreError::Write)?;

        debug!(collection, "record deleted");
        Ok(())
    }

    /// Truncate a collection to empty regardless of content. The backing
    /// file is created if it does not exist yet.
    pub async fn clear(&self, collection: &str) -> Result<()> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        std::fs::create_dir_all(&self.data_dir).map_err(StoreError::Write)?;
        File::create(self.file_path(collection)).map_err(StoreError::Write)?;

        debug!(collection, "collection cleared");
        Ok(())
    }
}
