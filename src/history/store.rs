use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::warn;

use super::HistoryEntry;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("history store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("history entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable mirror of crashed rounds. Best effort only: the in-memory
/// history never depends on it.
pub trait HistoryStore: Send + Sync {
    fn persist(&self, entry: &HistoryEntry) -> Result<(), PersistError>;
}

/// Appends one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back the newest `limit` entries, newest first.
    ///
    /// A missing file is an empty history; lines that fail to parse are
    /// skipped with a warning.
    pub fn load_recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, PersistError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    "HISTORY - skipping unreadable line {} of {}: {}",
                    lineno + 1,
                    self.path.display(),
                    e
                ),
            }
        }

        Ok(entries.into_iter().rev().take(limit).collect())
    }
}

impl HistoryStore for JsonLinesStore {
    fn persist(&self, entry: &HistoryEntry) -> Result<(), PersistError> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
