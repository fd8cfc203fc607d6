use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::models::HistoryRecord;
use crate::utils::error::{AppError, Result};

/// JSON file holding the price baselines between runs.
///
/// There is exactly one reader and one writer per run; overlapping runs must
/// be serialized by whoever schedules them.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or damaged file yields the empty record.
    pub fn load(&self) -> HistoryRecord {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No history at {}, starting fresh", self.path.display());
                return HistoryRecord::default();
            }
            Err(e) => {
                warn!("Cannot read history {}: {}", self.path.display(), e);
                return HistoryRecord::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => {
                debug!("Loaded history {:?}", record);
                record
            }
            Err(e) => {
                warn!("Ignoring malformed history {}: {}", self.path.display(), e);
                HistoryRecord::default()
            }
        }
    }

    /// Writes to a sibling temp file, then renames it over the target.
    pub fn save(&self, record: &HistoryRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, record)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| AppError::Io(e.error))?;

        debug!("Saved history to {}", self.path.display());
        Ok(())
    }
}
