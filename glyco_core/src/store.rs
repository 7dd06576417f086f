//! Reading store backed by a JSON Lines file.
//!
//! Readings are appended to a JSONL file with file locking to ensure safe
//! concurrent access. Only the raw measurement is persisted; labels are
//! derived on every read.

use crate::{Context, Error, NewReading, Reading, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the reading log inside the data directory
pub const READINGS_FILE: &str = "readings.jsonl";

/// Source and sink of readings
pub trait ReadingStore {
    /// Every reading, newest first by creation time
    fn fetch_all(&self) -> Result<Vec<Reading>>;

    /// Persist one reading and return its identifier
    fn insert(&mut self, reading: NewReading) -> Result<Uuid>;
}

/// One persisted line
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredReading {
    id: Uuid,
    level: f64,
    unit: String,
    context: Context,
    created_at: DateTime<Utc>,
}

impl From<StoredReading> for Reading {
    fn from(row: StoredReading) -> Self {
        Reading::new(row.id, row.created_at.naive_utc(), row.context, row.level, row.unit)
    }
}

/// JSONL-based reading store with file locking
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    /// Create a store for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(READINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a reading with an explicit creation time
    pub fn insert_at(&mut self, reading: NewReading, created_at: DateTime<Utc>) -> Result<Uuid> {
        let row = StoredReading {
            id: Uuid::new_v4(),
            level: reading.level,
            unit: reading.unit,
            context: reading.context,
            created_at,
        };
        self.append(&row)?;
        Ok(row.id)
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn append(&self, row: &StoredReading) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Store(format!("Unable to open {:?}: {}", self.path, e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::Store(format!("Unable to lock {:?}: {}", self.path, e)))?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(row)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended reading {} to {:?}", row.id, self.path);
        Ok(())
    }

    fn read_rows(&self) -> Result<Vec<StoredReading>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| Error::Store(format!("Unable to open {:?}: {}", self.path, e)))?;
        file.lock_shared()
            .map_err(|e| Error::Store(format!("Unable to lock {:?}: {}", self.path, e)))?;

        let mut reader = BufReader::new(&file);
        let mut rows = Vec::new();
        let mut raw = Vec::new();
        let mut line_num = 0;

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            line_num += 1;

            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Skipping unreadable line {}: {}", line_num, e);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<StoredReading>(line) {
                Ok(row) if row.level.is_finite() => rows.push(row),
                Ok(row) => {
                    tracing::warn!("Skipping reading {} with non-finite level", row.id);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse reading at line {}: {}", line_num, e);
                }
            }
        }

        file.unlock()?;
        Ok(rows)
    }
}

impl ReadingStore for JsonlStore {
    fn fetch_all(&self) -> Result<Vec<Reading>> {
        let mut rows = self.read_rows()?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        tracing::info!("Loaded {} readings from {:?}", rows.len(), self.path);
        Ok(rows.into_iter().map(Reading::from).collect())
    }

    fn insert(&mut self, reading: NewReading) -> Result<Uuid> {
        self.insert_at(reading, Utc::now())
    }
}
