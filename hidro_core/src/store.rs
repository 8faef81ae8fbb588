//! Reading persistence.
//!
//! Readings are kept in insertion order. The forecast engine never talks to
//! a store; callers load a snapshot and hand it over as a slice.

use crate::{Error, Reading, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Repository of meter readings
///
/// Index-based mutations ignore out-of-range indices, logging a warning.
pub trait ReadingStore {
    /// All readings in insertion order
    fn readings(&self) -> Result<Vec<Reading>>;

    fn append(&mut self, reading: Reading) -> Result<()>;

    fn update_value(&mut self, index: usize, value: f64) -> Result<()>;

    fn remove(&mut self, index: usize) -> Result<()>;

    /// Merge readings in, then order the whole set by timestamp
    fn append_batch(&mut self, batch: Vec<Reading>) -> Result<()>;

    /// Drop simulated readings, returning how many were removed
    fn clear_simulated(&mut self) -> Result<usize>;

    fn clear_all(&mut self) -> Result<()>;

    /// Last reading in insertion order
    fn last(&self) -> Result<Option<Reading>> {
        Ok(self.readings()?.pop())
    }
}

fn in_range(index: usize, len: usize, op: &str) -> bool {
    if index < len {
        true
    } else {
        tracing::warn!("Ignoring {} at index {} ({} readings stored)", op, index, len);
        false
    }
}

fn merge_sorted(readings: &mut Vec<Reading>, batch: Vec<Reading>) {
    readings.extend(batch);
    readings.sort_by_key(|r| r.timestamp);
}

fn drop_simulated(readings: &mut Vec<Reading>) -> usize {
    let before = readings.len();
    readings.retain(|r| !r.simulated);
    before - readings.len()
}

// ============================================================================
// In-memory store
// ============================================================================

/// Vector-backed store, used in tests and for one-off computations
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    readings: Vec<Reading>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<Vec<Reading>> for MemoryStore {
    fn from(readings: Vec<Reading>) -> Self {
        Self { readings }
    }
}

impl ReadingStore for MemoryStore {
    fn readings(&self) -> Result<Vec<Reading>> {
        Ok(self.readings.clone())
    }

    fn append(&mut self, reading: Reading) -> Result<()> {
        self.readings.push(reading);
        Ok(())
    }

    fn update_value(&mut self, index: usize, value: f64) -> Result<()> {
        if in_range(index, self.readings.len(), "update") {
            self.readings[index].value = value;
        }
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<()> {
        if in_range(index, self.readings.len(), "remove") {
            self.readings.remove(index);
        }
        Ok(())
    }

    fn append_batch(&mut self, batch: Vec<Reading>) -> Result<()> {
        merge_sorted(&mut self.readings, batch);
        Ok(())
    }

    fn clear_simulated(&mut self) -> Result<usize> {
        Ok(drop_simulated(&mut self.readings))
    }

    fn clear_all(&mut self) -> Result<()> {
        self.readings.clear();
        Ok(())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Outcome of reading the store file
enum Loaded {
    Readings(Vec<Reading>),
    /// File exists but does not hold a JSON array of readings
    Corrupt,
}

/// Whole-array JSON file with file locking and atomic replacement
///
/// A missing file reads as an empty store. A file that fails to parse also
/// reads as empty; before the next write replaces it, the old contents are
/// copied aside to `<name>.corrupt` for manual recovery.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `readings.json` inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("readings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Loaded> {
        if !self.path.exists() {
            tracing::debug!("No readings file at {:?}, starting empty", self.path);
            return Ok(Loaded::Readings(Vec::new()));
        }

        let file = File::open(&self.path)?;
        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        if contents.trim().is_empty() {
            return Ok(Loaded::Readings(Vec::new()));
        }

        match serde_json::from_str::<Vec<Reading>>(&contents) {
            Ok(readings) => {
                tracing::debug!("Loaded {} readings from {:?}", readings.len(), self.path);
                Ok(Loaded::Readings(readings))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse readings file {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                Ok(Loaded::Corrupt)
            }
        }
    }

    /// Atomically write readings by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&self, readings: &[Reading]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let temp = NamedTempFile::new_in(&parent)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(readings)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} readings to {:?}", readings.len(), self.path);
        Ok(())
    }

    fn backup_corrupt(&self) -> Result<()> {
        let backup = self.path.with_extension("json.corrupt");
        std::fs::copy(&self.path, &backup)?;
        tracing::warn!("Copied unreadable readings file to {:?}", backup);
        Ok(())
    }

    /// Load readings, modify them, and save them back
    fn modify<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Reading>) -> T,
    {
        let mut readings = match self.load()? {
            Loaded::Readings(readings) => readings,
            Loaded::Corrupt => {
                self.backup_corrupt()?;
                Vec::new()
            }
        };
        let out = f(&mut readings);
        self.save(&readings)?;
        Ok(out)
    }
}

impl ReadingStore for JsonFileStore {
    fn readings(&self) -> Result<Vec<Reading>> {
        match self.load()? {
            Loaded::Readings(readings) => Ok(readings),
            Loaded::Corrupt => Ok(Vec::new()),
        }
    }

    fn append(&mut self, reading: Reading) -> Result<()> {
        tracing::info!("Recording reading {} at {}", reading.value, reading.timestamp);
        self.modify(|readings| readings.push(reading))
    }

    fn update_value(&mut self, index: usize, value: f64) -> Result<()> {
        self.modify(|readings| {
            if in_range(index, readings.len(), "update") {
                readings[index].value = value;
            }
        })
    }

    fn remove(&mut self, index: usize) -> Result<()> {
        self.modify(|readings| {
            if in_range(index, readings.len(), "remove") {
                readings.remove(index);
            }
        })
    }

    fn append_batch(&mut self, batch: Vec<Reading>) -> Result<()> {
        let count = batch.len();
        self.modify(|readings| merge_sorted(readings, batch))?;
        tracing::info!("Merged {} readings into {:?}", count, self.path);
        Ok(())
    }

    fn clear_simulated(&mut self) -> Result<usize> {
        let removed = self.modify(drop_simulated)?;
        tracing::info!("Removed {} simulated readings", removed);
        Ok(removed)
    }

    fn clear_all(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            tracing::info!("Removed readings file {:?}", self.path);
        }
        Ok(())
    }
}
