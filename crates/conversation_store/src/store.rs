use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::error::StoreError;
use crate::turn::{Turn, TurnRecord};

/// Append-only record of prior conversation turns.
///
/// The store never merges or updates entries; the only destructive operation
/// is `clear`, which drops the whole history.
pub trait TurnStore {
    /// Returns the last `n` turns in chronological order (oldest first).
    /// A missing store reads as empty.
    fn read_recent(&self, n: usize) -> Result<Vec<Turn>, StoreError>;

    /// Appends one turn, creating the backing storage if absent.
    fn append(&mut self, turn: &Turn) -> Result<(), StoreError>;

    /// Deletes the entire history. Clearing an absent store is a no-op.
    fn clear(&mut self) -> Result<(), StoreError>;

    /// Appends the synthetic unlock exchange for the given phrase.
    fn append_unlock_turn(&mut self, unlock_phrase: &str) -> Result<(), StoreError> {
        self.append(&Turn::unlock(unlock_phrase))
    }
}

/// File-backed turn store: one JSON record per line.
#[derive(Debug, Clone)]
pub struct FileTurnStore {
    path: PathBuf,
}

impl FileTurnStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TurnStore for FileTurnStore {
    fn read_recent(&self, n: usize) -> Result<Vec<Turn>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|source| StoreError::io("opening turn log", &self.path, source))?;
        let reader = BufReader::new(file);

        let mut turns = Vec::new();
        for (line_index, line_result) in reader.lines().enumerate() {
            let line = line_result
                .map_err(|source| StoreError::io("reading turn log", &self.path, source))?;
            if line.trim().is_empty() {
                continue;
            }

            // A half-written or truncated record must not poison the whole
            // history; skip it and keep the readable tail.
            match serde_json::from_str::<TurnRecord>(&line) {
                Ok(record) => match record.into_turn() {
                    Some(turn) => turns.push(turn),
                    None => warn!(
                        line = line_index + 1,
                        path = %self.path.display(),
                        "skipping turn record with out-of-range unlock flag"
                    ),
                },
                Err(error) => warn!(
                    line = line_index + 1,
                    path = %self.path.display(),
                    %error,
                    "skipping malformed turn record"
                ),
            }
        }

        let start = turns.len().saturating_sub(n);
        Ok(turns.split_off(start))
    }

    fn append(&mut self, turn: &Turn) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::io("creating data directory", parent, source))?;
        }

        let record = TurnRecord::from(turn);
        let line = serde_json::to_string(&record)
            .map_err(|source| StoreError::serialize(&self.path, source))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StoreError::io("opening turn log for append", &self.path, source))?;
        writeln!(file, "{line}")
            .map_err(|source| StoreError::io("appending turn record", &self.path, source))?;

        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::io("removing turn log", &self.path, source)),
        }
    }
}

/// In-memory turn store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryTurnStore {
    turns: Vec<Turn>,
}

impl MemoryTurnStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored turns in chronological order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

impl TurnStore for MemoryTurnStore {
    fn read_recent(&self, n: usize) -> Result<Vec<Turn>, StoreError> {
        let start = self.turns.len().saturating_sub(n);
        Ok(self.turns[start..].to_vec())
    }

    fn append(&mut self, turn: &Turn) -> Result<(), StoreError> {
        self.turns.push(turn.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.turns.clear();
        Ok(())
    }
}
