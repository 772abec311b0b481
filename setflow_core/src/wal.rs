//! Write-ahead logs for finished protocols and tracked canonical sets.
//!
//! Both collaborators of the session controller append JSON Lines to a file
//! under an exclusive `fs2` lock, so several CLI processes can log safely at
//! the same time. Reading skips lines that fail to parse.

use crate::instance::ExecutionRecord;
use crate::types::{CanonicalSetRecord, ExerciseRef, LoadCoefficient, ProtocolMethod, TerminationReason};
use crate::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Persisted once per finished protocol instance
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProtocolLogEntry {
    pub id: Uuid,
    pub exercise_id: String,
    pub method: ProtocolMethod,
    pub termination: TerminationReason,
    pub finished_at: DateTime<Utc>,
    /// Exercises configured in a superset or giant set, in slot order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<ExerciseRef>,
    pub record: ExecutionRecord,
}

/// Canonical sets for one exercise, as handed to the set tracker
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrackedSets {
    pub id: Uuid,
    /// Protocol log entry these sets came from; `None` on the standard path
    pub protocol_entry_id: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
    pub exercise: ExerciseRef,
    pub method: ProtocolMethod,
    pub coefficient: LoadCoefficient,
    pub sets: Vec<CanonicalSetRecord>,
}

impl TrackedSets {
    pub fn raw_volume(&self) -> f64 {
        self.sets.iter().map(CanonicalSetRecord::volume).sum()
    }

    pub fn weighted_volume(&self) -> f64 {
        self.coefficient.apply(self.raw_volume())
    }
}

/// Receives the single raw record of a finished protocol
pub trait ProtocolSink {
    fn append(&mut self, entry: &ProtocolLogEntry) -> Result<()>;
}

/// General set-tracking collaborator shared with standard sets
pub trait SetTracker {
    fn push(&mut self, sets: &TrackedSets) -> Result<()>;
}

/// JSONL file with file locking; implements both collaborator traits
pub struct JsonlLog {
    path: PathBuf,
}

impl JsonlLog {
    /// Create a new JSONL log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn append_line<T: Serialize>(&self, value: &T) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        // Serialize before writing so a failure never leaves half a line
        let mut line = serde_json::to_string(value)?;
        line.push('\n');

        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        drop(writer);

        // The line is written; the lock also goes when `file` drops
        if let Err(e) = file.unlock() {
            tracing::warn!("Failed to unlock {:?} after append: {}", self.path, e);
        }
        Ok(())
    }
}

impl ProtocolSink for JsonlLog {
    fn append(&mut self, entry: &ProtocolLogEntry) -> Result<()> {
        self.append_line(entry)?;
        tracing::debug!("Appended {} protocol entry {} to {:?}", entry.method, entry.id, self.path);
        Ok(())
    }
}

impl SetTracker for JsonlLog {
    fn push(&mut self, sets: &TrackedSets) -> Result<()> {
        self.append_line(sets)?;
        tracing::debug!(
            "Tracked {} sets for {} ({})",
            sets.sets.len(),
            sets.exercise.id,
            sets.method
        );
        Ok(())
    }
}

/// In-memory set tracker, for callers that only want the canonical result
#[derive(Debug, Default)]
pub struct MemorySetTracker {
    pub pushed: Vec<TrackedSets>,
}

impl SetTracker for MemorySetTracker {
    fn push(&mut self, sets: &TrackedSets) -> Result<()> {
        self.pushed.push(sets.clone());
        Ok(())
    }
}

/// Read all entries of type `T` from a JSONL log
pub fn read_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable line {} in {:?}: {}", line_num + 1, path, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Read the protocol log, keeping the first entry for each id
///
/// A retried write whose first attempt reached the file shows up twice.
pub fn read_protocol_log(path: &Path) -> Result<Vec<ProtocolLogEntry>> {
    let mut seen = HashSet::new();
    let entries = read_entries::<ProtocolLogEntry>(path)?
        .into_iter()
        .filter(|entry| seen.insert(entry.id))
        .collect();
    Ok(entries)
}
