//! Rollup of the tracked-sets WAL into a flat CSV of canonical sets.
//!
//! Each canonical set becomes one row, carrying the id of the tracked batch
//! it belonged to so batches can be rebuilt when reading history back.

use crate::types::{CanonicalSetRecord, EffortRating, ExerciseRef, LoadCoefficient, ProtocolMethod};
use crate::wal::TrackedSets;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// One canonical set as a CSV row
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SetRow {
    pub id: String,
    pub protocol_entry_id: Option<String>,
    pub performed_at: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub method: ProtocolMethod,
    pub coefficient_num: u32,
    pub coefficient_den: u32,
    pub ordinal: u32,
    pub weight: f64,
    pub reps: u32,
    pub effort: f64,
    pub completed: bool,
}

impl SetRow {
    fn rows(tracked: &TrackedSets) -> impl Iterator<Item = SetRow> + '_ {
        tracked.sets.iter().map(move |set| SetRow {
            id: tracked.id.to_string(),
            protocol_entry_id: tracked.protocol_entry_id.map(|id| id.to_string()),
            performed_at: tracked.performed_at.to_rfc3339(),
            exercise_id: tracked.exercise.id.clone(),
            exercise_name: tracked.exercise.name.clone(),
            method: tracked.method,
            coefficient_num: tracked.coefficient.numerator,
            coefficient_den: tracked.coefficient.denominator,
            ordinal: set.ordinal,
            weight: set.weight,
            reps: set.reps,
            effort: set.effort.value(),
            completed: set.completed,
        })
    }

    /// Header fields of a batch, without its sets
    pub(crate) fn batch(&self) -> Result<TrackedSets> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
        let protocol_entry_id = self
            .protocol_entry_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
        let performed_at = DateTime::parse_from_rfc3339(&self.performed_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);
        if self.coefficient_den == 0 {
            return Err(Error::Other("coefficient denominator is zero".into()));
        }

        Ok(TrackedSets {
            id,
            protocol_entry_id,
            performed_at,
            exercise: ExerciseRef::new(self.exercise_id.clone(), self.exercise_name.clone()),
            method: self.method,
            coefficient: LoadCoefficient::new(self.coefficient_num, self.coefficient_den),
            sets: Vec::new(),
        })
    }

    pub(crate) fn set(&self) -> Result<CanonicalSetRecord> {
        let effort = EffortRating::new(self.effort)
            .ok_or_else(|| Error::Other(format!("Invalid effort rating: {}", self.effort)))?;
        Ok(CanonicalSetRecord {
            ordinal: self.ordinal,
            weight: self.weight,
            reps: self.reps,
            effort,
            completed: self.completed,
        })
    }
}

/// Roll up tracked sets into CSV and archive the WAL
///
/// The CSV is fsynced before the WAL is renamed to `.wal.processed`, so a
/// crash in between leaves duplicates (removed on read) rather than a gap.
/// Returns the number of rows written.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let batches: Vec<TrackedSets> = crate::wal::read_entries(wal_path)?;

    if batches.is_empty() {
        tracing::info!("No tracked sets in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut rows = 0;
    for batch in &batches {
        for row in SetRow::rows(batch) {
            writer.serialize(row)?;
            rows += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sets from {} batches to {:?}", rows, batches.len(), csv_path);

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;
    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(rows)
}

/// Remove archived `.wal.processed` files from `dir`
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }
    Ok(count)
}
