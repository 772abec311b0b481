//! Set history and volume analytics.
//!
//! Recent tracked sets are read from both the WAL and the rolled-up CSV and
//! de-duplicated by batch id, so a rollup interrupted after the CSV write
//! never double counts.

use crate::csv_rollup::SetRow;
use crate::types::ProtocolMethod;
use crate::wal::{ProtocolLogEntry, TrackedSets};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Start of the last `days` days; a window too large to represent means all time
fn cutoff(days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Load tracked sets from the last `days` days, newest first
pub fn load_recent_sets(wal_path: &Path, csv_path: &Path, days: i64) -> Result<Vec<TrackedSets>> {
    let cutoff = cutoff(days);
    let mut batches = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for batch in crate::wal::read_entries::<TrackedSets>(wal_path)? {
            if batch.performed_at >= cutoff && seen_ids.insert(batch.id) {
                batches.push(batch);
            }
        }
        tracing::debug!("Loaded {} batches from WAL", batches.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for batch in load_sets_from_csv(csv_path)? {
            if batch.performed_at >= cutoff && seen_ids.insert(batch.id) {
                batches.push(batch);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} batches from CSV", csv_count);
    }

    batches.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));
    tracing::info!("Loaded {} batches from last {} days", batches.len(), days);
    Ok(batches)
}

/// Protocol log entries finished in the last `days` days, newest first
pub fn load_recent_protocols(log_path: &Path, days: i64) -> Result<Vec<ProtocolLogEntry>> {
    let cutoff = cutoff(days);
    let mut entries: Vec<ProtocolLogEntry> = crate::wal::read_protocol_log(log_path)?
        .into_iter()
        .filter(|entry| entry.finished_at >= cutoff)
        .collect();
    entries.sort_by(|a, b| b.finished_at.cmp(&a.finished_at));
    tracing::debug!("Loaded {} protocol entries from last {} days", entries.len(), days);
    Ok(entries)
}

/// Rebuild batches from consecutive CSV rows sharing an id
fn load_sets_from_csv(path: &Path) -> Result<Vec<TrackedSets>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut batches: Vec<TrackedSets> = Vec::new();

    for result in reader.deserialize::<SetRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
                continue;
            }
        };

        let set = match row.set() {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("Failed to parse CSV row: {}", e);
                continue;
            }
        };

        match batches.last_mut() {
            Some(batch) if batch.id.to_string() == row.id => batch.sets.push(set),
            _ => match row.batch() {
                Ok(mut batch) => {
                    batch.sets.push(set);
                    batches.push(batch);
                }
                Err(e) => tracing::warn!("Failed to parse CSV row: {}", e),
            },
        }
    }

    Ok(batches)
}

/// Aggregated volume for one exercise under one method
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct VolumeSummary {
    pub exercise_id: String,
    pub exercise_name: String,
    pub method: ProtocolMethod,
    pub sets: usize,
    pub reps: u32,
    pub raw_volume: f64,
    pub weighted_volume: f64,
}

/// Sum volumes per (exercise, method), ordered by exercise id then method
pub fn volume_summary(batches: &[TrackedSets]) -> Vec<VolumeSummary> {
    let mut totals: BTreeMap<(&str, ProtocolMethod), VolumeSummary> = BTreeMap::new();

    for batch in batches {
        let entry = totals
            .entry((batch.exercise.id.as_str(), batch.method))
            .or_insert_with(|| VolumeSummary {
                exercise_id: batch.exercise.id.clone(),
                exercise_name: batch.exercise.name.clone(),
                method: batch.method,
                sets: 0,
                reps: 0,
                raw_volume: 0.0,
                weighted_volume: 0.0,
            });
        entry.sets += batch.sets.len();
        entry.reps += batch.sets.iter().map(|s| s.reps).sum::<u32>();
        entry.raw_volume += batch.raw_volume();
        entry.weighted_volume += batch.weighted_volume();
    }

    totals.into_values().collect()
}
