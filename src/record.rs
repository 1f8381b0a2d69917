// src/record.rs
//
// Append-only JSONL log of fused results, plus aggregate statistics over a
// log file. One line per processed frame; the log is the audit trail the
// monitoring service keeps across restarts.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{FusedResult, LoadStatus, PipelineState, PlateColor, VehicleColor, VehicleType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    pub timestamp: DateTime<Utc>,
    pub vehicle_present: bool,
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_color: VehicleColor,
    pub load_status: LoadStatus,
    pub plate_text: Option<String>,
    pub plate_color: PlateColor,
    pub state: PipelineState,
}

impl RecordEntry {
    pub fn from_result(result: &FusedResult) -> Self {
        Self {
            timestamp: Utc::now(),
            vehicle_present: result.vehicle_present,
            vehicle_type: result.vehicle_type,
            vehicle_color: result.vehicle_color,
            load_status: result.load_status,
            plate_text: result.plate_text.clone(),
            plate_color: result.plate_color,
            state: result.state,
        }
    }
}

/// Append one entry to the JSONL log, creating the file (and parent
/// directory) on first use.
pub fn append_record(path: &Path, entry: &RecordEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let line = serde_json::to_string(entry)?;
    writeln!(file, "{}", line)?;
    file.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LogStatistics {
    pub total_records: usize,
    pub vehicle_types: HashMap<String, usize>,
    pub loaded_count: usize,
    pub plates_read: usize,
    pub plate_colors: HashMap<String, usize>,
}

/// Aggregate statistics over a JSONL log written by `append_record`.
/// Unparseable lines are skipped, not fatal: a crash mid-write must not
/// poison every later statistics run.
pub fn collect_statistics(path: &Path) -> Result<LogStatistics> {
    let file = File::open(path).with_context(|| format!("opening log file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut stats = LogStatistics::default();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: RecordEntry = match serde_json::from_str(&line) {
            Ok(entry) => entry,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        stats.total_records += 1;

        if let Some(vehicle_type) = entry.vehicle_type {
            *stats
                .vehicle_types
                .entry(vehicle_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        if entry.load_status == LoadStatus::Loaded {
            stats.loaded_count += 1;
        }
        if entry.plate_text.is_some() {
            stats.plates_read += 1;
            *stats
                .plate_colors
                .entry(entry.plate_color.as_str().to_string())
                .or_insert(0) += 1;
        }
    }

    if skipped > 0 {
        info!("skipped {} malformed log line(s)", skipped);
    }

    Ok(stats)
}
