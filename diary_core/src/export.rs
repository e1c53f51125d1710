//! CSV export of the exercise log.
//!
//! One row per set and one per drop set, so the file can be opened in a
//! spreadsheet without unpacking nested JSON. Records saved without sets
//! get a single row with the set columns left empty.

use crate::store::{ExerciseLog, LogBackend};
use crate::types::SavedRecord;
use crate::{Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    key: String,
    date: String,
    day: String,
    name: &'a str,
    force: String,
    primary_muscles: String,
    secondary_muscles: String,
    rest_time_seconds: u32,
    set: Option<usize>,
    drop_set: Option<usize>,
    reps: Option<u32>,
    weight: Option<f64>,
}

fn base_row(saved: &SavedRecord) -> CsvRow<'_> {
    let record = &saved.record;
    CsvRow {
        key: saved.key.to_string(),
        date: record.date.to_rfc3339(),
        day: record.day().to_string(),
        name: &record.name,
        force: record.force.map(|f| f.to_string()).unwrap_or_default(),
        primary_muscles: record.primary_muscles.join(";"),
        secondary_muscles: record.secondary_muscles.join(";"),
        rest_time_seconds: record.rest_time_seconds,
        set: None,
        drop_set: None,
        reps: None,
        weight: None,
    }
}

fn rows_for(saved: &SavedRecord) -> Vec<CsvRow<'_>> {
    let record = &saved.record;
    let base = || base_row(saved);

    if record.sets.is_empty() {
        return vec![base()];
    }

    let mut rows = Vec::new();
    for (i, set) in record.sets.iter().enumerate() {
        rows.push(CsvRow {
            set: Some(i + 1),
            reps: Some(set.reps),
            weight: Some(set.weight),
            ..base()
        });
        for (j, drop_set) in set.drop_sets.iter().enumerate() {
            rows.push(CsvRow {
                set: Some(i + 1),
                drop_set: Some(j + 1),
                reps: Some(drop_set.reps),
                weight: Some(drop_set.weight),
                ..base()
            });
        }
    }
    rows
}

/// Write `records` to `path`, replacing any existing file
///
/// The file is written to a temp file, synced, then renamed into place.
/// Returns the number of rows written.
pub fn export_csv(records: &[SavedRecord], path: &Path) -> Result<usize> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "export path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp.as_file());

    let mut count = 0;
    for saved in records {
        for row in rows_for(saved) {
            writer.serialize(row)?;
            count += 1;
        }
    }

    // Flush and sync to disk
    writer.flush()?;
    drop(writer);
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} rows to {:?}", count, path);
    Ok(count)
}

/// Export the whole log
pub async fn export_log<B: LogBackend>(log: &ExerciseLog<B>, path: &Path) -> Result<usize> {
    let records = log.list_all().await?;
    let path = path.to_path_buf();
    crate::store::blocking(move || export_csv(&records, &path)).await
}
