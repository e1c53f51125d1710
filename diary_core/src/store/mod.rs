//! Date-keyed exercise log.
//!
//! [`ExerciseLog`] is the only way the rest of the system reads or writes
//! logged exercises. The physical medium sits behind [`LogBackend`]; three
//! engines are provided:
//! - [`JsonlBackend`]: append-only JSON lines file with file locking
//! - [`DocumentBackend`]: one JSON document, rewritten atomically on every change
//! - [`MemoryBackend`]: key-value namespace holding serialized records
//!
//! Saves and deletes go through a per-log write queue, so whole-file
//! read-modify-write cycles never interleave. Reads do not queue.

pub mod document;
pub mod engine;
pub mod jsonl;
pub mod memory;

pub use document::DocumentBackend;
pub use engine::StorageEngine;
pub use jsonl::JsonlBackend;
pub use memory::MemoryBackend;

use crate::types::{ExerciseRecord, RecordKey, SavedRecord};
use crate::validate::validate_record;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Result of removing keys from a backend
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoveReport {
    /// Keys that were present and are now gone
    pub removed: Vec<RecordKey>,
    /// Keys that were not present to begin with
    pub absent: Vec<RecordKey>,
    /// Keys that were present but could not be removed
    pub failed: Vec<RecordKey>,
    /// Why `failed` is non-empty
    pub failure: Option<String>,
}

/// Outcome of a successful [`ExerciseLog::delete`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: Vec<RecordKey>,
    /// Requested keys that were already gone; deleting them is a no-op
    pub absent: Vec<RecordKey>,
}

impl RemoveReport {
    fn into_outcome(self) -> Result<DeleteOutcome> {
        if self.failed.is_empty() {
            return Ok(DeleteOutcome {
                removed: self.removed,
                absent: self.absent,
            });
        }
        Err(Error::PartialDelete {
            removed: self.removed,
            absent: self.absent,
            failed: self.failed,
            reason: self
                .failure
                .unwrap_or_else(|| "backend did not give a reason".into()),
        })
    }
}

/// Storage medium for the exercise log
///
/// Backends may return any error; [`ExerciseLog`] classifies failures on
/// the read path as [`Error::StorageUnavailable`] and failures on the write
/// path as [`Error::StorageWriteFailed`].
#[allow(async_fn_in_trait)]
pub trait LogBackend: Send + Sync + 'static {
    /// Short engine name for log messages
    fn name(&self) -> &'static str;

    /// Prepare the medium (create directories, ...). Called once by
    /// [`ExerciseLog::open`].
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Every stored record, grouped by day and in insertion order within a day
    async fn load(&self) -> Result<Vec<SavedRecord>>;

    /// Records for one calendar day in insertion order
    async fn load_day(&self, day: NaiveDate) -> Result<Vec<SavedRecord>> {
        let mut records = self.load().await?;
        records.retain(|r| r.day() == day);
        Ok(records)
    }

    async fn append(&self, record: &SavedRecord) -> Result<()>;

    async fn remove(&self, keys: &[RecordKey]) -> Result<RemoveReport>;

    /// Make every completed write durable. Called by [`ExerciseLog::close`].
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Run blocking file I/O on tokio's blocking pool
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

fn read_failure(err: Error) -> Error {
    match err {
        Error::StorageUnavailable(_) => err,
        other => Error::unavailable(other),
    }
}

fn write_failure(err: Error) -> Error {
    match err {
        Error::StorageWriteFailed(_) | Error::PartialDelete { .. } => err,
        other => Error::write_failed(other),
    }
}

/// Keep the first record for each exercise name, preserving order
pub fn dedup_by_name(records: Vec<SavedRecord>) -> Vec<SavedRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.record.name.clone()))
        .collect()
}

/// The exercise log: list, save and delete records keyed by calendar day
pub struct ExerciseLog<B> {
    backend: B,
    write_queue: Mutex<()>,
}

impl<B: LogBackend> ExerciseLog<B> {
    /// Open the log on top of `backend`
    ///
    /// Open once at startup and share by reference; call [`close`](Self::close)
    /// at shutdown.
    pub async fn open(backend: B) -> Result<Self> {
        backend.open().await.map_err(read_failure)?;
        tracing::info!("Opened exercise log ({} engine)", backend.name());
        Ok(Self {
            backend,
            write_queue: Mutex::new(()),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Records logged on `date`, one per exercise name
    ///
    /// When the same exercise was saved more than once that day, the first
    /// save is returned. An empty day is an empty list, not an error.
    pub async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<SavedRecord>> {
        let records = self.list_day_with_duplicates(date).await?;
        let total = records.len();
        let records = dedup_by_name(records);
        tracing::debug!(
            "Listed {} records for {} ({} hidden as duplicates)",
            records.len(),
            date,
            total - records.len()
        );
        Ok(records)
    }

    /// Every record saved on `date` in save order, same-name repeats included
    pub async fn list_day_with_duplicates(&self, date: NaiveDate) -> Result<Vec<SavedRecord>> {
        self.backend.load_day(date).await.map_err(|e| {
            tracing::warn!("Failed to read log for {}: {}", date, e);
            read_failure(e)
        })
    }

    /// Every record in the log without de-duplication
    pub async fn list_all(&self) -> Result<Vec<SavedRecord>> {
        self.backend.load().await.map_err(read_failure)
    }

    /// Validate `record`, give it a key and append it
    ///
    /// Saving never merges with or replaces an earlier record of the same
    /// exercise on the same day. Both are kept; [`list_for_date`](Self::list_for_date)
    /// shows only the first.
    pub async fn save(&self, record: ExerciseRecord) -> Result<SavedRecord> {
        validate_record(&record)?;

        let saved = SavedRecord {
            key: RecordKey::new(),
            record,
        };

        let _guard = self.write_queue.lock().await;
        self.backend.append(&saved).await.map_err(|e| {
            tracing::warn!("Failed to save '{}': {}", saved.record.name, e);
            write_failure(e)
        })?;

        tracing::info!(
            "Saved '{}' for {} as {}",
            saved.record.name,
            saved.day(),
            saved.key
        );
        Ok(saved)
    }

    /// Remove exactly the given records
    ///
    /// Keys that are not in the log are ignored, so deleting twice is
    /// harmless. If only some keys could be removed the error is
    /// [`Error::PartialDelete`], naming the keys that remain.
    pub async fn delete<I>(&self, keys: I) -> Result<DeleteOutcome>
    where
        I: IntoIterator<Item = RecordKey>,
    {
        let mut seen = HashSet::new();
        let keys: Vec<RecordKey> = keys.into_iter().filter(|k| seen.insert(*k)).collect();
        if keys.is_empty() {
            return Ok(DeleteOutcome::default());
        }

        let _guard = self.write_queue.lock().await;
        let report = self.backend.remove(&keys).await.map_err(|e| {
            tracing::warn!("Failed to delete {} records: {}", keys.len(), e);
            write_failure(e)
        })?;

        if !report.failed.is_empty() {
            tracing::warn!(
                "Deleted {} of {} records; {} could not be removed",
                report.removed.len(),
                keys.len(),
                report.failed.len()
            );
        } else {
            tracing::info!(
                "Deleted {} records ({} already absent)",
                report.removed.len(),
                report.absent.len()
            );
        }
        report.into_outcome()
    }

    /// Flush the backend and release the log
    pub async fn close(self) -> Result<()> {
        let _guard = self.write_queue.lock().await;
        self.backend.flush().await.map_err(write_failure)?;
        tracing::info!("Closed exercise log ({} engine)", self.backend.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SetRecord;
    use chrono::DateTime;

    fn saved(name: &str) -> SavedRecord {
        SavedRecord {
            key: RecordKey::new(),
            record: ExerciseRecord {
                name: name.into(),
                force: None,
                primary_muscles: vec![],
                secondary_muscles: vec![],
                rest_time_seconds: 60,
                sets: vec![SetRecord::new(5, 100.0)],
                date: DateTime::parse_from_rfc3339("2024-01-02T09:00:00Z").unwrap(),
            },
        }
    }

    #[test]
    fn test_dedup_keeps_first_in_order() {
        let squat_1 = saved("Squat");
        let bench = saved("Bench Press");
        let squat_2 = saved("Squat");

        let result = dedup_by_name(vec![squat_1.clone(), bench.clone(), squat_2]);
        assert_eq!(result, vec![squat_1, bench]);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let result = dedup_by_name(vec![saved("Squat"), saved("squat")]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_remove_report_with_failures_is_partial_delete() {
        let ok = RecordKey::new();
        let bad = RecordKey::new();
        let report = RemoveReport {
            removed: vec![ok],
            absent: vec![],
            failed: vec![bad],
            failure: Some("locked".into()),
        };
        match report.into_outcome() {
            Err(Error::PartialDelete {
                removed,
                absent,
                failed,
                reason,
            }) => {
                assert_eq!(removed, vec![ok]);
                assert!(absent.is_empty());
                assert_eq!(failed, vec![bad]);
                assert_eq!(reason, "locked");
            }
            other => panic!("expected partial delete, got {:?}", other),
        }
    }

    #[test]
    fn test_error_classification() {
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(matches!(read_failure(io), Error::StorageUnavailable(_)));

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(matches!(write_failure(io), Error::StorageWriteFailed(_)));

        let already = Error::StorageUnavailable("gone".into());
        assert!(matches!(read_failure(already), Error::StorageUnavailable(m) if m == "gone"));
    }
}
