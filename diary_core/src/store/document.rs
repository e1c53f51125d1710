//! Single JSON document engine.
//!
//! The whole log is one JSON object mapping `YYYY-MM-DD` to that day's
//! records. Every change loads the document, modifies it and writes it
//! back through a temp file that is renamed over the original, so readers
//! see either the old or the new document and never a half-written one.

use super::{blocking, LogBackend, RemoveReport};
use crate::types::{RecordKey, SavedRecord};
use crate::{Error, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name used when the log lives in a data directory
pub const FILE_NAME: &str = "exercise_log.json";

const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    FORMAT_VERSION
}

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct LogDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    days: BTreeMap<String, Vec<SavedRecord>>,
}

impl Default for LogDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            days: BTreeMap::new(),
        }
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

impl LogDocument {
    /// Load the document with shared locking
    ///
    /// A missing file is an empty log. A file that cannot be parsed is an
    /// error; it is never replaced with an empty document.
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No log document at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;
        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let doc: LogDocument = serde_json::from_str(&contents).map_err(|e| {
            Error::StorageUnavailable(format!("corrupt log document {:?}: {}", path, e))
        })?;
        if doc.version > FORMAT_VERSION {
            return Err(Error::StorageUnavailable(format!(
                "log document version {} is newer than supported version {}",
                doc.version, FORMAT_VERSION
            )));
        }
        Ok(doc)
    }

    /// Write the document atomically
    fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "log path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Wrote log document to {:?}", path);
        Ok(())
    }

    fn records(self) -> Vec<SavedRecord> {
        self.days.into_values().flatten().collect()
    }
}

/// Log stored as one JSON document
#[derive(Clone, Debug)]
pub struct DocumentBackend {
    path: PathBuf,
}

impl DocumentBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a backend for the standard file inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogBackend for DocumentBackend {
    fn name(&self) -> &'static str {
        "document"
    }

    async fn open(&self) -> Result<()> {
        let path = self.path.clone();
        blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(())
        })
        .await
    }

    async fn load(&self) -> Result<Vec<SavedRecord>> {
        let path = self.path.clone();
        blocking(move || Ok(LogDocument::load(&path)?.records())).await
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Vec<SavedRecord>> {
        let path = self.path.clone();
        blocking(move || {
            let mut doc = LogDocument::load(&path)?;
            Ok(doc.days.remove(&day_key(day)).unwrap_or_default())
        })
        .await
    }

    async fn append(&self, record: &SavedRecord) -> Result<()> {
        let path = self.path.clone();
        let record = record.clone();
        blocking(move || {
            let mut doc = LogDocument::load(&path)?;
            doc.days.entry(day_key(record.day())).or_default().push(record);
            doc.save(&path)
        })
        .await
    }

    async fn remove(&self, keys: &[RecordKey]) -> Result<RemoveReport> {
        let path = self.path.clone();
        let keys = keys.to_vec();
        blocking(move || {
            let mut doc = LogDocument::load(&path)?;
            let wanted: HashSet<RecordKey> = keys.iter().copied().collect();
            let mut present = HashSet::new();

            for records in doc.days.values_mut() {
                records.retain(|r| {
                    let hit = wanted.contains(&r.key);
                    if hit {
                        present.insert(r.key);
                    }
                    !hit
                });
            }
            doc.days.retain(|_, records| !records.is_empty());

            let mut report = RemoveReport::default();
            for key in keys {
                if present.contains(&key) {
                    report.removed.push(key);
                } else {
                    report.absent.push(key);
                }
            }
            if !report.removed.is_empty() {
                doc.save(&path)?;
            }
            Ok(report)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExerciseRecord;
    use chrono::DateTime;

    fn record_on(name: &str, date: &str) -> SavedRecord {
        SavedRecord {
            key: RecordKey::new(),
            record: ExerciseRecord {
                name: name.into(),
                force: None,
                primary_muscles: vec![],
                secondary_muscles: vec![],
                rest_time_seconds: 0,
                sets: vec![],
                date: DateTime::parse_from_rfc3339(date).unwrap(),
            },
        }
    }

    #[test]
    fn test_document_groups_by_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(FILE_NAME);

        let mut doc = LogDocument::default();
        let record = record_on("Squat", "2024-01-02T10:00:00Z");
        doc.days
            .entry(day_key(record.day()))
            .or_default()
            .push(record.clone());
        doc.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["days"]["2024-01-02"][0]["name"], "Squat");

        let loaded = LogDocument::load(&path).unwrap();
        assert_eq!(loaded.records(), vec![record]);
    }

    #[test]
    fn test_corrupt_document_is_unavailable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(FILE_NAME);
        std::fs::write(&path, "{ invalid json }").unwrap();

        let err = LogDocument::load(&path).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        // The corrupt file is left alone for manual recovery
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ invalid json }");
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(FILE_NAME);
        std::fs::write(&path, r#"{"version":2,"days":{}}"#).unwrap();

        assert!(matches!(
            LogDocument::load(&path),
            Err(Error::StorageUnavailable(msg)) if msg.contains("version 2")
        ));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(FILE_NAME);

        LogDocument::default().save(&path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != FILE_NAME)
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }

    #[tokio::test]
    async fn test_remove_drops_empty_days() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = DocumentBackend::in_dir(temp_dir.path());

        let lone = record_on("Squat", "2024-01-02T10:00:00Z");
        let other = record_on("Bench Press", "2024-01-03T10:00:00Z");
        backend.append(&lone).await.unwrap();
        backend.append(&other).await.unwrap();

        let report = backend.remove(&[lone.key]).await.unwrap();
        assert_eq!(report.removed, vec![lone.key]);

        let doc = LogDocument::load(backend.path()).unwrap();
        assert!(!doc.days.contains_key("2024-01-02"));
        assert_eq!(doc.days["2024-01-03"], vec![other]);
    }

    #[tokio::test]
    async fn test_first_append_writes_current_version() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = DocumentBackend::in_dir(temp_dir.path());
        assert!(!backend.path().exists());

        backend
            .append(&record_on("Squat", "2024-01-02T10:00:00Z"))
            .await
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(backend.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], FORMAT_VERSION);
        assert_eq!(LogDocument::load(backend.path()).unwrap().version, FORMAT_VERSION);
    }
}
