//! Shared helpers for diary_core integration tests.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate};
use diary_core::store::RemoveReport;
use diary_core::{
    DocumentBackend, Error, ExerciseLog, ExerciseRecord, Force, JsonlBackend, LogBackend,
    MemoryBackend, RecordKey, Result, SavedRecord, SetRecord, StorageEngine,
};
use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

pub fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad test date")
}

pub fn record(name: &str, date: &str, sets: Vec<SetRecord>) -> ExerciseRecord {
    ExerciseRecord {
        name: name.into(),
        force: Some(Force::Push),
        primary_muscles: vec!["chest".into()],
        secondary_muscles: vec!["triceps".into()],
        rest_time_seconds: 90,
        sets,
        date: DateTime::parse_from_rfc3339(date).expect("bad test timestamp"),
    }
}

/// One engine of each kind, file engines rooted in `dir`
pub fn all_engines(dir: &TempDir) -> Vec<StorageEngine> {
    vec![
        StorageEngine::Jsonl(JsonlBackend::in_dir(&dir.path().join("jsonl"))),
        StorageEngine::Document(DocumentBackend::in_dir(&dir.path().join("document"))),
        StorageEngine::Memory(MemoryBackend::new()),
    ]
}

pub async fn open_all(dir: &TempDir) -> Vec<ExerciseLog<StorageEngine>> {
    let mut logs = Vec::new();
    for engine in all_engines(dir) {
        logs.push(ExerciseLog::open(engine).await.expect("open log"));
    }
    logs
}

/// Memory backend with switchable faults
#[derive(Default)]
pub struct FaultyBackend {
    pub inner: MemoryBackend,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Keys that stay put when removed
    pub stuck: Mutex<HashSet<RecordKey>>,
    pub appends: AtomicUsize,
}

impl FaultyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stick(&self, key: RecordKey) {
        self.stuck.lock().unwrap().insert(key);
    }
}

impl LogBackend for FaultyBackend {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn load(&self) -> Result<Vec<SavedRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk gone")));
        }
        self.inner.load().await
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Vec<SavedRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk gone")));
        }
        self.inner.load_day(day).await
    }

    async fn append(&self, record: &SavedRecord) -> Result<()> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        self.inner.append(record).await
    }

    async fn remove(&self, keys: &[RecordKey]) -> Result<RemoveReport> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        let stuck = self.stuck.lock().unwrap().clone();
        let (held, free): (Vec<RecordKey>, Vec<RecordKey>) =
            keys.iter().copied().partition(|k| stuck.contains(k));

        let mut report = self.inner.remove(&free).await?;
        if !held.is_empty() {
            report.failed = held;
            report.failure = Some("record is locked".into());
        }
        Ok(report)
    }
}
