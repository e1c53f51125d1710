//! Key-value engine.
//!
//! Records are stored as serialized JSON under keys of the form
//! `exercise_<YYYY-MM-DD>_<sequence>_<uuid>`, so every day is one key
//! prefix and keys sort in save order within a day. Nothing survives the
//! process; this engine backs tests and throwaway sessions.

use super::{LogBackend, RemoveReport};
use crate::types::{RecordKey, SavedRecord};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

const KEY_PREFIX: &str = "exercise_";

#[derive(Debug, Default)]
struct Namespace {
    next_seq: u64,
    values: BTreeMap<String, String>,
    index: HashMap<RecordKey, String>,
}

fn day_prefix(day: NaiveDate) -> String {
    format!("{}{}_", KEY_PREFIX, day.format("%Y-%m-%d"))
}

fn decode(key: &str, value: &str) -> Result<SavedRecord> {
    serde_json::from_str(value)
        .map_err(|e| Error::StorageUnavailable(format!("corrupt value under {}: {}", key, e)))
}

/// In-process key-value log
#[derive(Debug, Default)]
pub struct MemoryBackend {
    namespace: RwLock<Namespace>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values, duplicates included
    pub async fn len(&self) -> usize {
        self.namespace.read().await.values.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Storage keys in sort order
    pub async fn keys(&self) -> Vec<String> {
        self.namespace.read().await.values.keys().cloned().collect()
    }
}

impl LogBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Vec<SavedRecord>> {
        let ns = self.namespace.read().await;
        ns.values.iter().map(|(k, v)| decode(k, v)).collect()
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Vec<SavedRecord>> {
        let prefix = day_prefix(day);
        let ns = self.namespace.read().await;
        ns.values
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| decode(k, v))
            .collect()
    }

    async fn append(&self, record: &SavedRecord) -> Result<()> {
        let value = serde_json::to_string(record)?;
        let mut ns = self.namespace.write().await;
        let key = format!("{}{:010}_{}", day_prefix(record.day()), ns.next_seq, record.key);
        ns.next_seq += 1;
        ns.index.insert(record.key, key.clone());
        ns.values.insert(key, value);
        Ok(())
    }

    async fn remove(&self, keys: &[RecordKey]) -> Result<RemoveReport> {
        let mut ns = self.namespace.write().await;
        let mut report = RemoveReport::default();
        for key in keys {
            match ns.index.remove(key) {
                Some(storage_key) => {
                    ns.values.remove(&storage_key);
                    report.removed.push(*key);
                }
                None => report.absent.push(*key),
            }
        }
        Ok(report)
    }
}
