//! Storage engine selected from configuration.

use super::{DocumentBackend, JsonlBackend, LogBackend, MemoryBackend, RemoveReport};
use crate::config::{EngineKind, StorageConfig};
use crate::types::{RecordKey, SavedRecord};
use crate::Result;
use chrono::NaiveDate;

/// One of the built-in backends, chosen at startup
#[derive(Debug)]
pub enum StorageEngine {
    Jsonl(JsonlBackend),
    Document(DocumentBackend),
    Memory(MemoryBackend),
}

impl StorageEngine {
    pub fn from_config(config: &StorageConfig) -> Self {
        match config.engine {
            EngineKind::Jsonl => StorageEngine::Jsonl(JsonlBackend::in_dir(&config.data_dir)),
            EngineKind::Document => {
                StorageEngine::Document(DocumentBackend::in_dir(&config.data_dir))
            }
            EngineKind::Memory => StorageEngine::Memory(MemoryBackend::new()),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            StorageEngine::Jsonl(_) => EngineKind::Jsonl,
            StorageEngine::Document(_) => EngineKind::Document,
            StorageEngine::Memory(_) => EngineKind::Memory,
        }
    }
}

impl LogBackend for StorageEngine {
    fn name(&self) -> &'static str {
        match self {
            StorageEngine::Jsonl(b) => b.name(),
            StorageEngine::Document(b) => b.name(),
            StorageEngine::Memory(b) => b.name(),
        }
    }

    async fn open(&self) -> Result<()> {
        match self {
            StorageEngine::Jsonl(b) => b.open().await,
            StorageEngine::Document(b) => b.open().await,
            StorageEngine::Memory(b) => b.open().await,
        }
    }

    async fn load(&self) -> Result<Vec<SavedRecord>> {
        match self {
            StorageEngine::Jsonl(b) => b.load().await,
            StorageEngine::Document(b) => b.load().await,
            StorageEngine::Memory(b) => b.load().await,
        }
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Vec<SavedRecord>> {
        match self {
            StorageEngine::Jsonl(b) => b.load_day(day).await,
            StorageEngine::Document(b) => b.load_day(day).await,
            StorageEngine::Memory(b) => b.load_day(day).await,
        }
    }

    async fn append(&self, record: &SavedRecord) -> Result<()> {
        match self {
            StorageEngine::Jsonl(b) => b.append(record).await,
            StorageEngine::Document(b) => b.append(record).await,
            StorageEngine::Memory(b) => b.append(record).await,
        }
    }

    async fn remove(&self, keys: &[RecordKey]) -> Result<RemoveReport> {
        match self {
            StorageEngine::Jsonl(b) => b.remove(keys).await,
            StorageEngine::Document(b) => b.remove(keys).await,
            StorageEngine::Memory(b) => b.remove(keys).await,
        }
    }

    async fn flush(&self) -> Result<()> {
        match self {
            StorageEngine::Jsonl(b) => b.flush().await,
            StorageEngine::Document(b) => b.flush().await,
            StorageEngine::Memory(b) => b.flush().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_follows_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig {
            engine: EngineKind::Document,
            data_dir: temp_dir.path().to_path_buf(),
        };

        match StorageEngine::from_config(&config) {
            StorageEngine::Document(b) => {
                assert_eq!(b.path(), temp_dir.path().join("exercise_log.json"))
            }
            other => panic!("unexpected engine {:?}", other.kind()),
        }

        config.engine = EngineKind::Jsonl;
        let engine = StorageEngine::from_config(&config);
        assert_eq!(engine.kind(), EngineKind::Jsonl);
        assert_eq!(engine.name(), "jsonl");
    }
}
