#![forbid(unsafe_code)]

//! Core domain model and persistence for the fitness diary.
//!
//! This crate provides:
//! - Domain types (catalog exercises, sets, drop sets, exercise records)
//! - The date-keyed exercise log and its storage engines
//! - Diary view state for the selected day
//! - Exercise catalog, history queries and CSV export

pub mod types;
pub mod error;
pub mod validate;
pub mod draft;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod diary;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use types::*;
pub use catalog::{get_default_catalog, Catalog, CatalogTab};
pub use config::{Config, EngineKind};
pub use draft::ExerciseDraft;
pub use store::{
    DeleteOutcome, DocumentBackend, ExerciseLog, JsonlBackend, LogBackend, MemoryBackend,
    StorageEngine,
};
pub use diary::Diary;
pub use export::{export_csv, export_log};

/// Open the exercise log described by `config`
pub async fn open_log(config: &Config) -> Result<ExerciseLog<StorageEngine>> {
    config.validate()?;
    ExerciseLog::open(StorageEngine::from_config(&config.storage)).await
}
