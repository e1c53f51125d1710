//! Core domain types for the fitness diary.
//!
//! This module defines the fundamental types used throughout the system:
//! - Catalog exercises and their metadata
//! - Sets and drop sets
//! - Exercise records as they are written to and read from the log

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Catalog Types
// ============================================================================

/// Movement pattern of an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Force {
    Push,
    Pull,
    Static,
    /// Any other value found in a catalog file
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Force {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Force::Push => "push",
            Force::Pull => "pull",
            Force::Static => "static",
            Force::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// An exercise definition from the catalog (e.g., "Barbell Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub force: Option<Force>,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    /// User-defined entries, shown under the "Custom" tab
    #[serde(default)]
    pub custom: bool,
}

// ============================================================================
// Set Types
// ============================================================================

/// A reduced-weight set performed right after its parent set without rest
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DropSet {
    pub reps: u32,
    pub weight: f64,
}

/// One working set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub reps: u32,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drop_sets: Vec<DropSet>,
}

impl SetRecord {
    pub fn new(reps: u32, weight: f64) -> Self {
        Self {
            reps,
            weight,
            drop_sets: Vec::new(),
        }
    }

    /// Display lines for this set at 0-based position `index`
    ///
    /// ```
    /// use diary_core::{DropSet, SetRecord};
    ///
    /// let mut set = SetRecord::new(10, 135.0);
    /// set.drop_sets.push(DropSet { reps: 8, weight: 95.0 });
    /// assert_eq!(
    ///     set.lines(0),
    ///     vec!["Set 1: 10 reps x 135 lbs", "Drop set 1: 8 reps x 95 lbs"]
    /// );
    /// ```
    pub fn lines(&self, index: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(1 + self.drop_sets.len());
        lines.push(format!("Set {}: {}", index + 1, self));
        for (i, drop_set) in self.drop_sets.iter().enumerate() {
            lines.push(format!("Drop set {}: {}", i + 1, drop_set));
        }
        lines
    }
}

impl fmt::Display for SetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} reps x {} lbs", self.reps, self.weight)
    }
}

impl fmt::Display for DropSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} reps x {} lbs", self.reps, self.weight)
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// One completed exercise session
///
/// Catalog metadata is copied in when the record is created, so later
/// catalog edits never change what was logged.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRecord {
    pub name: String,
    #[serde(default)]
    pub force: Option<Force>,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    #[serde(default)]
    pub rest_time_seconds: u32,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
    pub date: DateTime<FixedOffset>,
}

impl ExerciseRecord {
    /// Start a record for a catalog exercise with no sets yet
    pub fn from_catalog(exercise: &CatalogExercise, date: DateTime<FixedOffset>) -> Self {
        Self {
            name: exercise.name.clone(),
            force: exercise.force,
            primary_muscles: exercise.primary_muscles.clone(),
            secondary_muscles: exercise.secondary_muscles.clone(),
            rest_time_seconds: 0,
            sets: Vec::new(),
            date,
        }
    }

    /// Calendar day this record belongs to, in the offset it was recorded with
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Storage-unique identifier assigned when a record is saved
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RecordKey(Uuid);

impl RecordKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordKey {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordKey {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A record as persisted in the log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedRecord {
    pub key: RecordKey,
    #[serde(flatten)]
    pub record: ExerciseRecord,
}

impl SavedRecord {
    pub fn day(&self) -> NaiveDate {
        self.record.day()
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench_press() -> ExerciseRecord {
        ExerciseRecord {
            name: "Bench Press".into(),
            force: Some(Force::Push),
            primary_muscles: vec!["chest".into()],
            secondary_muscles: vec!["triceps".into(), "shoulders".into()],
            rest_time_seconds: 90,
            sets: vec![SetRecord::new(10, 135.0)],
            date: DateTime::parse_from_rfc3339("2024-01-01T23:30:00-05:00").unwrap(),
        }
    }

    #[test]
    fn test_day_uses_recorded_offset() {
        // 23:30 in New York is already the next day in UTC
        let record = bench_press();
        assert_eq!(record.day(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_saved_record_flattens_fields() {
        let saved = SavedRecord {
            key: RecordKey::new(),
            record: bench_press(),
        };
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["name"], "Bench Press");
        assert_eq!(value["force"], "push");
        assert_eq!(value["key"], saved.key.to_string());
        assert_eq!(value["date"], "2024-01-01T23:30:00-05:00");
        // Empty drop set lists are left out
        assert!(value["sets"][0].get("drop_sets").is_none());

        let parsed: SavedRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, saved);
    }

    #[test]
    fn test_catalog_exercise_accepts_null_force() {
        let json = r#"{"id":"plank","name":"Plank","force":null,"primaryMuscles":["abdominals"]}"#;
        let exercise: CatalogExercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.force, None);
        assert!(exercise.secondary_muscles.is_empty());
        assert!(!exercise.custom);
    }

    #[test]
    fn test_from_catalog_copies_metadata() {
        let exercise = CatalogExercise {
            id: "squat".into(),
            name: "Squat".into(),
            force: Some(Force::Push),
            primary_muscles: vec!["quadriceps".into()],
            secondary_muscles: vec!["glutes".into()],
            custom: false,
        };
        let date = DateTime::parse_from_rfc3339("2024-01-02T08:00:00Z").unwrap();
        let record = ExerciseRecord::from_catalog(&exercise, date);
        assert_eq!(record.name, "Squat");
        assert_eq!(record.primary_muscles, vec!["quadriceps".to_string()]);
        assert!(record.sets.is_empty());
        assert_eq!(record.rest_time_seconds, 0);
    }

    #[test]
    fn test_set_display() {
        assert_eq!(SetRecord::new(8, 132.5).to_string(), "8 reps x 132.5 lbs");
    }
}
