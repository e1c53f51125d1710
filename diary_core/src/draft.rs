//! In-progress exercise entry.
//!
//! An [`ExerciseDraft`] is what the exercise detail screen edits: sets and
//! drop sets are appended until the user confirms, at which point the draft
//! becomes an [`ExerciseRecord`] ready to be saved. Nothing here touches
//! storage.

use crate::error::ValidationError;
use crate::types::{CatalogExercise, DropSet, ExerciseRecord, SetRecord};
use crate::validate::{validate_record, validate_set};
use chrono::{DateTime, FixedOffset, Local};

/// Parse reps and weight as typed by the user
///
/// Both fields are required. Reps must be a positive whole number and the
/// weight a non-negative number.
pub fn parse_set(reps: &str, weight: &str) -> Result<SetRecord, ValidationError> {
    let reps_value = reps
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidNumber {
            field: "reps",
            input: reps.to_string(),
        })?;
    let weight_value = weight
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidNumber {
            field: "weight",
            input: weight.to_string(),
        })?;
    let set = SetRecord::new(reps_value, weight_value);
    validate_set(&set, 0)?;
    Ok(set)
}

/// Parse a rest time in whole seconds
pub fn parse_rest_time(input: &str) -> Result<u32, ValidationError> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidNumber {
            field: "rest time",
            input: input.to_string(),
        })
}

#[derive(Clone, Debug)]
pub struct ExerciseDraft {
    exercise: CatalogExercise,
    rest_time_seconds: u32,
    sets: Vec<SetRecord>,
}

impl ExerciseDraft {
    pub fn new(exercise: CatalogExercise) -> Self {
        Self {
            exercise,
            rest_time_seconds: 0,
            sets: Vec::new(),
        }
    }

    pub fn exercise(&self) -> &CatalogExercise {
        &self.exercise
    }

    pub fn sets(&self) -> &[SetRecord] {
        &self.sets
    }

    pub fn rest_time_seconds(&self) -> u32 {
        self.rest_time_seconds
    }

    pub fn set_rest_time(&mut self, seconds: u32) {
        self.rest_time_seconds = seconds;
    }

    /// Append a set; returns its 0-based position
    pub fn add_set(&mut self, reps: u32, weight: f64) -> Result<usize, ValidationError> {
        let set = SetRecord::new(reps, weight);
        validate_set(&set, self.sets.len())?;
        self.sets.push(set);
        Ok(self.sets.len() - 1)
    }

    /// Attach a drop set to the most recent set
    pub fn add_drop_set(&mut self, reps: u32, weight: f64) -> Result<(), ValidationError> {
        let position = self.sets.len();
        let last = self
            .sets
            .last_mut()
            .ok_or(ValidationError::DropSetWithoutSet)?;

        let mut candidate = last.clone();
        candidate.drop_sets.push(DropSet { reps, weight });
        validate_set(&candidate, position - 1)?;
        *last = candidate;
        Ok(())
    }

    /// Display lines for every set entered so far
    pub fn summary(&self) -> Vec<String> {
        self.sets
            .iter()
            .enumerate()
            .flat_map(|(i, set)| set.lines(i))
            .collect()
    }

    /// Confirm the draft as a record stamped with `at`
    pub fn finish(self, at: DateTime<FixedOffset>) -> Result<ExerciseRecord, ValidationError> {
        let mut record = ExerciseRecord::from_catalog(&self.exercise, at);
        record.rest_time_seconds = self.rest_time_seconds;
        record.sets = self.sets;
        validate_record(&record)?;
        Ok(record)
    }

    /// Confirm the draft with the current local time
    pub fn finish_now(self) -> Result<ExerciseRecord, ValidationError> {
        self.finish(Local::now().fixed_offset())
    }
}
