//! Record validation.
//!
//! Runs before any storage I/O, so a rejected record never touches the log.

use crate::error::ValidationError;
use crate::types::{DropSet, ExerciseRecord, SetRecord};

fn valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight >= 0.0
}

/// Check a single set at 0-based position `index`
pub fn validate_set(set: &SetRecord, index: usize) -> Result<(), ValidationError> {
    let position = index + 1;
    if set.reps == 0 {
        return Err(ValidationError::ZeroReps { set: position });
    }
    if !valid_weight(set.weight) {
        return Err(ValidationError::InvalidWeight {
            set: position,
            weight: set.weight,
        });
    }
    for (i, drop_set) in set.drop_sets.iter().enumerate() {
        validate_drop_set(drop_set, position, i + 1)?;
    }
    Ok(())
}

fn validate_drop_set(drop_set: &DropSet, set: usize, position: usize) -> Result<(), ValidationError> {
    if drop_set.reps == 0 {
        return Err(ValidationError::ZeroDropSetReps {
            set,
            drop_set: position,
        });
    }
    if !valid_weight(drop_set.weight) {
        return Err(ValidationError::InvalidDropSetWeight {
            set,
            drop_set: position,
            weight: drop_set.weight,
        });
    }
    Ok(())
}

/// Validate a record before it is written
///
/// A record with no sets is accepted; the diary allows logging an
/// exercise before any sets are entered.
pub fn validate_record(record: &ExerciseRecord) -> Result<(), ValidationError> {
    if record.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    for (i, set) in record.sets.iter().enumerate() {
        validate_set(set, i)?;
    }
    Ok(())
}
