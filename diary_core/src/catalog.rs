//! Exercise catalog.
//!
//! The catalog is the read-only list of exercises a user can add to the
//! diary. A small built-in catalog ships with the crate; a larger one can
//! be loaded from a JSON array in the `exercises.json` format
//! (`id`, `name`, `force`, `primaryMuscles`, `secondaryMuscles`).

use crate::config::CatalogConfig;
use crate::types::{CatalogExercise, Force};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Tabs of the "add exercise" screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogTab {
    All,
    /// Exercises that already appear somewhere in the log
    Previous,
    /// User-defined exercises
    Custom,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    exercises: Vec<CatalogExercise>,
}

fn entry(
    id: &str,
    name: &str,
    force: Option<Force>,
    primary: &[&str],
    secondary: &[&str],
) -> CatalogExercise {
    CatalogExercise {
        id: id.into(),
        name: name.into(),
        force,
        primary_muscles: primary.iter().map(|m| m.to_string()).collect(),
        secondary_muscles: secondary.iter().map(|m| m.to_string()).collect(),
        custom: false,
    }
}

/// Builds the built-in catalog
///
/// Prefer [`get_default_catalog`], which returns a cached reference.
pub fn build_default_catalog() -> Catalog {
    use Force::*;

    Catalog::new(vec![
        entry("barbell_bench_press", "Barbell Bench Press", Some(Push), &["chest"], &["shoulders", "triceps"]),
        entry("barbell_squat", "Barbell Squat", Some(Push), &["quadriceps"], &["glutes", "hamstrings", "lower back"]),
        entry("barbell_deadlift", "Barbell Deadlift", Some(Pull), &["lower back"], &["glutes", "hamstrings", "forearms"]),
        entry("standing_military_press", "Standing Military Press", Some(Push), &["shoulders"], &["triceps"]),
        entry("bent_over_barbell_row", "Bent Over Barbell Row", Some(Pull), &["middle back"], &["biceps", "lats"]),
        entry("pullups", "Pullups", Some(Pull), &["lats"], &["biceps", "middle back"]),
        entry("dips_triceps_version", "Dips - Triceps Version", Some(Push), &["triceps"], &["chest", "shoulders"]),
        entry("barbell_curl", "Barbell Curl", Some(Pull), &["biceps"], &["forearms"]),
        entry("leg_press", "Leg Press", Some(Push), &["quadriceps"], &["glutes", "hamstrings"]),
        entry("romanian_deadlift", "Romanian Deadlift", Some(Pull), &["hamstrings"], &["glutes", "lower back"]),
        entry("standing_calf_raises", "Standing Calf Raises", Some(Push), &["calves"], &[]),
        entry("plank", "Plank", Some(Static), &["abdominals"], &[]),
    ])
}

impl Catalog {
    pub fn new(exercises: Vec<CatalogExercise>) -> Self {
        Self { exercises }
    }

    /// Parse a JSON array of exercises
    pub fn from_json(json: &str) -> Result<Self> {
        let exercises: Vec<CatalogExercise> = serde_json::from_str(json)?;
        let catalog = Self::new(exercises);
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        Ok(catalog)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        tracing::info!("Loaded {} exercises from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// The configured catalog file, or the built-in catalog
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::load(path),
            None => Ok(get_default_catalog().clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn exercises(&self) -> &[CatalogExercise] {
        &self.exercises
    }

    pub fn get(&self, id: &str) -> Option<&CatalogExercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CatalogExercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    /// Exercises whose name contains `text`, ignoring case
    pub fn search(&self, text: &str) -> Vec<&CatalogExercise> {
        let needle = text.trim().to_lowercase();
        self.exercises
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Search results restricted to a tab
    ///
    /// `previous_names` are the exercise names found in the log; see
    /// [`crate::history::previous_exercise_names`].
    pub fn filter(
        &self,
        tab: CatalogTab,
        text: &str,
        previous_names: &HashSet<String>,
    ) -> Vec<&CatalogExercise> {
        let mut results = self.search(text);
        match tab {
            CatalogTab::All => {}
            CatalogTab::Previous => results.retain(|e| previous_names.contains(&e.name)),
            CatalogTab::Custom => results.retain(|e| e.custom),
        }
        results
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut ids = HashSet::new();
        let mut names = HashSet::new();

        for exercise in &self.exercises {
            if exercise.id.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty ID", exercise.name));
            } else if !ids.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise ID '{}'", exercise.id));
            }

            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            } else if !names.insert(exercise.name.as_str()) {
                // Records are de-duplicated by name, so names must be unique too
                errors.push(format!("Duplicate exercise name '{}'", exercise.name));
            }
        }

        errors
    }
}
