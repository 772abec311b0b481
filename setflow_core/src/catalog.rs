//! Built-in exercise catalog.
//!
//! Exercise slots refer to exercises by stable id. The catalog maps those
//! ids to display names and a few tags used when listing them.

use crate::types::ExerciseRef;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogExercise {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
}

impl CatalogExercise {
    pub fn to_ref(&self) -> ExerciseRef {
        ExerciseRef::new(self.id.clone(), self.name.clone())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: HashMap<String, CatalogExercise>,
}

/// Builds the default catalog; prefer [`get_default_catalog`]
pub fn build_default_catalog() -> Catalog {
    let entries: &[(&str, &str, &[&str])] = &[
        ("bench_press", "Bench Press", &["push", "chest", "barbell"]),
        ("incline_db_press", "Incline Dumbbell Press", &["push", "chest", "dumbbell"]),
        ("overhead_press", "Overhead Press", &["push", "shoulders", "barbell"]),
        ("lateral_raise", "Lateral Raise", &["isolation", "shoulders", "dumbbell"]),
        ("push_up", "Push-up", &["push", "chest", "bodyweight"]),
        ("barbell_row", "Barbell Row", &["pull", "back", "barbell"]),
        ("pull_up", "Pull-up", &["pull", "back", "bodyweight"]),
        ("lat_pulldown", "Lat Pulldown", &["pull", "back", "machine"]),
        ("biceps_curl", "Biceps Curl", &["isolation", "arms", "dumbbell"]),
        ("triceps_pushdown", "Triceps Pushdown", &["isolation", "arms", "cable"]),
        ("back_squat", "Back Squat", &["squat", "legs", "barbell"]),
        ("leg_press", "Leg Press", &["squat", "legs", "machine"]),
        ("romanian_deadlift", "Romanian Deadlift", &["hinge", "legs", "barbell"]),
        ("walking_lunge", "Walking Lunge", &["lunge", "legs", "dumbbell"]),
        ("leg_curl", "Leg Curl", &["isolation", "legs", "machine"]),
        ("kb_swing", "Kettlebell Swing", &["hinge", "conditioning", "kettlebell"]),
        ("plank", "Plank", &["core", "bodyweight"]),
    ];

    let exercises = entries
        .iter()
        .map(|(id, name, tags)| {
            (
                id.to_string(),
                CatalogExercise {
                    id: id.to_string(),
                    name: name.to_string(),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                },
            )
        })
        .collect();

    Catalog { exercises }
}

impl Catalog {
    pub fn get(&self, id: &str) -> Option<&CatalogExercise> {
        self.exercises.get(id)
    }

    /// Exercise reference for `id`, if the catalog knows it
    pub fn resolve(&self, id: &str) -> Option<ExerciseRef> {
        self.get(id).map(CatalogExercise::to_ref)
    }

    /// Exercises sorted by id
    pub fn sorted(&self) -> Vec<&CatalogExercise> {
        let mut all: Vec<_> = self.exercises.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Consistency problems, empty when the catalog is valid
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, exercise) in &self.exercises {
            if key.is_empty() || exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if key != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    key, exercise.id
                ));
            }
            if !exercise.to_ref().is_fully_specified() {
                errors.push(format!("Exercise '{}' has empty name", key));
            }
            if key.chars().any(|c| c.is_whitespace()) {
                errors.push(format!("Exercise id '{}' contains whitespace", key));
            }
        }

        errors
    }
}
