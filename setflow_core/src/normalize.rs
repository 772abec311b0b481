//! Set normalizer: finished protocol instance -> canonical set list.
//!
//! Every protocol ends up as an ordered list of [`CanonicalSetRecord`]s plus
//! the method's [`LoadCoefficient`], so volume analytics can treat them all
//! alike:
//! - myo-reps: activation is set #1, each mini-set follows; mini-sets carry
//!   the activation weight and effort (they are not rated separately)
//! - drop sets: one set per drop, each with its own values
//! - supersets and giant sets: the first slot's list is the canonical list;
//!   every other slot keeps its own list as a companion entry

use crate::error::Rejection;
use crate::instance::ProtocolInstance;
use crate::protocol::{CircuitEntry, DropEntry, MyoRepsRecord, RoundEntry};
use crate::types::{
    CanonicalSetRecord, ExerciseRef, LoadCoefficient, PerformanceEntry, ProtocolMethod,
    TerminationReason,
};
use serde::{Deserialize, Serialize};

/// Canonical sets for one exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSets {
    pub exercise: ExerciseRef,
    pub sets: Vec<CanonicalSetRecord>,
}

impl ExerciseSets {
    pub fn raw_volume(&self) -> f64 {
        self.sets.iter().map(CanonicalSetRecord::volume).sum()
    }
}

/// Normalizer output for one finished instance
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NormalizedSets {
    pub method: ProtocolMethod,
    pub termination: TerminationReason,
    pub coefficient: LoadCoefficient,
    /// The list reported for the authoring row that owns the protocol
    pub primary: ExerciseSets,
    /// Remaining superset / giant-set slots, each under its own exercise
    pub companions: Vec<ExerciseSets>,
}

impl NormalizedSets {
    /// Σ weight × reps over the primary list
    pub fn raw_volume(&self) -> f64 {
        self.primary.raw_volume()
    }

    /// Primary volume scaled by the load coefficient
    pub fn weighted_volume(&self) -> f64 {
        self.coefficient.apply(self.raw_volume())
    }
}

/// Normalize a terminal instance
///
/// `slot_exercise` is the exercise of the row that selected the protocol. It
/// names the primary list for myo-reps and drop sets, and is the fallback for
/// multi-exercise protocols whose first slot is somehow empty.
pub fn normalize(
    slot_exercise: &ExerciseRef,
    instance: &ProtocolInstance,
) -> Result<NormalizedSets, Rejection> {
    let termination = instance.termination().ok_or(Rejection::IllegalInPhase {
        event: "normalize",
        phase: instance.phase_name(),
    })?;
    let method = instance.method();

    let (primary, companions) = match instance {
        ProtocolInstance::MyoReps(state) => (
            ExerciseSets {
                exercise: slot_exercise.clone(),
                sets: myo_reps_sets(&state.record),
            },
            Vec::new(),
        ),

        ProtocolInstance::DropSet(state) => (
            ExerciseSets {
                exercise: slot_exercise.clone(),
                sets: drop_sets(&state.record.drops),
            },
            Vec::new(),
        ),

        ProtocolInstance::Superset(state) => {
            let exercise_a = state
                .config
                .exercise_a
                .clone()
                .unwrap_or_else(|| slot_exercise.clone());
            let primary = ExerciseSets {
                exercise: exercise_a,
                sets: round_sets(&state.record.exercise_a),
            };
            let companions = state
                .config
                .exercise_b
                .iter()
                .map(|exercise_b| ExerciseSets {
                    exercise: exercise_b.clone(),
                    sets: round_sets(&state.record.exercise_b),
                })
                .collect();
            (primary, companions)
        }

        ProtocolInstance::GiantSet(state) => {
            let mut lists = state
                .config
                .exercises
                .iter()
                .zip(state.record.exercises.iter())
                .map(|(slot, entries)| (slot.clone(), circuit_sets(entries)));

            let primary = match lists.next() {
                Some((slot, sets)) => ExerciseSets {
                    exercise: slot.unwrap_or_else(|| slot_exercise.clone()),
                    sets,
                },
                None => ExerciseSets {
                    exercise: slot_exercise.clone(),
                    sets: Vec::new(),
                },
            };
            let companions = lists
                .filter_map(|(slot, sets)| slot.map(|exercise| ExerciseSets { exercise, sets }))
                .collect();
            (primary, companions)
        }
    };

    tracing::debug!(
        "Normalized {} instance: {} primary sets, {} companion lists",
        method,
        primary.sets.len(),
        companions.len()
    );

    Ok(NormalizedSets {
        method,
        termination,
        coefficient: method.load_coefficient(),
        primary,
        companions,
    })
}

/// Standard sets pass through unchanged apart from ordinals
pub fn standard_sets(exercise: &ExerciseRef, entries: &[PerformanceEntry]) -> ExerciseSets {
    ExerciseSets {
        exercise: exercise.clone(),
        sets: numbered(entries.iter()),
    }
}

fn canonical(ordinal: u32, performance: &PerformanceEntry) -> CanonicalSetRecord {
    CanonicalSetRecord {
        ordinal,
        weight: performance.weight,
        reps: performance.reps,
        effort: performance.effort,
        completed: true,
    }
}

fn numbered<'a>(entries: impl Iterator<Item = &'a PerformanceEntry>) -> Vec<CanonicalSetRecord> {
    entries
        .zip(1u32..)
        .map(|(entry, ordinal)| canonical(ordinal, entry))
        .collect()
}

fn myo_reps_sets(record: &MyoRepsRecord) -> Vec<CanonicalSetRecord> {
    let Some(activation) = &record.activation else {
        return Vec::new();
    };

    let mut sets = vec![canonical(1, activation)];
    sets.extend(record.mini_sets.iter().zip(2u32..).map(|(mini, ordinal)| {
        CanonicalSetRecord {
            ordinal,
            weight: activation.weight,
            reps: mini.reps,
            effort: activation.effort,
            completed: true,
        }
    }));
    sets
}

fn drop_sets(drops: &[DropEntry]) -> Vec<CanonicalSetRecord> {
    numbered(drops.iter().map(|d| &d.performance))
}

fn round_sets(entries: &[RoundEntry]) -> Vec<CanonicalSetRecord> {
    numbered(entries.iter().map(|e| &e.performance))
}

fn circuit_sets(entries: &[CircuitEntry]) -> Vec<CanonicalSetRecord> {
    numbered(entries.iter().map(|e| &e.performance))
}
