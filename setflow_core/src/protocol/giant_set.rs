//! Giant sets: a circuit of four to six exercises, repeated.
//!
//! ```text
//! setup -> exercise(0) -> transition -> exercise(1) -> ... -> exercise(n-1)
//!       -> circuit_rest -> exercise(0) -> ...             \-> complete
//! ```
//!
//! `completed_circuits` moves only when the last exercise of a circuit is
//! recorded.

use super::{illegal, rest_or, stop_effects, Effect, PhaseClass, ProtocolEvent, ProtocolMachine, Transition};
use crate::error::Rejection;
use crate::timer::{RestTimer, TimerKind, TimerTick};
use crate::types::{EffortScale, ExerciseRef, PerformanceEntry, ProtocolMethod, TerminationReason};
use serde::{Deserialize, Serialize};

pub const MIN_EXERCISES: usize = 4;
pub const MAX_EXERCISES: usize = 6;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GiantSetConfig {
    /// Exercise slots in circuit order; `None` is a slot not yet chosen
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<Option<ExerciseRef>>,

    #[serde(default = "default_target_circuits")]
    pub target_circuits: u32,

    #[serde(default = "default_rest_between_exercises")]
    pub rest_between_exercises: u32,

    #[serde(default = "default_rest_between_circuits")]
    pub rest_between_circuits: u32,
}

fn default_target_circuits() -> u32 {
    3
}

fn default_rest_between_exercises() -> u32 {
    15
}

fn default_rest_between_circuits() -> u32 {
    180
}

impl Default for GiantSetConfig {
    fn default() -> Self {
        Self {
            exercises: Vec::new(),
            target_circuits: default_target_circuits(),
            rest_between_exercises: default_rest_between_exercises(),
            rest_between_circuits: default_rest_between_circuits(),
        }
    }
}

impl GiantSetConfig {
    /// `count` empty slots, to be filled one by one during setup
    pub fn with_empty_slots(mut self, count: usize) -> Self {
        self.exercises = vec![None; count];
        self
    }

    pub fn with_exercises(mut self, exercises: impl IntoIterator<Item = ExerciseRef>) -> Self {
        self.exercises = exercises.into_iter().map(Some).collect();
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GiantSetPhase {
    Setup,
    Exercise {
        circuit: u32,
        index: usize,
    },
    Transition {
        circuit: u32,
        next_index: usize,
        timer: RestTimer,
    },
    CircuitRest {
        circuit: u32,
        timer: RestTimer,
    },
    Complete {
        reason: TerminationReason,
    },
}

impl GiantSetPhase {
    fn name(&self) -> &'static str {
        match self {
            GiantSetPhase::Setup => "setup",
            GiantSetPhase::Exercise { .. } => "exercise",
            GiantSetPhase::Transition { .. } => "transition",
            GiantSetPhase::CircuitRest { .. } => "circuit_rest",
            GiantSetPhase::Complete { .. } => "complete",
        }
    }
}

/// A performance tagged with the circuit it belongs to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CircuitEntry {
    pub circuit: u32,
    pub performance: PerformanceEntry,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GiantSetRecord {
    pub completed_circuits: u32,
    /// One list per exercise slot, in slot order
    pub exercises: Vec<Vec<CircuitEntry>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GiantSetState {
    pub config: GiantSetConfig,
    pub phase: GiantSetPhase,
    pub record: GiantSetRecord,
}

impl GiantSetState {
    pub fn new(config: GiantSetConfig) -> Self {
        Self {
            config,
            phase: GiantSetPhase::Setup,
            record: GiantSetRecord::default(),
        }
    }

    /// Exercise the lifter should be performing right now
    pub fn current_exercise(&self) -> Option<&ExerciseRef> {
        match self.phase {
            GiantSetPhase::Exercise { index, .. } => {
                self.config.exercises.get(index).and_then(|slot| slot.as_ref())
            }
            _ => None,
        }
    }

    fn slot_count(&self) -> usize {
        self.config.exercises.len()
    }

    fn with_phase(&self, phase: GiantSetPhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }
}

impl ProtocolMachine for GiantSetState {
    const METHOD: ProtocolMethod = ProtocolMethod::GiantSet;

    fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    fn phase_class(&self) -> PhaseClass {
        match self.phase {
            GiantSetPhase::Setup => PhaseClass::Setup,
            GiantSetPhase::Exercise { .. } => PhaseClass::Recording,
            GiantSetPhase::Transition { .. } | GiantSetPhase::CircuitRest { .. } => {
                PhaseClass::Timed
            }
            GiantSetPhase::Complete { .. } => PhaseClass::Terminal,
        }
    }

    fn termination(&self) -> Option<TerminationReason> {
        match self.phase {
            GiantSetPhase::Complete { reason } => Some(reason),
            _ => None,
        }
    }

    fn check_startable(&self) -> Result<(), Rejection> {
        let count = self.slot_count();
        if !(MIN_EXERCISES..=MAX_EXERCISES).contains(&count) {
            return Err(Rejection::NotStartable(format!(
                "a giant set needs {} to {} exercises (has {})",
                MIN_EXERCISES, MAX_EXERCISES, count
            )));
        }
        let all_filled = self
            .config
            .exercises
            .iter()
            .all(|slot| slot.as_ref().is_some_and(ExerciseRef::is_fully_specified));
        if !all_filled {
            return Err(Rejection::NotStartable(
                "every exercise slot must be filled".into(),
            ));
        }
        if self.config.target_circuits == 0 {
            return Err(Rejection::NotStartable(
                "target_circuits must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn timer(&self) -> Option<&RestTimer> {
        match &self.phase {
            GiantSetPhase::Transition { timer, .. } | GiantSetPhase::CircuitRest { timer, .. } => {
                Some(timer)
            }
            _ => None,
        }
    }

    fn transition(&self, event: &ProtocolEvent) -> Transition<Self> {
        let phase = self.phase.name();
        match (&self.phase, event) {
            (GiantSetPhase::Setup, ProtocolEvent::Start) => {
                self.check_startable()?;
                let mut next = self.with_phase(GiantSetPhase::Exercise {
                    circuit: 1,
                    index: 0,
                });
                next.record.exercises = vec![Vec::new(); self.slot_count()];
                Ok((next, Vec::new()))
            }

            (GiantSetPhase::Exercise { circuit, index }, ProtocolEvent::Record(input)) => {
                let (circuit, index) = (*circuit, *index);
                let performance = input.validate(EffortScale::General, 0)?;

                let mut next = self.clone();
                next.record.exercises[index].push(CircuitEntry {
                    circuit,
                    performance,
                });

                let mut effects = Vec::new();
                let is_last = index + 1 == self.slot_count();
                next.phase = if !is_last {
                    rest_or(
                        TimerKind::Transition,
                        self.config.rest_between_exercises,
                        &mut effects,
                        |timer| GiantSetPhase::Transition {
                            circuit,
                            next_index: index + 1,
                            timer,
                        },
                        GiantSetPhase::Exercise {
                            circuit,
                            index: index + 1,
                        },
                    )
                } else {
                    next.record.completed_circuits += 1;
                    if next.record.completed_circuits >= self.config.target_circuits {
                        let reason = TerminationReason::TargetReached;
                        effects.push(Effect::Finished { reason });
                        GiantSetPhase::Complete { reason }
                    } else {
                        rest_or(
                            TimerKind::RoundRest,
                            self.config.rest_between_circuits,
                            &mut effects,
                            |timer| GiantSetPhase::CircuitRest { circuit, timer },
                            GiantSetPhase::Exercise {
                                circuit: circuit + 1,
                                index: 0,
                            },
                        )
                    }
                };
                Ok((next, effects))
            }

            (
                GiantSetPhase::Transition {
                    circuit,
                    next_index,
                    timer,
                },
                ProtocolEvent::Tick,
            ) => {
                let (circuit, next_index) = (*circuit, *next_index);
                let mut timer = timer.clone();
                match timer.tick() {
                    TimerTick::Fired => Ok((
                        self.with_phase(GiantSetPhase::Exercise {
                            circuit,
                            index: next_index,
                        }),
                        vec![Effect::TimerExpired { kind: timer.kind() }],
                    )),
                    _ => Ok((
                        self.with_phase(GiantSetPhase::Transition {
                            circuit,
                            next_index,
                            timer,
                        }),
                        Vec::new(),
                    )),
                }
            }

            (GiantSetPhase::CircuitRest { circuit, timer }, ProtocolEvent::Tick) => {
                let circuit = *circuit;
                let mut timer = timer.clone();
                match timer.tick() {
                    TimerTick::Fired => Ok((
                        self.with_phase(GiantSetPhase::Exercise {
                            circuit: circuit + 1,
                            index: 0,
                        }),
                        vec![Effect::TimerExpired { kind: timer.kind() }],
                    )),
                    _ => Ok((
                        self.with_phase(GiantSetPhase::CircuitRest { circuit, timer }),
                        Vec::new(),
                    )),
                }
            }

            (
                GiantSetPhase::Exercise { .. }
                | GiantSetPhase::Transition { .. }
                | GiantSetPhase::CircuitRest { .. },
                ProtocolEvent::ForceStop,
            ) => Ok((
                self.with_phase(GiantSetPhase::Complete {
                    reason: TerminationReason::UserStop,
                }),
                stop_effects(self.timer()),
            )),

            _ => Err(illegal(event, phase)),
        }
    }
}
