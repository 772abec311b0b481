//! Supersets: two exercises back to back, repeated for a number of rounds.
//!
//! ```text
//! setup -> exercise_a -> transition -> exercise_b -> rest -> exercise_a -> ...
//!                                                 \-> complete
//! ```
//!
//! The round counter moves forward only after the between-round rest, and
//! the last round's exercise B leads straight to `complete`.

use super::{illegal, rest_or, stop_effects, Effect, PhaseClass, ProtocolEvent, ProtocolMachine, Transition};
use crate::error::Rejection;
use crate::timer::{RestTimer, TimerKind, TimerTick};
use crate::types::{EffortScale, ExerciseRef, PerformanceEntry, ProtocolMethod, TerminationReason};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SupersetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_a: Option<ExerciseRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_b: Option<ExerciseRef>,

    #[serde(default = "default_target_supersets")]
    pub target_supersets: u32,

    #[serde(default = "default_rest_between_exercises")]
    pub rest_between_exercises: u32,

    #[serde(default = "default_rest_between_supersets")]
    pub rest_between_supersets: u32,
}

fn default_target_supersets() -> u32 {
    3
}

fn default_rest_between_exercises() -> u32 {
    10
}

fn default_rest_between_supersets() -> u32 {
    120
}

impl Default for SupersetConfig {
    fn default() -> Self {
        Self {
            exercise_a: None,
            exercise_b: None,
            target_supersets: default_target_supersets(),
            rest_between_exercises: default_rest_between_exercises(),
            rest_between_supersets: default_rest_between_supersets(),
        }
    }
}

impl SupersetConfig {
    pub fn with_exercises(mut self, a: ExerciseRef, b: ExerciseRef) -> Self {
        self.exercise_a = Some(a);
        self.exercise_b = Some(b);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SupersetPhase {
    Setup,
    ExerciseA { round: u32 },
    Transition { round: u32, timer: RestTimer },
    ExerciseB { round: u32 },
    Rest { round: u32, timer: RestTimer },
    Complete { reason: TerminationReason },
}

impl SupersetPhase {
    fn name(&self) -> &'static str {
        match self {
            SupersetPhase::Setup => "setup",
            SupersetPhase::ExerciseA { .. } => "exercise_a",
            SupersetPhase::Transition { .. } => "transition",
            SupersetPhase::ExerciseB { .. } => "exercise_b",
            SupersetPhase::Rest { .. } => "rest",
            SupersetPhase::Complete { .. } => "complete",
        }
    }
}

/// A performance tagged with the superset round it belongs to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoundEntry {
    pub round: u32,
    pub performance: PerformanceEntry,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SupersetRecord {
    pub completed_supersets: u32,
    pub exercise_a: Vec<RoundEntry>,
    pub exercise_b: Vec<RoundEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SupersetState {
    pub config: SupersetConfig,
    pub phase: SupersetPhase,
    pub record: SupersetRecord,
}

impl SupersetState {
    pub fn new(config: SupersetConfig) -> Self {
        Self {
            config,
            phase: SupersetPhase::Setup,
            record: SupersetRecord::default(),
        }
    }

    /// Round currently in progress (1-based), if any
    pub fn current_round(&self) -> Option<u32> {
        match &self.phase {
            SupersetPhase::ExerciseA { round }
            | SupersetPhase::Transition { round, .. }
            | SupersetPhase::ExerciseB { round }
            | SupersetPhase::Rest { round, .. } => Some(*round),
            _ => None,
        }
    }

    /// Exercise the lifter should be performing right now
    pub fn current_exercise(&self) -> Option<&ExerciseRef> {
        match self.phase {
            SupersetPhase::ExerciseA { .. } => self.config.exercise_a.as_ref(),
            SupersetPhase::ExerciseB { .. } => self.config.exercise_b.as_ref(),
            _ => None,
        }
    }

    fn with_phase(&self, phase: SupersetPhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }
}

impl ProtocolMachine for SupersetState {
    const METHOD: ProtocolMethod = ProtocolMethod::Superset;

    fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    fn phase_class(&self) -> PhaseClass {
        match self.phase {
            SupersetPhase::Setup => PhaseClass::Setup,
            SupersetPhase::ExerciseA { .. } | SupersetPhase::ExerciseB { .. } => {
                PhaseClass::Recording
            }
            SupersetPhase::Transition { .. } | SupersetPhase::Rest { .. } => PhaseClass::Timed,
            SupersetPhase::Complete { .. } => PhaseClass::Terminal,
        }
    }

    fn termination(&self) -> Option<TerminationReason> {
        match self.phase {
            SupersetPhase::Complete { reason } => Some(reason),
            _ => None,
        }
    }

    fn check_startable(&self) -> Result<(), Rejection> {
        let (a, b) = match (&self.config.exercise_a, &self.config.exercise_b) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Rejection::NotStartable("both exercises must be chosen".into())),
        };
        if !a.is_fully_specified() || !b.is_fully_specified() {
            return Err(Rejection::NotStartable(
                "both exercises need an id and a name".into(),
            ));
        }
        if a.id == b.id {
            return Err(Rejection::NotStartable(
                "a superset needs two different exercises".into(),
            ));
        }
        if self.config.target_supersets == 0 {
            return Err(Rejection::NotStartable(
                "target_supersets must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn timer(&self) -> Option<&RestTimer> {
        match &self.phase {
            SupersetPhase::Transition { timer, .. } | SupersetPhase::Rest { timer, .. } => {
                Some(timer)
            }
            _ => None,
        }
    }

    fn transition(&self, event: &ProtocolEvent) -> Transition<Self> {
        let phase = self.phase.name();
        match (&self.phase, event) {
            (SupersetPhase::Setup, ProtocolEvent::Start) => {
                self.check_startable()?;
                Ok((self.with_phase(SupersetPhase::ExerciseA { round: 1 }), Vec::new()))
            }

            (SupersetPhase::ExerciseA { round }, ProtocolEvent::Record(input)) => {
                let round = *round;
                let performance = input.validate(EffortScale::General, 0)?;

                let mut next = self.clone();
                next.record.exercise_a.push(RoundEntry { round, performance });

                let mut effects = Vec::new();
                next.phase = rest_or(
                    TimerKind::Transition,
                    self.config.rest_between_exercises,
                    &mut effects,
                    |timer| SupersetPhase::Transition { round, timer },
                    SupersetPhase::ExerciseB { round },
                );
                Ok((next, effects))
            }

            (SupersetPhase::ExerciseB { round }, ProtocolEvent::Record(input)) => {
                let round = *round;
                let performance = input.validate(EffortScale::General, 0)?;

                let mut next = self.clone();
                next.record.exercise_b.push(RoundEntry { round, performance });
                next.record.completed_supersets += 1;

                let mut effects = Vec::new();
                next.phase = if next.record.completed_supersets >= self.config.target_supersets {
                    let reason = TerminationReason::TargetReached;
                    effects.push(Effect::Finished { reason });
                    SupersetPhase::Complete { reason }
                } else {
                    rest_or(
                        TimerKind::RoundRest,
                        self.config.rest_between_supersets,
                        &mut effects,
                        |timer| SupersetPhase::Rest { round, timer },
                        SupersetPhase::ExerciseA { round: round + 1 },
                    )
                };
                Ok((next, effects))
            }

            (SupersetPhase::Transition { round, timer }, ProtocolEvent::Tick) => {
                let round = *round;
                let mut timer = timer.clone();
                match timer.tick() {
                    TimerTick::Fired => Ok((
                        self.with_phase(SupersetPhase::ExerciseB { round }),
                        vec![Effect::TimerExpired { kind: timer.kind() }],
                    )),
                    _ => Ok((
                        self.with_phase(SupersetPhase::Transition { round, timer }),
                        Vec::new(),
                    )),
                }
            }

            (SupersetPhase::Rest { round, timer }, ProtocolEvent::Tick) => {
                let round = *round;
                let mut timer = timer.clone();
                match timer.tick() {
                    TimerTick::Fired => Ok((
                        self.with_phase(SupersetPhase::ExerciseA { round: round + 1 }),
                        vec![Effect::TimerExpired { kind: timer.kind() }],
                    )),
                    _ => Ok((
                        self.with_phase(SupersetPhase::Rest { round, timer }),
                        Vec::new(),
                    )),
                }
            }

            (
                SupersetPhase::ExerciseA { .. }
                | SupersetPhase::Transition { .. }
                | SupersetPhase::ExerciseB { .. }
                | SupersetPhase::Rest { .. },
                ProtocolEvent::ForceStop,
            ) => Ok((
                self.with_phase(SupersetPhase::Complete {
                    reason: TerminationReason::UserStop,
                }),
                stop_effects(self.timer()),
            )),

            _ => Err(illegal(event, phase)),
        }
    }
}
