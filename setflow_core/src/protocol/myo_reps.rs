//! Myo-reps: one near-failure activation set, then short-rest mini-sets.
//!
//! Phase graph:
//!
//! ```text
//! setup -> activation -> rest -> mini_set -> rest -> mini_set -> ... -> complete
//! ```
//!
//! The chain continues while the caller judges each mini-set as matching its
//! target. The first miss ends it with `no_match`; a fifth matched mini-set
//! ends it with `target_reached`.

use super::{illegal, rest_or, stop_effects, Effect, PhaseClass, ProtocolEvent, ProtocolMachine, Transition};
use crate::error::Rejection;
use crate::timer::{RestTimer, TimerKind, TimerTick};
use crate::types::{EffortScale, PerformanceEntry, ProtocolMethod, TerminationReason};
use serde::{Deserialize, Serialize};

/// Upper bound on mini-sets in one chain
pub const MAX_MINI_SETS: usize = 5;

/// Lower bound on the informational mini-set target
const MIN_TARGET_MINI_REPS: u32 = 3;

/// Mini-set target as a fraction of activation reps
const MINI_REP_RATIO: f64 = 0.25;

/// Suggested reps for each mini-set: `max(3, round(activation_reps * 0.25))`
///
/// Shown to the lifter only. The match judgement that drives the chain is
/// supplied by the caller.
pub fn target_mini_reps(activation_reps: u32) -> u32 {
    let scaled = (f64::from(activation_reps) * MINI_REP_RATIO).round() as u32;
    scaled.max(MIN_TARGET_MINI_REPS)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MyoRepsConfig {
    /// Rest before each mini-set, in time units
    #[serde(default = "default_rest_interval")]
    pub rest_interval: u32,
}

fn default_rest_interval() -> u32 {
    20
}

impl Default for MyoRepsConfig {
    fn default() -> Self {
        Self {
            rest_interval: default_rest_interval(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MyoRepsPhase {
    Setup,
    Activation,
    Rest { timer: RestTimer },
    MiniSet,
    Complete { reason: TerminationReason },
}

impl MyoRepsPhase {
    fn name(&self) -> &'static str {
        match self {
            MyoRepsPhase::Setup => "setup",
            MyoRepsPhase::Activation => "activation",
            MyoRepsPhase::Rest { .. } => "rest",
            MyoRepsPhase::MiniSet => "mini_set",
            MyoRepsPhase::Complete { .. } => "complete",
        }
    }
}

/// One mini-set as recorded: reps plus the caller's match judgement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MiniSetEntry {
    pub reps: u32,
    pub matched: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MyoRepsRecord {
    pub activation: Option<PerformanceEntry>,
    pub mini_sets: Vec<MiniSetEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MyoRepsState {
    pub config: MyoRepsConfig,
    pub phase: MyoRepsPhase,
    pub record: MyoRepsRecord,
}

impl MyoRepsState {
    pub fn new(config: MyoRepsConfig) -> Self {
        Self {
            config,
            phase: MyoRepsPhase::Setup,
            record: MyoRepsRecord::default(),
        }
    }

    /// Target for the next mini-set, once the activation set is known
    pub fn target_mini_reps(&self) -> Option<u32> {
        self.record
            .activation
            .as_ref()
            .map(|a| target_mini_reps(a.reps))
    }

    pub fn completed_mini_sets(&self) -> usize {
        self.record.mini_sets.len()
    }

    fn with_phase(&self, phase: MyoRepsPhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }
}

impl ProtocolMachine for MyoRepsState {
    const METHOD: ProtocolMethod = ProtocolMethod::MyoReps;

    fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    fn phase_class(&self) -> PhaseClass {
        match self.phase {
            MyoRepsPhase::Setup => PhaseClass::Setup,
            MyoRepsPhase::Activation | MyoRepsPhase::MiniSet => PhaseClass::Recording,
            MyoRepsPhase::Rest { .. } => PhaseClass::Timed,
            MyoRepsPhase::Complete { .. } => PhaseClass::Terminal,
        }
    }

    fn termination(&self) -> Option<TerminationReason> {
        match self.phase {
            MyoRepsPhase::Complete { reason } => Some(reason),
            _ => None,
        }
    }

    fn check_startable(&self) -> Result<(), Rejection> {
        Ok(())
    }

    fn timer(&self) -> Option<&RestTimer> {
        match &self.phase {
            MyoRepsPhase::Rest { timer } => Some(timer),
            _ => None,
        }
    }

    fn transition(&self, event: &ProtocolEvent) -> Transition<Self> {
        let phase = self.phase.name();
        match (&self.phase, event) {
            (MyoRepsPhase::Setup, ProtocolEvent::Start) => {
                self.check_startable()?;
                Ok((self.with_phase(MyoRepsPhase::Activation), Vec::new()))
            }

            (MyoRepsPhase::Activation, ProtocolEvent::Record(input)) => {
                let entry = input.validate(EffortScale::MyoActivation, 1)?;
                let mut next = self.clone();
                next.record.activation = Some(entry);

                let mut effects = Vec::new();
                next.phase = rest_or(
                    TimerKind::Rest,
                    self.config.rest_interval,
                    &mut effects,
                    |timer| MyoRepsPhase::Rest { timer },
                    MyoRepsPhase::MiniSet,
                );
                Ok((next, effects))
            }

            (MyoRepsPhase::Rest { timer }, ProtocolEvent::Tick) => {
                let mut timer = timer.clone();
                match timer.tick() {
                    TimerTick::Fired => Ok((
                        self.with_phase(MyoRepsPhase::MiniSet),
                        vec![Effect::TimerExpired { kind: timer.kind() }],
                    )),
                    _ => Ok((self.with_phase(MyoRepsPhase::Rest { timer }), Vec::new())),
                }
            }

            (MyoRepsPhase::MiniSet, ProtocolEvent::Record(input)) => {
                let reps = input.require_reps(0)?;
                let matched = input.require_matched()?;

                let mut next = self.clone();
                next.record.mini_sets.push(MiniSetEntry { reps, matched });
                let completed = next.record.mini_sets.len();

                let mut effects = Vec::new();
                next.phase = if !matched {
                    MyoRepsPhase::Complete {
                        reason: TerminationReason::NoMatch,
                    }
                } else if completed >= MAX_MINI_SETS {
                    MyoRepsPhase::Complete {
                        reason: TerminationReason::TargetReached,
                    }
                } else {
                    rest_or(
                        TimerKind::Rest,
                        self.config.rest_interval,
                        &mut effects,
                        |timer| MyoRepsPhase::Rest { timer },
                        MyoRepsPhase::MiniSet,
                    )
                };

                if let Some(reason) = next.termination() {
                    effects.push(Effect::Finished { reason });
                }
                Ok((next, effects))
            }

            (
                MyoRepsPhase::Activation | MyoRepsPhase::Rest { .. } | MyoRepsPhase::MiniSet,
                ProtocolEvent::ForceStop,
            ) => Ok((
                self.with_phase(MyoRepsPhase::Complete {
                    reason: TerminationReason::UserStop,
                }),
                stop_effects(self.timer()),
            )),

            _ => Err(illegal(event, phase)),
        }
    }
}
