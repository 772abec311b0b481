//! Drop sets: successive sets at reduced weight with little or no rest.
//!
//! ```text
//! setup -> drop(1) -> [rest] -> drop(2) -> ... -> complete
//! ```
//!
//! After every drop one disjunctive guard decides whether the chain ends:
//! the drop count reached `max_drops`, or the drop fell under 6 reps, or the
//! effort fell under 8. Any of the three ends the chain with `max_reached`.
//! A caller stop ends it with `user_stop`.

use super::{illegal, rest_or, stop_effects, Effect, PhaseClass, ProtocolEvent, ProtocolMachine, Transition};
use crate::error::Rejection;
use crate::timer::{RestTimer, TimerKind, TimerTick};
use crate::types::{EffortRating, EffortScale, PerformanceEntry, ProtocolMethod, TerminationReason};
use serde::{Deserialize, Serialize};

/// A drop with fewer reps than this ends the chain
const MIN_CONTINUE_REPS: u32 = 6;

/// A drop rated below this effort ends the chain (8.0)
const MIN_CONTINUE_EFFORT: EffortRating = EffortRating::from_half_steps(16);

/// Drop count most templates are authored with
pub const AUTHORED_MAX_DROPS: u32 = 3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DropSetConfig {
    #[serde(default = "default_max_drops")]
    pub max_drops: u32,

    /// Rest between drops in time units; 0 chains drops back to back
    #[serde(default)]
    pub rest_between_drops: u32,
}

fn default_max_drops() -> u32 {
    4
}

impl Default for DropSetConfig {
    fn default() -> Self {
        Self {
            max_drops: default_max_drops(),
            rest_between_drops: 0,
        }
    }
}

impl DropSetConfig {
    /// The configuration typically written into templates
    pub fn authored() -> Self {
        Self {
            max_drops: AUTHORED_MAX_DROPS,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DropSetPhase {
    Setup,
    Drop { number: u32 },
    Rest { next: u32, timer: RestTimer },
    Complete { reason: TerminationReason },
}

impl DropSetPhase {
    fn name(&self) -> &'static str {
        match self {
            DropSetPhase::Setup => "setup",
            DropSetPhase::Drop { .. } => "drop",
            DropSetPhase::Rest { .. } => "rest",
            DropSetPhase::Complete { .. } => "complete",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DropEntry {
    pub drop_number: u32,
    pub performance: PerformanceEntry,
    /// Reduction from the previous drop in percent; absent for the first drop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction_pct: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DropSetRecord {
    pub drops: Vec<DropEntry>,
}

/// `(prev - curr) / prev * 100`, undefined when there is no previous weight
pub fn weight_reduction_pct(previous: f64, current: f64) -> Option<f64> {
    if previous <= 0.0 {
        return None;
    }
    Some((previous - current) / previous * 100.0)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DropSetState {
    pub config: DropSetConfig,
    pub phase: DropSetPhase,
    pub record: DropSetRecord,
}

impl DropSetState {
    pub fn new(config: DropSetConfig) -> Self {
        Self {
            config,
            phase: DropSetPhase::Setup,
            record: DropSetRecord::default(),
        }
    }

    fn should_terminate(&self, drop_number: u32, entry: &PerformanceEntry) -> bool {
        drop_number >= self.config.max_drops
            || entry.reps < MIN_CONTINUE_REPS
            || entry.effort < MIN_CONTINUE_EFFORT
    }

    fn with_phase(&self, phase: DropSetPhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }
}

impl ProtocolMachine for DropSetState {
    const METHOD: ProtocolMethod = ProtocolMethod::DropSet;

    fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    fn phase_class(&self) -> PhaseClass {
        match self.phase {
            DropSetPhase::Setup => PhaseClass::Setup,
            DropSetPhase::Drop { .. } => PhaseClass::Recording,
            DropSetPhase::Rest { .. } => PhaseClass::Timed,
            DropSetPhase::Complete { .. } => PhaseClass::Terminal,
        }
    }

    fn termination(&self) -> Option<TerminationReason> {
        match self.phase {
            DropSetPhase::Complete { reason } => Some(reason),
            _ => None,
        }
    }

    fn check_startable(&self) -> Result<(), Rejection> {
        if self.config.max_drops == 0 {
            return Err(Rejection::NotStartable("max_drops must be at least 1".into()));
        }
        Ok(())
    }

    fn timer(&self) -> Option<&RestTimer> {
        match &self.phase {
            DropSetPhase::Rest { timer, .. } => Some(timer),
            _ => None,
        }
    }

    fn transition(&self, event: &ProtocolEvent) -> Transition<Self> {
        let phase = self.phase.name();
        match (&self.phase, event) {
            (DropSetPhase::Setup, ProtocolEvent::Start) => {
                self.check_startable()?;
                Ok((self.with_phase(DropSetPhase::Drop { number: 1 }), Vec::new()))
            }

            (DropSetPhase::Drop { number }, ProtocolEvent::Record(input)) => {
                let number = *number;
                let performance = input.validate(EffortScale::General, 0)?;
                let reduction_pct = self
                    .record
                    .drops
                    .last()
                    .and_then(|prev| weight_reduction_pct(prev.performance.weight, performance.weight));

                let terminate = self.should_terminate(number, &performance);

                let mut next = self.clone();
                next.record.drops.push(DropEntry {
                    drop_number: number,
                    performance,
                    reduction_pct,
                });

                let mut effects = Vec::new();
                next.phase = if terminate {
                    let reason = TerminationReason::MaxReached;
                    effects.push(Effect::Finished { reason });
                    DropSetPhase::Complete { reason }
                } else {
                    rest_or(
                        TimerKind::Rest,
                        self.config.rest_between_drops,
                        &mut effects,
                        |timer| DropSetPhase::Rest {
                            next: number + 1,
                            timer,
                        },
                        DropSetPhase::Drop { number: number + 1 },
                    )
                };
                Ok((next, effects))
            }

            (DropSetPhase::Rest { next, timer }, ProtocolEvent::Tick) => {
                let mut timer = timer.clone();
                match timer.tick() {
                    TimerTick::Fired => Ok((
                        self.with_phase(DropSetPhase::Drop { number: *next }),
                        vec![Effect::TimerExpired { kind: timer.kind() }],
                    )),
                    _ => Ok((
                        self.with_phase(DropSetPhase::Rest { next: *next, timer }),
                        Vec::new(),
                    )),
                }
            }

            (DropSetPhase::Drop { .. } | DropSetPhase::Rest { .. }, ProtocolEvent::ForceStop) => Ok((
                self.with_phase(DropSetPhase::Complete {
                    reason: TerminationReason::UserStop,
                }),
                stop_effects(self.timer()),
            )),

            _ => Err(illegal(event, phase)),
        }
    }
}
