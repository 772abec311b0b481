//! Protocol state machines.
//!
//! Every protocol is an explicit tagged-union phase plus a pure transition
//! function `(state, event) -> (state, effects)`. A transition never mutates
//! its input: on rejection the caller keeps the old state untouched, on
//! success it swaps in the returned one.
//!
//! Timers live inside the timed phase variants. Leaving a timed phase (for
//! any reason) drops its timer, so a stopped instance can never be woken by
//! a stale countdown.

pub mod drop_set;
pub mod giant_set;
pub mod myo_reps;
pub mod superset;

use crate::error::Rejection;
use crate::timer::{RestTimer, TimerKind};
use crate::types::{PerformanceInput, ProtocolMethod, TerminationReason};
use serde::{Deserialize, Serialize};

pub use drop_set::{DropEntry, DropSetConfig, DropSetPhase, DropSetRecord, DropSetState};
pub use giant_set::{CircuitEntry, GiantSetConfig, GiantSetPhase, GiantSetRecord, GiantSetState};
pub use myo_reps::{
    target_mini_reps, MiniSetEntry, MyoRepsConfig, MyoRepsPhase, MyoRepsRecord, MyoRepsState,
};
pub use superset::{RoundEntry, SupersetConfig, SupersetPhase, SupersetRecord, SupersetState};

/// Inbound event for any protocol
#[derive(Clone, Debug, PartialEq)]
pub enum ProtocolEvent {
    /// Leave setup and begin the first recording phase
    Start,
    /// Caller-recorded performance for the current recording phase
    Record(PerformanceInput),
    /// One unit of elapsed time
    Tick,
    /// Caller ends the protocol early
    ForceStop,
}

impl ProtocolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolEvent::Start => "start",
            ProtocolEvent::Record(_) => "record",
            ProtocolEvent::Tick => "tick",
            ProtocolEvent::ForceStop => "force_stop",
        }
    }
}

/// Side effect produced by a transition, for the host to act on or report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    TimerStarted { kind: TimerKind, duration: u32 },
    TimerExpired { kind: TimerKind },
    /// A pending timer was dropped by a stop
    TimerDiscarded { kind: TimerKind },
    Finished { reason: TerminationReason },
}

/// Successful transition output
pub type Transition<S> = Result<(S, Vec<Effect>), Rejection>;

/// Coarse classification of a phase, shared across protocols
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseClass {
    Setup,
    Recording,
    Timed,
    Terminal,
}

/// Common surface of the four protocol machines
pub trait ProtocolMachine: Clone + Sized {
    const METHOD: ProtocolMethod;

    /// snake_case name of the current phase
    fn phase_name(&self) -> &'static str;

    fn phase_class(&self) -> PhaseClass;

    /// Set once the terminal phase is reached, `None` before
    fn termination(&self) -> Option<TerminationReason>;

    /// `Ok` when the configuration allows leaving setup
    fn check_startable(&self) -> Result<(), Rejection>;

    fn transition(&self, event: &ProtocolEvent) -> Transition<Self>;

    /// Remaining units on the running timer, if the phase is timed
    fn timer(&self) -> Option<&RestTimer>;

    fn is_terminal(&self) -> bool {
        self.phase_class() == PhaseClass::Terminal
    }
}

pub(crate) fn illegal(event: &ProtocolEvent, phase: &'static str) -> Rejection {
    Rejection::IllegalInPhase {
        event: event.name(),
        phase,
    }
}

/// Start a timer, or skip straight past the timed phase when the duration is zero
pub(crate) fn rest_or<P>(
    kind: TimerKind,
    duration: u32,
    effects: &mut Vec<Effect>,
    timed: impl FnOnce(RestTimer) -> P,
    skip_to: P,
) -> P {
    if duration == 0 {
        return skip_to;
    }
    effects.push(Effect::TimerStarted { kind, duration });
    timed(RestTimer::start(kind, duration))
}

/// Effects for a caller stop from the given phase
pub(crate) fn stop_effects(pending: Option<&RestTimer>) -> Vec<Effect> {
    let mut effects = Vec::new();
    if let Some(timer) = pending {
        effects.push(Effect::TimerDiscarded { kind: timer.kind() });
    }
    effects.push(Effect::Finished {
        reason: TerminationReason::UserStop,
    });
    effects
}
