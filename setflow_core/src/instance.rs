//! Tagged protocol instance and its raw execution record.

use crate::error::Rejection;
use crate::protocol::{
    DropSetConfig, DropSetRecord, DropSetState, Effect, GiantSetConfig, GiantSetRecord,
    GiantSetState, MyoRepsConfig, MyoRepsRecord, MyoRepsState, PhaseClass, ProtocolEvent,
    ProtocolMachine, SupersetConfig, SupersetRecord, SupersetState,
};
use crate::timer::RestTimer;
use crate::types::{ExerciseRef, ProtocolMethod, TerminationReason};
use serde::{Deserialize, Serialize};

/// Per-method configuration, as a single value the controller can patch
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ProtocolConfig {
    MyoReps(MyoRepsConfig),
    DropSet(DropSetConfig),
    Superset(SupersetConfig),
    GiantSet(GiantSetConfig),
}

impl ProtocolConfig {
    pub fn method(&self) -> ProtocolMethod {
        match self {
            ProtocolConfig::MyoReps(_) => ProtocolMethod::MyoReps,
            ProtocolConfig::DropSet(_) => ProtocolMethod::DropSet,
            ProtocolConfig::Superset(_) => ProtocolMethod::Superset,
            ProtocolConfig::GiantSet(_) => ProtocolMethod::GiantSet,
        }
    }
}

/// Raw record of what was performed, as persisted
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ExecutionRecord {
    MyoReps(MyoRepsRecord),
    DropSet(DropSetRecord),
    Superset(SupersetRecord),
    GiantSet(GiantSetRecord),
}

/// One protocol instance; exactly one phase is active by construction
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ProtocolInstance {
    MyoReps(MyoRepsState),
    DropSet(DropSetState),
    Superset(SupersetState),
    GiantSet(GiantSetState),
}

macro_rules! dispatch {
    ($instance:expr, $state:ident => $body:expr) => {
        match $instance {
            ProtocolInstance::MyoReps($state) => $body,
            ProtocolInstance::DropSet($state) => $body,
            ProtocolInstance::Superset($state) => $body,
            ProtocolInstance::GiantSet($state) => $body,
        }
    };
}

impl ProtocolInstance {
    /// Fresh instance in setup
    pub fn new(config: ProtocolConfig) -> Self {
        match config {
            ProtocolConfig::MyoReps(c) => ProtocolInstance::MyoReps(MyoRepsState::new(c)),
            ProtocolConfig::DropSet(c) => ProtocolInstance::DropSet(DropSetState::new(c)),
            ProtocolConfig::Superset(c) => ProtocolInstance::Superset(SupersetState::new(c)),
            ProtocolConfig::GiantSet(c) => ProtocolInstance::GiantSet(GiantSetState::new(c)),
        }
    }

    pub fn method(&self) -> ProtocolMethod {
        match self {
            ProtocolInstance::MyoReps(_) => MyoRepsState::METHOD,
            ProtocolInstance::DropSet(_) => DropSetState::METHOD,
            ProtocolInstance::Superset(_) => SupersetState::METHOD,
            ProtocolInstance::GiantSet(_) => GiantSetState::METHOD,
        }
    }

    pub fn phase_name(&self) -> &'static str {
        dispatch!(self, s => s.phase_name())
    }

    pub fn phase_class(&self) -> PhaseClass {
        dispatch!(self, s => s.phase_class())
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        dispatch!(self, s => s.termination())
    }

    pub fn is_terminal(&self) -> bool {
        self.phase_class() == PhaseClass::Terminal
    }

    pub fn timer(&self) -> Option<&RestTimer> {
        dispatch!(self, s => s.timer())
    }

    pub fn check_startable(&self) -> Result<(), Rejection> {
        dispatch!(self, s => s.check_startable())
    }

    pub fn config(&self) -> ProtocolConfig {
        match self {
            ProtocolInstance::MyoReps(s) => ProtocolConfig::MyoReps(s.config.clone()),
            ProtocolInstance::DropSet(s) => ProtocolConfig::DropSet(s.config.clone()),
            ProtocolInstance::Superset(s) => ProtocolConfig::Superset(s.config.clone()),
            ProtocolInstance::GiantSet(s) => ProtocolConfig::GiantSet(s.config.clone()),
        }
    }

    pub fn execution_record(&self) -> ExecutionRecord {
        match self {
            ProtocolInstance::MyoReps(s) => ExecutionRecord::MyoReps(s.record.clone()),
            ProtocolInstance::DropSet(s) => ExecutionRecord::DropSet(s.record.clone()),
            ProtocolInstance::Superset(s) => ExecutionRecord::Superset(s.record.clone()),
            ProtocolInstance::GiantSet(s) => ExecutionRecord::GiantSet(s.record.clone()),
        }
    }

    /// Exercises taking part beyond the slot's own (superset and giant set)
    pub fn exercises(&self) -> Vec<ExerciseRef> {
        match self {
            ProtocolInstance::Superset(s) => [&s.config.exercise_a, &s.config.exercise_b]
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
            ProtocolInstance::GiantSet(s) => {
                s.config.exercises.iter().flatten().cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Feed one event through the matching state machine
    ///
    /// Pure: `self` is left as it was; the caller installs the returned
    /// instance on success.
    pub fn transition(&self, event: &ProtocolEvent) -> Result<(Self, Vec<Effect>), Rejection> {
        match self {
            ProtocolInstance::MyoReps(s) => s
                .transition(event)
                .map(|(next, fx)| (ProtocolInstance::MyoReps(next), fx)),
            ProtocolInstance::DropSet(s) => s
                .transition(event)
                .map(|(next, fx)| (ProtocolInstance::DropSet(next), fx)),
            ProtocolInstance::Superset(s) => s
                .transition(event)
                .map(|(next, fx)| (ProtocolInstance::Superset(next), fx)),
            ProtocolInstance::GiantSet(s) => s
                .transition(event)
                .map(|(next, fx)| (ProtocolInstance::GiantSet(next), fx)),
        }
    }
}
