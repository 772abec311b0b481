//! Protocol session controller.
//!
//! One controller owns one exercise slot. It selects the protocol, owns the
//! single active instance, routes events into the matching state machine and,
//! when the instance reaches its terminal phase:
//! 1. normalizes it into canonical sets
//! 2. pushes those sets to the set tracker
//! 3. writes the raw record to the protocol sink exactly once
//!
//! The finished instance is then dropped from transient state; its
//! [`CompletionReport`] stays available whatever the write outcome.

use crate::config::{PersistenceConfig, ProtocolDefaults};
use crate::error::Rejection;
use crate::instance::{ProtocolConfig, ProtocolInstance};
use crate::normalize::{normalize, standard_sets, ExerciseSets, NormalizedSets};
use crate::protocol::{Effect, PhaseClass, ProtocolEvent};
use crate::timer::{Clock, SystemClock};
use crate::types::{EffortScale, ExerciseRef, PerformanceEntry, PerformanceInput, ProtocolMethod};
use crate::wal::{ProtocolLogEntry, ProtocolSink, SetTracker, TrackedSets};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Summary of a finished protocol, kept after the instance is discarded
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionReport {
    pub log_entry_id: Uuid,
    pub finished_at: DateTime<Utc>,
    pub normalized: NormalizedSets,
    /// Whether the protocol sink accepted the record
    pub persisted: bool,
    /// Failures worth telling the user about; the result above stands regardless
    pub notifications: Vec<String>,
}

/// What one routed event produced
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub effects: Vec<Effect>,
    pub completion: Option<CompletionReport>,
}

/// Controller for a single exercise slot
pub struct ProtocolSession<S: ProtocolSink, T: SetTracker> {
    exercise: ExerciseRef,
    defaults: ProtocolDefaults,
    persistence: PersistenceConfig,
    method: ProtocolMethod,
    instance: Option<ProtocolInstance>,
    standard_entries: Vec<PerformanceEntry>,
    last_completion: Option<CompletionReport>,
    sink: S,
    tracker: T,
    clock: Box<dyn Clock>,
}

impl<S: ProtocolSink, T: SetTracker> ProtocolSession<S, T> {
    /// New controller on the standard path
    pub fn new(exercise: ExerciseRef, defaults: ProtocolDefaults, sink: S, tracker: T) -> Self {
        Self {
            exercise,
            defaults,
            persistence: PersistenceConfig::default(),
            method: ProtocolMethod::Standard,
            instance: None,
            standard_entries: Vec::new(),
            last_completion: None,
            sink,
            tracker,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn exercise(&self) -> &ExerciseRef {
        &self.exercise
    }

    pub fn method(&self) -> ProtocolMethod {
        self.method
    }

    pub fn instance(&self) -> Option<&ProtocolInstance> {
        self.instance.as_ref()
    }

    pub fn last_completion(&self) -> Option<&CompletionReport> {
        self.last_completion.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Name of the active phase, or `None` without an instance
    pub fn phase_name(&self) -> Option<&'static str> {
        self.instance.as_ref().map(ProtocolInstance::phase_name)
    }

    /// Informational myo-reps mini-set target
    pub fn target_mini_reps(&self) -> Option<u32> {
        match &self.instance {
            Some(ProtocolInstance::MyoReps(state)) => state.target_mini_reps(),
            _ => None,
        }
    }

    /// Standard sets recorded so far and not yet handed to the tracker
    pub fn standard_entries(&self) -> &[PerformanceEntry] {
        &self.standard_entries
    }

    /// Switch method, discarding any current instance
    pub fn select_method(&mut self, method: ProtocolMethod) {
        if let Some(old) = &self.instance {
            if !old.is_terminal() && old.phase_class() != PhaseClass::Setup {
                tracing::warn!(
                    "Discarding unfinished {} instance in phase {}",
                    old.method(),
                    old.phase_name()
                );
            }
        }

        self.method = method;
        self.instance = self.defaults.config_for(method).map(|mut config| {
            anchor_to_slot(&mut config, &self.exercise);
            ProtocolInstance::new(config)
        });
        self.standard_entries.clear();
        tracing::info!("Selected {} for {}", method, self.exercise.id);
    }

    /// Patch the configuration; only legal in setup and only within the same method
    pub fn update_config<F>(&mut self, patch: F) -> Result<(), Rejection>
    where
        F: FnOnce(&mut ProtocolConfig),
    {
        let instance = self.instance.as_ref().ok_or(Rejection::NoActiveInstance)?;
        if instance.phase_class() != PhaseClass::Setup {
            return Err(Rejection::ConfigLocked);
        }

        let mut config = instance.config();
        patch(&mut config);
        if config.method() != instance.method() {
            return Err(Rejection::MethodMismatch);
        }
        check_slot(&config, &self.exercise)?;

        self.instance = Some(ProtocolInstance::new(config));
        tracing::debug!("Updated {} configuration", self.method);
        Ok(())
    }

    /// Whether `start` would currently be accepted
    pub fn can_start(&self) -> bool {
        self.instance.as_ref().is_some_and(|instance| {
            instance.phase_class() == PhaseClass::Setup && instance.check_startable().is_ok()
        })
    }

    pub fn start(&mut self) -> Result<StepOutcome, Rejection> {
        self.route(ProtocolEvent::Start)
    }

    /// Record a performance for the current phase
    ///
    /// On the standard path the entry is validated and kept until
    /// [`finish_standard`](Self::finish_standard).
    pub fn record_performance(&mut self, input: PerformanceInput) -> Result<StepOutcome, Rejection> {
        if self.method == ProtocolMethod::Standard {
            let entry = input.validate(EffortScale::General, 0)?;
            self.standard_entries.push(entry);
            return Ok(StepOutcome::default());
        }
        self.route(ProtocolEvent::Record(input))
    }

    /// One unit of elapsed time; a no-op unless a timer is running
    pub fn tick(&mut self) -> Result<StepOutcome, Rejection> {
        match &self.instance {
            Some(instance) if instance.phase_class() == PhaseClass::Timed => {
                self.route(ProtocolEvent::Tick)
            }
            _ => Ok(StepOutcome::default()),
        }
    }

    /// Deliver up to `ticks` units, stopping early once no timer is running
    pub fn advance(&mut self, ticks: u32) -> Result<StepOutcome, Rejection> {
        let mut outcome = StepOutcome::default();
        for _ in 0..ticks {
            let timed = self
                .instance
                .as_ref()
                .is_some_and(|i| i.phase_class() == PhaseClass::Timed);
            if !timed {
                break;
            }
            let step = self.route(ProtocolEvent::Tick)?;
            outcome.effects.extend(step.effects);
        }
        Ok(outcome)
    }

    /// End the active protocol now with `user_stop`
    pub fn force_stop(&mut self) -> Result<StepOutcome, Rejection> {
        self.route(ProtocolEvent::ForceStop)
    }

    /// Hand the recorded standard sets to the set tracker
    ///
    /// `Ok(None)` means nothing was recorded. A tracker failure is returned
    /// and the entries are kept, so the call can be repeated.
    pub fn finish_standard(&mut self) -> crate::Result<Option<TrackedSets>> {
        if self.method != ProtocolMethod::Standard {
            return Err(Rejection::IllegalInPhase {
                event: "finish_standard",
                phase: self.phase_name().unwrap_or("none"),
            }
            .into());
        }
        if self.standard_entries.is_empty() {
            return Ok(None);
        }

        let sets = standard_sets(&self.exercise, &self.standard_entries);
        let tracked = self.tracked(None, ProtocolMethod::Standard, sets);
        if let Err(e) = self.tracker.push(&tracked) {
            tracing::warn!("Set tracker rejected standard sets for {}: {}", self.exercise.id, e);
            return Err(e);
        }
        self.standard_entries.clear();
        Ok(Some(tracked))
    }

    fn route(&mut self, event: ProtocolEvent) -> Result<StepOutcome, Rejection> {
        let current = self.instance.as_ref().ok_or(Rejection::NoActiveInstance)?;

        let (next, effects) = match current.transition(&event) {
            Ok(step) => step,
            Err(rejection) => {
                tracing::warn!(
                    "{} rejected {} in phase {}: {}",
                    current.method(),
                    event.name(),
                    current.phase_name(),
                    rejection
                );
                return Err(rejection);
            }
        };

        if next.phase_name() != current.phase_name() {
            tracing::info!(
                "{} {}: {} -> {}",
                self.exercise.id,
                next.method(),
                current.phase_name(),
                next.phase_name()
            );
        }

        if next.is_terminal() {
            let completion = self.on_terminal(&next)?;
            self.instance = None;
            self.last_completion = Some(completion.clone());
            return Ok(StepOutcome {
                effects,
                completion: Some(completion),
            });
        }

        self.instance = Some(next);
        Ok(StepOutcome {
            effects,
            completion: None,
        })
    }

    fn on_terminal(&mut self, finished: &ProtocolInstance) -> Result<CompletionReport, Rejection> {
        let normalized = normalize(&self.exercise, finished)?;
        let finished_at = self.clock.now();
        let entry = ProtocolLogEntry {
            id: Uuid::new_v4(),
            exercise_id: self.exercise.id.clone(),
            method: finished.method(),
            termination: normalized.termination,
            finished_at,
            exercises: finished.exercises(),
            record: finished.execution_record(),
        };

        tracing::info!(
            "{} finished for {} ({}): {} sets, weighted volume {:.1}",
            entry.method,
            entry.exercise_id,
            entry.termination,
            normalized.primary.sets.len(),
            normalized.weighted_volume()
        );

        let mut notifications = Vec::new();

        for sets in std::iter::once(&normalized.primary).chain(normalized.companions.iter()) {
            let tracked = self.tracked(Some(entry.id), entry.method, sets.clone());
            if let Err(e) = self.tracker.push(&tracked) {
                tracing::warn!("Set tracker rejected sets for {}: {}", sets.exercise.id, e);
                notifications.push(format!(
                    "Could not record sets for {}: {}",
                    sets.exercise.name, e
                ));
            }
        }

        let persisted = match self.persist(&entry) {
            Ok(()) => true,
            Err(message) => {
                notifications.push(message);
                false
            }
        };

        Ok(CompletionReport {
            log_entry_id: entry.id,
            finished_at,
            normalized,
            persisted,
            notifications,
        })
    }

    /// The one terminal write, retried with a fixed pause
    fn persist(&mut self, entry: &ProtocolLogEntry) -> Result<(), String> {
        let attempts = self.persistence.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.sink.append(entry) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        "Protocol log write attempt {}/{} failed: {}",
                        attempt,
                        attempts,
                        e
                    );
                    last_error = e.to_string();
                    if attempt < attempts && self.persistence.retry_delay_ms > 0 {
                        std::thread::sleep(std::time::Duration::from_millis(
                            self.persistence.retry_delay_ms,
                        ));
                    }
                }
            }
        }

        Err(format!(
            "Could not save the finished {} after {} attempts: {}",
            entry.method, attempts, last_error
        ))
    }

    fn tracked(
        &self,
        protocol_entry_id: Option<Uuid>,
        method: ProtocolMethod,
        sets: ExerciseSets,
    ) -> TrackedSets {
        TrackedSets {
            id: Uuid::new_v4(),
            protocol_entry_id,
            performed_at: self.clock.now(),
            exercise: sets.exercise,
            method,
            coefficient: method.load_coefficient(),
            sets: sets.sets,
        }
    }
}

/// The first exercise of a multi-exercise protocol is the slot exercise;
/// its sets are filed under the slot's id.
fn first_slot(config: &mut ProtocolConfig) -> Option<&mut Option<ExerciseRef>> {
    match config {
        ProtocolConfig::Superset(c) => Some(&mut c.exercise_a),
        ProtocolConfig::GiantSet(c) => c.exercises.first_mut(),
        _ => None,
    }
}

fn anchor_to_slot(config: &mut ProtocolConfig, slot_exercise: &ExerciseRef) {
    if let Some(first) = first_slot(config) {
        first.get_or_insert_with(|| slot_exercise.clone());
    }
}

fn check_slot(config: &ProtocolConfig, slot_exercise: &ExerciseRef) -> Result<(), Rejection> {
    let first = match config {
        ProtocolConfig::Superset(c) => c.exercise_a.as_ref(),
        ProtocolConfig::GiantSet(c) => c.exercises.first().and_then(|e| e.as_ref()),
        _ => None,
    };
    match first {
        Some(exercise) if exercise.id != slot_exercise.id => Err(Rejection::SlotMismatch {
            expected: slot_exercise.id.clone(),
            got: exercise.id.clone(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::GiantSetConfig;
    use crate::timer::{ManualClock, TimerKind};
    use crate::types::TerminationReason;
    use crate::wal::MemorySetTracker;
    use crate::{Error, Result};

    #[derive(Default)]
    struct MemorySink {
        entries: Vec<ProtocolLogEntry>,
        failures_left: u32,
        attempts: u32,
    }

    impl ProtocolSink for MemorySink {
        fn append(&mut self, entry: &ProtocolLogEntry) -> Result<()> {
            self.attempts += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(Error::Persistence("backend unavailable".into()));
            }
            self.entries.push(entry.clone());
            Ok(())
        }
    }

    fn session(sink: MemorySink) -> ProtocolSession<MemorySink, MemorySetTracker> {
        crate::logging::init_test();
        ProtocolSession::new(
            ExerciseRef::new("bench_press", "Bench Press"),
            ProtocolDefaults::default(),
            sink,
            MemorySetTracker::default(),
        )
        .with_persistence(PersistenceConfig {
            max_attempts: 3,
            retry_delay_ms: 0,
        })
        .with_clock(ManualClock::default())
    }

    fn drain(session: &mut ProtocolSession<MemorySink, MemorySetTracker>) {
        session.advance(u32::MAX).unwrap();
    }

    #[test]
    fn test_select_method_enters_setup_with_defaults() {
        let mut s = session(MemorySink::default());
        assert!(s.instance().is_none());

        s.select_method(ProtocolMethod::MyoReps);
        assert_eq!(s.phase_name(), Some("setup"));
        match s.instance() {
            Some(ProtocolInstance::MyoReps(state)) => assert_eq!(state.config.rest_interval, 20),
            other => panic!("unexpected instance: {:?}", other),
        }

        s.select_method(ProtocolMethod::Standard);
        assert!(s.instance().is_none());
    }

    #[test]
    fn test_update_config_only_in_setup() {
        let mut s = session(MemorySink::default());
        s.select_method(ProtocolMethod::DropSet);

        s.update_config(|config| {
            if let ProtocolConfig::DropSet(c) = config {
                c.max_drops = 2;
            }
        })
        .unwrap();

        let changed = s.update_config(|config| {
            *config = ProtocolConfig::MyoReps(Default::default());
        });
        assert_eq!(changed, Err(Rejection::MethodMismatch));

        s.start().unwrap();
        let locked = s.update_config(|_| {});
        assert_eq!(locked, Err(Rejection::ConfigLocked));
    }

    #[test]
    fn test_start_disabled_until_configured() {
        let mut s = session(MemorySink::default());
        s.select_method(ProtocolMethod::GiantSet);
        assert!(!s.can_start());
        assert!(matches!(s.start(), Err(Rejection::NotStartable(_))));
        assert_eq!(s.phase_name(), Some("setup"));

        s.update_config(|config| {
            if let ProtocolConfig::GiantSet(c) = config {
                *c = GiantSetConfig::default().with_exercises(vec![
                    ExerciseRef::new("bench_press", "Bench Press"),
                    ExerciseRef::new("push_up", "Push-up"),
                    ExerciseRef::new("kb_swing", "Kettlebell Swing"),
                    ExerciseRef::new("pull_up", "Pull-up"),
                ]);
            }
        })
        .unwrap();
        assert!(s.can_start());
        s.start().unwrap();
        assert_eq!(s.phase_name(), Some("exercise"));
    }

    #[test]
    fn test_first_exercise_anchored_to_slot() {
        let mut s = session(MemorySink::default());
        s.select_method(ProtocolMethod::Superset);
        match s.instance() {
            Some(ProtocolInstance::Superset(state)) => {
                assert_eq!(state.config.exercise_a.as_ref().map(|e| e.id.as_str()), Some("bench_press"));
            }
            other => panic!("unexpected instance: {:?}", other),
        }

        let moved = s.update_config(|config| {
            if let ProtocolConfig::Superset(c) = config {
                c.exercise_a = Some(ExerciseRef::new("squat", "Back Squat"));
                c.exercise_b = Some(ExerciseRef::new("barbell_row", "Barbell Row"));
            }
        });
        assert_eq!(
            moved,
            Err(Rejection::SlotMismatch {
                expected: "bench_press".into(),
                got: "squat".into(),
            })
        );
        assert!(!s.can_start());

        s.select_method(ProtocolMethod::GiantSet);
        let circuit = s.update_config(|config| {
            if let ProtocolConfig::GiantSet(c) = config {
                *c = GiantSetConfig::default().with_exercises(vec![
                    ExerciseRef::new("squat", "Back Squat"),
                    ExerciseRef::new("bench_press", "Bench Press"),
                    ExerciseRef::new("kb_swing", "Kettlebell Swing"),
                    ExerciseRef::new("pull_up", "Pull-up"),
                ]);
            }
        });
        assert!(matches!(circuit, Err(Rejection::SlotMismatch { .. })));
        assert_eq!(s.phase_name(), Some("setup"));
    }

    #[test]
    fn test_invalid_performance_rejected_without_change() {
        let mut s = session(MemorySink::default());
        s.select_method(ProtocolMethod::MyoReps);
        s.start().unwrap();

        let before = s.instance().cloned();
        let result = s.record_performance(PerformanceInput::set(60.0, 15, 7.0));
        assert_eq!(result, Err(Rejection::EffortNotAllowed(7.0)));
        assert_eq!(s.instance().cloned(), before);
    }

    #[test]
    fn test_myo_reps_end_to_end() {
        let mut s = session(MemorySink::default());
        s.select_method(ProtocolMethod::MyoReps);
        s.start().unwrap();
        s.record_performance(PerformanceInput::set(60.0, 20, 9.0)).unwrap();
        assert_eq!(s.target_mini_reps(), Some(5));

        let mut completion = None;
        for _ in 0..5 {
            drain(&mut s);
            let outcome = s
                .record_performance(PerformanceInput::mini_set(5, true))
                .unwrap();
            completion = outcome.completion;
        }

        let report = completion.expect("fifth mini-set finishes the chain");
        assert_eq!(report.normalized.termination, TerminationReason::TargetReached);
        assert_eq!(report.normalized.primary.sets.len(), 6);
        assert!(report.persisted);
        assert!(s.instance().is_none());
        assert_eq!(s.last_completion(), Some(&report));

        assert_eq!(s.sink().entries.len(), 1);
        assert_eq!(s.sink().entries[0].exercise_id, "bench_press");
        assert_eq!(s.tracker().pushed.len(), 1);
        assert_eq!(s.tracker().pushed[0].protocol_entry_id, Some(report.log_entry_id));
    }

    #[test]
    fn test_force_stop_wins_over_pending_timer() {
        let mut s = session(MemorySink::default());
        s.select_method(ProtocolMethod::MyoReps);
        assert_eq!(
            s.force_stop(),
            Err(Rejection::IllegalInPhase {
                event: "force_stop",
                phase: "setup"
            })
        );

        s.start().unwrap();
        s.record_performance(PerformanceInput::set(60.0, 12, 8.5)).unwrap();
        s.advance(5).unwrap();

        let outcome = s.force_stop().unwrap();
        assert!(outcome.effects.contains(&Effect::TimerDiscarded {
            kind: TimerKind::Rest
        }));
        let report = outcome.completion.unwrap();
        assert_eq!(report.normalized.termination, TerminationReason::UserStop);

        // No timer remains to fire later
        assert_eq!(s.tick(), Ok(StepOutcome::default()));
        assert_eq!(s.sink().entries.len(), 1);
    }

    #[test]
    fn test_persistence_retries_then_succeeds() {
        let mut s = session(MemorySink {
            failures_left: 2,
            ..Default::default()
        });
        s.select_method(ProtocolMethod::DropSet);
        s.start().unwrap();
        let outcome = s
            .record_performance(PerformanceInput::set(100.0, 5, 9.0))
            .unwrap();

        let report = outcome.completion.unwrap();
        assert!(report.persisted);
        assert!(report.notifications.is_empty());
        assert_eq!(s.sink().attempts, 3);
        assert_eq!(s.sink().entries.len(), 1);
    }

    #[test]
    fn test_persistence_failure_keeps_result_visible() {
        let mut s = session(MemorySink {
            failures_left: 10,
            ..Default::default()
        });
        s.select_method(ProtocolMethod::DropSet);
        s.start().unwrap();
        let outcome = s
            .record_performance(PerformanceInput::set(100.0, 5, 9.0))
            .unwrap();

        let report = outcome.completion.unwrap();
        assert!(!report.persisted);
        assert_eq!(report.notifications.len(), 1);
        assert_eq!(report.normalized.primary.sets.len(), 1);
        assert_eq!(s.sink().attempts, 3);
        assert!(s.last_completion().is_some());
        // Canonical sets still reach the tracker
        assert_eq!(s.tracker().pushed.len(), 1);
    }

    #[test]
    fn test_superset_pushes_companion_under_own_exercise() {
        let mut s = session(MemorySink::default());
        s.select_method(ProtocolMethod::Superset);
        s.update_config(|config| {
            if let ProtocolConfig::Superset(c) = config {
                c.exercise_a = Some(ExerciseRef::new("bench_press", "Bench Press"));
                c.exercise_b = Some(ExerciseRef::new("barbell_row", "Barbell Row"));
                c.target_supersets = 1;
            }
        })
        .unwrap();
        s.start().unwrap();
        s.record_performance(PerformanceInput::set(80.0, 8, 8.0)).unwrap();
        drain(&mut s);
        let outcome = s
            .record_performance(PerformanceInput::set(70.0, 10, 8.0))
            .unwrap();

        assert!(outcome.completion.is_some());
        let pushed: Vec<&str> = s
            .tracker()
            .pushed
            .iter()
            .map(|t| t.exercise.id.as_str())
            .collect();
        assert_eq!(pushed, vec!["bench_press", "barbell_row"]);
        assert!(s.tracker().pushed.iter().all(|t| t.method == ProtocolMethod::Superset));
        assert_eq!(s.sink().entries[0].exercises.len(), 2);
    }

    #[test]
    fn test_standard_path_goes_to_tracker() {
        let mut s = session(MemorySink::default());
        s.record_performance(PerformanceInput::set(100.0, 5, 8.0)).unwrap();
        s.record_performance(PerformanceInput::set(100.0, 5, 8.5)).unwrap();
        assert!(s.record_performance(PerformanceInput::set(100.0, 5, 5.0)).is_err());

        let tracked = s.finish_standard().unwrap().unwrap();
        assert_eq!(tracked.sets.len(), 2);
        assert_eq!(tracked.coefficient.as_f64(), 1.0);
        assert_eq!(tracked.weighted_volume(), 1000.0);
        assert!(s.sink().entries.is_empty());
        assert!(s.standard_entries().is_empty());
    }

    struct BrokenTracker;

    impl SetTracker for BrokenTracker {
        fn push(&mut self, _sets: &TrackedSets) -> Result<()> {
            Err(Error::Persistence("tracker offline".into()))
        }
    }

    #[test]
    fn test_standard_tracker_failure_is_reported() {
        crate::logging::init_test();
        let mut s = ProtocolSession::new(
            ExerciseRef::new("bench_press", "Bench Press"),
            ProtocolDefaults::default(),
            MemorySink::default(),
            BrokenTracker,
        )
        .with_clock(ManualClock::default());
        s.record_performance(PerformanceInput::set(100.0, 5, 8.0)).unwrap();

        let result = s.finish_standard();
        assert!(matches!(result, Err(Error::Persistence(_))));
        // Kept for another attempt
        assert_eq!(s.standard_entries().len(), 1);
    }
}
