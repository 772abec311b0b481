//! Rest timer and clock abstractions.
//!
//! The protocol state machines never read the wall clock. A timed phase owns
//! a [`RestTimer`] and advances it when a `Tick` event arrives; the host loop
//! decides when ticks happen, usually through a [`TickPacer`] over a
//! [`Clock`]. Tests drive the pacer with a [`ManualClock`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// What a running timer is separating
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Rest inside one exercise's chain (myo-reps, drop sets)
    Rest,
    /// Short changeover between two different exercises
    Transition,
    /// Rest after a full superset round or giant-set circuit
    RoundRest,
}

/// Outcome of a single tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTick {
    /// Still counting down; carries the remaining units
    Running(u32),
    /// Reached zero on this tick
    Fired,
    /// Already fired earlier; nothing happens
    Idle,
}

/// Countdown in whole time units that fires exactly once
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestTimer {
    kind: TimerKind,
    duration: u32,
    remaining: u32,
    fired: bool,
}

impl RestTimer {
    pub fn start(kind: TimerKind, duration: u32) -> Self {
        Self {
            kind,
            duration,
            remaining: duration,
            fired: false,
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Advance by one unit
    pub fn tick(&mut self) -> TimerTick {
        if self.fired {
            return TimerTick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.fired = true;
            TimerTick::Fired
        } else {
            TimerTick::Running(self.remaining)
        }
    }
}

// ============================================================================
// Clocks
// ============================================================================

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Converts elapsed clock time into whole tick units
///
/// Fractions of a unit are carried over to the next poll, so polling often
/// never loses time and never double counts it.
#[derive(Debug)]
pub struct TickPacer<C: Clock> {
    clock: C,
    unit: Duration,
    last: DateTime<Utc>,
}

impl<C: Clock> TickPacer<C> {
    /// Pacer emitting one tick per second of clock time
    pub fn per_second(clock: C) -> Self {
        Self::new(clock, Duration::seconds(1))
    }

    pub fn new(clock: C, unit: Duration) -> Self {
        let last = clock.now();
        Self { clock, unit, last }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of whole units elapsed since the previous call
    pub fn due_ticks(&mut self) -> u32 {
        let unit_ms = self.unit.num_milliseconds();
        if unit_ms <= 0 {
            return 0;
        }
        let now = self.clock.now();
        let elapsed_ms = (now - self.last).num_milliseconds();
        if elapsed_ms <= 0 {
            return 0;
        }
        let ticks = elapsed_ms / unit_ms;
        self.last += Duration::milliseconds(ticks * unit_ms);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_exactly_once() {
        let mut timer = RestTimer::start(TimerKind::Rest, 3);
        assert_eq!(timer.tick(), TimerTick::Running(2));
        assert_eq!(timer.tick(), TimerTick::Running(1));
        assert_eq!(timer.tick(), TimerTick::Fired);
        assert_eq!(timer.tick(), TimerTick::Idle);
        assert_eq!(timer.tick(), TimerTick::Idle);
        assert!(timer.has_fired());
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_one_unit_timer() {
        let mut timer = RestTimer::start(TimerKind::Transition, 1);
        assert_eq!(timer.tick(), TimerTick::Fired);
    }

    #[test]
    fn test_pacer_counts_whole_units() {
        let clock = ManualClock::default();
        let mut pacer = TickPacer::per_second(clock);

        assert_eq!(pacer.due_ticks(), 0);

        pacer.clock().advance(Duration::milliseconds(2500));
        assert_eq!(pacer.due_ticks(), 2);

        // The leftover half second is carried
        pacer.clock().advance(Duration::milliseconds(600));
        assert_eq!(pacer.due_ticks(), 1);

        assert_eq!(pacer.due_ticks(), 0);
    }
}
