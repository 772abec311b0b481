//! Core domain types for the protocol execution engine.
//!
//! This module defines the vocabulary shared by every protocol:
//! - Protocol methods and their load coefficients
//! - Exercise references
//! - Effort ratings and the scales that restrict them
//! - Raw performance input and validated performance entries
//! - Termination reasons and the canonical set record

use crate::error::Rejection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Protocol Method
// ============================================================================

/// Set-execution technique selected for an exercise slot
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolMethod {
    Standard,
    MyoReps,
    DropSet,
    Superset,
    GiantSet,
}

impl ProtocolMethod {
    pub const ALL: [ProtocolMethod; 5] = [
        ProtocolMethod::Standard,
        ProtocolMethod::MyoReps,
        ProtocolMethod::DropSet,
        ProtocolMethod::Superset,
        ProtocolMethod::GiantSet,
    ];

    /// Stable snake_case name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolMethod::Standard => "standard",
            ProtocolMethod::MyoReps => "myo_reps",
            ProtocolMethod::DropSet => "drop_set",
            ProtocolMethod::Superset => "superset",
            ProtocolMethod::GiantSet => "giant_set",
        }
    }

    /// Fixed load-accounting weight for this method
    pub fn load_coefficient(&self) -> LoadCoefficient {
        match self {
            ProtocolMethod::Standard => LoadCoefficient::STANDARD,
            ProtocolMethod::MyoReps => LoadCoefficient::MYO_REPS,
            ProtocolMethod::DropSet => LoadCoefficient::DROP_SET,
            ProtocolMethod::Superset => LoadCoefficient::SUPERSET,
            ProtocolMethod::GiantSet => LoadCoefficient::GIANT_SET,
        }
    }

    /// Whether selecting this method creates a protocol instance
    pub fn is_structured(&self) -> bool {
        !matches!(self, ProtocolMethod::Standard)
    }
}

impl fmt::Display for ProtocolMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "standard" => Ok(ProtocolMethod::Standard),
            "myo_reps" | "myoreps" | "myo" => Ok(ProtocolMethod::MyoReps),
            "drop_set" | "dropset" | "drop" => Ok(ProtocolMethod::DropSet),
            "superset" | "super_set" => Ok(ProtocolMethod::Superset),
            "giant_set" | "giantset" | "giant" => Ok(ProtocolMethod::GiantSet),
            other => Err(format!("unknown protocol method: {}", other)),
        }
    }
}

// ============================================================================
// Load Coefficient
// ============================================================================

/// Rational weighting applied to a protocol's canonical volume
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadCoefficient {
    pub numerator: u32,
    pub denominator: u32,
}

impl LoadCoefficient {
    pub const STANDARD: LoadCoefficient = LoadCoefficient::new(1, 1);
    pub const MYO_REPS: LoadCoefficient = LoadCoefficient::new(6, 5);
    pub const DROP_SET: LoadCoefficient = LoadCoefficient::new(3, 2);
    pub const SUPERSET: LoadCoefficient = LoadCoefficient::new(4, 5);
    pub const GIANT_SET: LoadCoefficient = LoadCoefficient::new(2, 3);

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    /// Scale a raw volume by this coefficient
    pub fn apply(&self, volume: f64) -> f64 {
        volume * f64::from(self.numerator) / f64::from(self.denominator)
    }
}

impl fmt::Display for LoadCoefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

// ============================================================================
// Exercise Reference
// ============================================================================

/// Stable identifier plus display name; the engine never interprets either
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExerciseRef {
    pub id: String,
    pub name: String,
}

impl ExerciseRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Both the id and the display name are present
    pub fn is_fully_specified(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }
}

// ============================================================================
// Effort Rating
// ============================================================================

/// Self-reported exertion in half steps from 0 to 10
///
/// Stored as a count of half steps so equality and ordering are exact.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "f64", into = "f64")]
pub struct EffortRating(u8);

impl EffortRating {
    const MAX_HALF_STEPS: u8 = 20;

    /// Build a rating from a numeric value; `None` unless it is a half step in 0..=10
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 || doubled < 0.0 || doubled > f64::from(Self::MAX_HALF_STEPS) {
            return None;
        }
        Some(Self(doubled as u8))
    }

    pub(crate) const fn from_half_steps(half_steps: u8) -> Self {
        Self(half_steps)
    }

    pub fn value(&self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl TryFrom<f64> for EffortRating {
    type Error = String;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        EffortRating::new(value).ok_or_else(|| format!("invalid effort rating: {}", value))
    }
}

impl From<EffortRating> for f64 {
    fn from(rating: EffortRating) -> Self {
        rating.value()
    }
}

impl fmt::Display for EffortRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{:.1}", self.value())
        }
    }
}

/// Allowed effort values for a given recording step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffortScale {
    /// {6, 6.5, ..., 10}
    General,
    /// {8, 8.5, 9, 9.5}: a myo-reps activation set must end close to failure
    MyoActivation,
}

impl EffortScale {
    fn bounds(&self) -> (EffortRating, EffortRating) {
        match self {
            EffortScale::General => (
                EffortRating::from_half_steps(12),
                EffortRating::from_half_steps(20),
            ),
            EffortScale::MyoActivation => (
                EffortRating::from_half_steps(16),
                EffortRating::from_half_steps(19),
            ),
        }
    }

    pub fn allows(&self, rating: EffortRating) -> bool {
        let (low, high) = self.bounds();
        rating >= low && rating <= high
    }

    /// Every value in the scale, lowest first
    pub fn values(&self) -> Vec<EffortRating> {
        let (low, high) = self.bounds();
        (low.0..=high.0).map(EffortRating).collect()
    }
}

// ============================================================================
// Performance Input / Entry
// ============================================================================

/// Raw caller input for one recorded set; every field may be missing
///
/// Each protocol phase decides which fields it needs and validates them
/// before anything is consumed.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceInput {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub effort: Option<f64>,
    /// Myo-reps mini-set judgement: did the set match the target?
    pub matched: Option<bool>,
}

impl PerformanceInput {
    /// Weight, reps and effort all supplied
    pub fn set(weight: f64, reps: u32, effort: f64) -> Self {
        Self {
            weight: Some(weight),
            reps: Some(reps),
            effort: Some(effort),
            matched: None,
        }
    }

    /// A myo-reps mini-set: reps plus the match judgement
    pub fn mini_set(reps: u32, matched: bool) -> Self {
        Self {
            weight: None,
            reps: Some(reps),
            effort: None,
            matched: Some(matched),
        }
    }

    pub(crate) fn require_weight(&self) -> Result<f64, Rejection> {
        let weight = self.weight.ok_or(Rejection::MissingField("weight"))?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(Rejection::InvalidWeight(weight));
        }
        Ok(weight)
    }

    pub(crate) fn require_reps(&self, min: u32) -> Result<u32, Rejection> {
        let reps = self.reps.ok_or(Rejection::MissingField("reps"))?;
        if reps < min {
            return Err(Rejection::TooFewReps { min, got: reps });
        }
        Ok(reps)
    }

    pub(crate) fn require_effort(&self, scale: EffortScale) -> Result<EffortRating, Rejection> {
        let raw = self.effort.ok_or(Rejection::MissingField("effort"))?;
        match EffortRating::new(raw) {
            Some(rating) if scale.allows(rating) => Ok(rating),
            _ => Err(Rejection::EffortNotAllowed(raw)),
        }
    }

    pub(crate) fn require_matched(&self) -> Result<bool, Rejection> {
        self.matched.ok_or(Rejection::MissingField("matched"))
    }

    /// Validate weight, reps and effort together
    ///
    /// All three are checked before anything is returned, so a caller never
    /// sees a half-validated entry.
    pub fn validate(&self, scale: EffortScale, min_reps: u32) -> Result<PerformanceEntry, Rejection> {
        let weight = self.require_weight()?;
        let reps = self.require_reps(min_reps)?;
        let effort = self.require_effort(scale)?;
        Ok(PerformanceEntry {
            weight,
            reps,
            effort,
        })
    }
}

/// A validated set performance
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PerformanceEntry {
    pub weight: f64,
    pub reps: u32,
    pub effort: EffortRating,
}

impl PerformanceEntry {
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

// ============================================================================
// Termination and Canonical Output
// ============================================================================

/// Why a protocol instance reached its terminal phase
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    TargetReached,
    NoMatch,
    MaxReached,
    UserStop,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::TargetReached => "target_reached",
            TerminationReason::NoMatch => "no_match",
            TerminationReason::MaxReached => "max_reached",
            TerminationReason::UserStop => "user_stop",
        };
        f.write_str(s)
    }
}

/// The only set representation exposed outside the engine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CanonicalSetRecord {
    pub ordinal: u32,
    pub weight: f64,
    pub reps: u32,
    pub effort: EffortRating,
    pub completed: bool,
}

impl CanonicalSetRecord {
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}
