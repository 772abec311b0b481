//! Error types for the setflow_core library.
//!
//! Two kinds of failure live here:
//! - [`Error`] for IO, serialization, configuration and persistence problems
//! - [`Rejection`] for events a protocol state machine refuses to consume
//!
//! A rejection is never fatal. The instance it was aimed at is left exactly
//! as it was before the event arrived.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for setflow_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Exercise catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Template authoring error (unknown slot, self-pairing, ...)
    #[error("Template error: {0}")]
    Template(String),

    /// Persistence collaborator failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An event was refused by the protocol engine
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Why a protocol event was refused.
///
/// Returned by every transition function and by the session controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("weight must be a finite value >= 0 (got {0})")]
    InvalidWeight(f64),

    #[error("reps must be at least {min} (got {got})")]
    TooFewReps { min: u32, got: u32 },

    #[error("effort rating {0} is not allowed here")]
    EffortNotAllowed(f64),

    #[error("event `{event}` is not legal in phase `{phase}`")]
    IllegalInPhase {
        event: &'static str,
        phase: &'static str,
    },

    #[error("configuration is not startable: {0}")]
    NotStartable(String),

    #[error("configuration can only change during setup")]
    ConfigLocked,

    #[error("configuration patch would change the protocol method")]
    MethodMismatch,

    #[error("first exercise must be the slot exercise `{expected}`, got `{got}`")]
    SlotMismatch { expected: String, got: String },

    #[error("no protocol instance is active")]
    NoActiveInstance,
}
