#![forbid(unsafe_code)]

//! Core engine for structured resistance-training protocols.
//!
//! This crate provides:
//! - Domain types (methods, efforts, performances, canonical sets)
//! - Protocol state machines (myo-reps, drop sets, supersets, giant sets)
//! - The session controller and set normalizer
//! - Template authoring and superset pairing
//! - Persistence (WAL, CSV rollup, templates) and volume history

pub mod types;
pub mod error;
pub mod timer;
pub mod protocol;
pub mod instance;
pub mod normalize;
pub mod session;
pub mod pairing;
pub mod store;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Rejection, Result};
pub use types::*;
pub use catalog::get_default_catalog;
pub use config::Config;
pub use instance::{ExecutionRecord, ProtocolConfig, ProtocolInstance};
pub use normalize::{normalize, NormalizedSets};
pub use pairing::{PairingResolver, Template};
pub use session::{CompletionReport, ProtocolSession, StepOutcome};
pub use timer::{Clock, ManualClock, SystemClock};
pub use wal::{JsonlLog, ProtocolSink, SetTracker};
pub use history::{load_recent_protocols, load_recent_sets, volume_summary};
