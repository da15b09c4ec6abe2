//! # Breathwork Core Library
//!
//! This library provides the timing engine for guided breathing sessions.
//! It follows a CLI-first philosophy: every operation is available through the
//! standalone `breathwork` binary, and any graphical host is a thin layer over
//! the same controller.
//!
//! ## Architecture
//!
//! - **Catalog**: Immutable breathing exercises, validated when loaded
//! - **Timer**: Monotonic clock sampling and a pure scheduler that decides at
//!   most one phase transition per evaluation
//! - **Lifecycle**: The session controller; the only owner of session state
//! - **Collaborators**: Traits for sound cues, the wake lock and rendering
//! - **Storage**: SQLite-based preferences and session history, TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: Start, pause, reset and drive a session
//! - [`Catalog`]: Exercise lookup
//! - [`Database`]: Preference and history persistence
//! - [`Config`]: Application configuration management

pub mod catalog;
pub mod collaborators;
pub mod cue;
pub mod display;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod simulation;
pub mod storage;
pub mod timer;

pub use catalog::{Catalog, ExerciseDefinition, ExerciseSpec, Motion, Phase, PhaseSpec};
pub use collaborators::{Collaborators, CueDispatcher, RenderTarget, WakeLock};
pub use cue::{CueKind, ToneProfile};
pub use error::{CatalogError, CollaboratorError, ConfigError, CoreError, StorageError};
pub use events::Event;
pub use lifecycle::{EngineSettings, SessionController, Visibility, WakeLockPolicy};
pub use simulation::{DrivePlan, SimulationReport};
pub use storage::{Config, Database, PreferenceStore, Preferences};
pub use timer::{
    ClockSample, DriveMode, ManualClock, MonotonicClock, SessionConfig, SessionState,
    SessionStatus, SystemClock,
};
