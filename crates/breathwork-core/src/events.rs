use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cue::CueKind;
use crate::timer::{DriveMode, SessionStatus};

/// Every state change in the engine produces an Event.
/// Front ends render them; the CLI records finished sessions from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        exercise_id: String,
        total_duration_seconds: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase_remaining_ms: u64,
        /// `None` for unbounded sessions.
        session_remaining_ms: Option<u64>,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase_remaining_ms: u64,
        session_remaining_ms: Option<u64>,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        phase_index: usize,
        label: String,
        duration_ms: u64,
        cue: CueKind,
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        exercise_id: String,
        cycle_count: u64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// Manual stop. `elapsed_ms` is zero if the session never started.
    SessionReset {
        exercise_id: String,
        cycle_count: u64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    DriveModeChanged {
        mode: DriveMode,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        exercise_id: String,
        phase_index: usize,
        phase_label: String,
        phase_progress: f64,
        phase_remaining_ms: u64,
        scale: f64,
        cycle_count: u64,
        session_elapsed_ms: u64,
        session_remaining_ms: Option<u64>,
        drive_mode: DriveMode,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "SessionStarted",
            Event::SessionPaused { .. } => "SessionPaused",
            Event::SessionResumed { .. } => "SessionResumed",
            Event::PhaseEntered { .. } => "PhaseEntered",
            Event::CycleCompleted { .. } => "CycleCompleted",
            Event::SessionCompleted { .. } => "SessionCompleted",
            Event::SessionReset { .. } => "SessionReset",
            Event::DriveModeChanged { .. } => "DriveModeChanged",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}
