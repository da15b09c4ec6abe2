use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::scheduler::{Decision, Transition};
use crate::catalog::ExerciseDefinition;

/// Which exercise runs and for how long.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub exercise: Arc<ExerciseDefinition>,
    /// Total session length; `0` runs until stopped.
    pub total_duration_seconds: u64,
}

impl SessionConfig {
    pub fn new(exercise: Arc<ExerciseDefinition>, total_duration_seconds: u64) -> Self {
        Self {
            exercise,
            total_duration_seconds,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.total_duration_seconds > 0
    }

    pub fn total_ms(&self) -> u64 {
        self.total_duration_seconds.saturating_mul(1000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Elapsed times frozen at pause or completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedSnapshot {
    pub phase_elapsed_ms: u64,
    pub session_elapsed_ms: u64,
}

impl ElapsedSnapshot {
    /// Seconds left in a bounded session at the moment of the snapshot.
    pub fn remaining_seconds(&self, total_duration_seconds: u64) -> Option<f64> {
        (total_duration_seconds > 0).then(|| {
            (total_duration_seconds as f64 - self.session_elapsed_ms as f64 / 1000.0).max(0.0)
        })
    }
}

/// The mutable core of a session.
///
/// Owned by the lifecycle controller. The scheduler only reads it and
/// returns a [`Decision`], which is applied here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub running: bool,
    pub current_phase_index: usize,
    pub cycle_count: u64,
    pub phase_started_at_ms: Option<u64>,
    pub session_started_at_ms: Option<u64>,
    /// Set while paused or completed.
    pub snapshot: Option<ElapsedSnapshot>,
    pub last_announced_phase_label: Option<String>,
    pub completed: bool,
}

impl SessionState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        if self.running {
            SessionStatus::Running
        } else if self.completed {
            SessionStatus::Completed
        } else if self.snapshot.is_some() {
            SessionStatus::Paused
        } else {
            SessionStatus::Idle
        }
    }

    pub fn is_paused(&self) -> bool {
        self.status() == SessionStatus::Paused
    }

    /// Remaining seconds captured at the last pause, if any.
    pub fn paused_remaining_seconds(&self, total_duration_seconds: u64) -> Option<f64> {
        if !self.is_paused() {
            return None;
        }
        self.snapshot?.remaining_seconds(total_duration_seconds)
    }

    /// Apply a scheduler decision. `Complete` stops the run and freezes the
    /// final elapsed values so the display keeps its last position.
    pub fn apply(&mut self, decision: &Decision) {
        match decision.transition {
            Transition::Stay => {}
            Transition::Advance {
                to_index,
                wrapped,
                phase_started_at_ms,
            } => {
                self.current_phase_index = to_index;
                if wrapped {
                    self.cycle_count += 1;
                }
                self.phase_started_at_ms = Some(phase_started_at_ms);
                self.last_announced_phase_label = None;
            }
            Transition::Complete => {
                self.running = false;
                self.completed = true;
                self.snapshot = Some(ElapsedSnapshot {
                    phase_elapsed_ms: decision.sample.phase_elapsed_ms,
                    session_elapsed_ms: decision.sample.session_elapsed_ms,
                });
            }
        }
        if let Some(entry) = &decision.enter {
            self.last_announced_phase_label = Some(entry.label.clone());
        }
    }
}
