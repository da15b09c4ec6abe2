//! Driving backends.
//!
//! Both backends feed the same scheduler; they only differ in when the next
//! evaluation is due. Frame polling re-evaluates every frame. The one-shot
//! timer sleeps until the current phase (or the session) ends.

use serde::{Deserialize, Serialize};

use super::clock::ClockSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveMode {
    /// Foreground: evaluated every animation frame.
    Fine,
    /// Background: one timer per phase boundary.
    Coarse,
}

/// Decides how long to wait before the next evaluation.
pub trait DriveBackend {
    fn mode(&self) -> DriveMode;

    /// Delay until the next evaluation, given the sample just taken.
    fn next_delay_ms(&self, sample: &ClockSample) -> u64;
}

/// Continuous polling at a fixed frame interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePoll {
    pub frame_interval_ms: u64,
}

impl Default for FramePoll {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
        }
    }
}

impl DriveBackend for FramePoll {
    fn mode(&self) -> DriveMode {
        DriveMode::Fine
    }

    fn next_delay_ms(&self, _sample: &ClockSample) -> u64 {
        self.frame_interval_ms.max(1)
    }
}

/// A single timer re-armed after every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneShotTimer {
    /// Floor for the delay, so an overdue phase doesn't spin.
    pub min_delay_ms: u64,
}

impl Default for OneShotTimer {
    fn default() -> Self {
        Self { min_delay_ms: 50 }
    }
}

impl DriveBackend for OneShotTimer {
    fn mode(&self) -> DriveMode {
        DriveMode::Coarse
    }

    fn next_delay_ms(&self, sample: &ClockSample) -> u64 {
        let until_boundary = match sample.session_remaining_ms {
            Some(session) => sample.phase_remaining_ms.min(session),
            None => sample.phase_remaining_ms,
        };
        until_boundary.max(self.min_delay_ms)
    }
}

/// Identifies one armed evaluation. A callback carrying any other token is
/// stale and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickToken(pub u64);

/// The single pending evaluation, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmedTick {
    pub token: TickToken,
    pub due_at_ms: u64,
    pub mode: DriveMode,
}
