//! Session clock.
//!
//! Converts monotonic millisecond samples into phase progress and session
//! time. Everything here is a pure function of `(state, config, now_ms)`;
//! where the time comes from is the caller's business.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::state::{ElapsedSnapshot, SessionConfig, SessionState};

/// Source of monotonic milliseconds.
pub trait MonotonicClock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for simulation and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualClock {
    now_ms: u64,
}

impl ManualClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self { now_ms }
    }

    /// Move to `now_ms`. Going backwards is allowed and models a clock rollback.
    pub fn set(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn advance(&mut self, delta_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
    }
}

impl MonotonicClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

/// Derived timing values for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSample {
    pub phase_elapsed_ms: u64,
    pub phase_duration_ms: u64,
    /// 0.0 ..= 1.0
    pub phase_progress: f64,
    pub phase_remaining_ms: u64,
    pub session_elapsed_ms: u64,
    /// `None` for unbounded sessions.
    pub session_remaining_ms: Option<u64>,
}

impl ClockSample {
    pub fn session_elapsed_seconds(&self) -> f64 {
        self.session_elapsed_ms as f64 / 1000.0
    }

    pub fn session_remaining_seconds(&self) -> Option<f64> {
        self.session_remaining_ms.map(|ms| ms as f64 / 1000.0)
    }
}

/// Sample the clock for the current phase.
///
/// Paused and completed sessions report their frozen snapshot. A clock that
/// reads earlier than an anchor yields zero elapsed time, never a negative.
pub fn sample(state: &SessionState, config: &SessionConfig, now_ms: u64) -> ClockSample {
    let phase_duration_ms = config
        .exercise
        .phase(state.current_phase_index)
        .duration_ms();

    let (phase_elapsed_ms, session_elapsed_ms) = match (
        state.snapshot,
        state.phase_started_at_ms,
        state.session_started_at_ms,
    ) {
        (Some(frozen), _, _) => (frozen.phase_elapsed_ms, frozen.session_elapsed_ms),
        (None, Some(phase_at), Some(session_at)) => (
            now_ms.saturating_sub(phase_at),
            now_ms.saturating_sub(session_at),
        ),
        _ => (0, 0),
    };

    let phase_progress = if phase_duration_ms == 0 {
        1.0
    } else {
        (phase_elapsed_ms as f64 / phase_duration_ms as f64).clamp(0.0, 1.0)
    };

    ClockSample {
        phase_elapsed_ms,
        phase_duration_ms,
        phase_progress,
        phase_remaining_ms: phase_duration_ms.saturating_sub(phase_elapsed_ms),
        session_elapsed_ms,
        session_remaining_ms: config
            .is_bounded()
            .then(|| config.total_ms().saturating_sub(session_elapsed_ms)),
    }
}

/// Freeze elapsed times at the moment of a pause.
pub fn pause_snapshot(
    state: &SessionState,
    config: &SessionConfig,
    now_ms: u64,
) -> ElapsedSnapshot {
    let s = sample(state, config, now_ms);
    ElapsedSnapshot {
        phase_elapsed_ms: s.phase_elapsed_ms,
        session_elapsed_ms: s.session_elapsed_ms,
    }
}

/// New `(phase_started_at_ms, session_started_at_ms)` anchors for a resume.
///
/// For a bounded session this is
/// `now - (total - paused_remaining_seconds) * 1000`, i.e. the anchor shifted
/// back by exactly the time already spent, so remaining time survives the
/// pause unchanged. Unbounded sessions use the same shift.
pub fn resume_anchors(snapshot: ElapsedSnapshot, now_ms: u64) -> (u64, u64) {
    (
        now_ms.saturating_sub(snapshot.phase_elapsed_ms),
        now_ms.saturating_sub(snapshot.session_elapsed_ms),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn calm(total: u64) -> SessionConfig {
        SessionConfig::new(Catalog::builtin().get("calm").unwrap(), total)
    }

    fn running_from(t: u64) -> SessionState {
        SessionState {
            running: true,
            phase_started_at_ms: Some(t),
            session_started_at_ms: Some(t),
            ..SessionState::idle()
        }
    }

    #[test]
    fn progress_and_remaining() {
        let s = sample(&running_from(1_000), &calm(180), 3_000);
        assert_eq!(s.phase_elapsed_ms, 2_000);
        assert!((s.phase_progress - 0.5).abs() < 1e-9);
        assert_eq!(s.phase_remaining_ms, 2_000);
        assert_eq!(s.session_remaining_ms, Some(178_000));
    }

    #[test]
    fn clock_rollback_clamps_to_zero() {
        let s = sample(&running_from(5_000), &calm(0), 1_000);
        assert_eq!(s.phase_elapsed_ms, 0);
        assert_eq!(s.phase_progress, 0.0);
        assert_eq!(s.session_remaining_ms, None);
    }

    #[test]
    fn huge_gap_clamps_progress_to_one() {
        let s = sample(&running_from(0), &calm(0), 10_000_000);
        assert_eq!(s.phase_progress, 1.0);
        assert_eq!(s.phase_remaining_ms, 0);
    }

    #[test]
    fn resume_preserves_remaining_time() {
        let config = calm(180);
        let mut state = running_from(0);
        let before = sample(&state, &config, 2_500);
        let snap = pause_snapshot(&state, &config, 2_500);

        let (phase_at, session_at) = resume_anchors(snap, 60_000);
        state.phase_started_at_ms = Some(phase_at);
        state.session_started_at_ms = Some(session_at);
        let after = sample(&state, &config, 60_000);

        assert_eq!(after.phase_remaining_ms, 1_500);
        assert_eq!(after.session_remaining_ms, before.session_remaining_ms);
    }

    #[test]
    fn manual_clock_moves_both_ways() {
        let mut clock = ManualClock::starting_at(100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(20);
        assert_eq!(clock.now_ms(), 20);
    }
}
