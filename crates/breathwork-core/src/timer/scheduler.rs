//! Phase scheduler.
//!
//! A pure transition function over [`SessionState`]. Each evaluation runs two
//! checks, in this order:
//!
//! 1. session completion, which wins even if the phase also ended this tick;
//! 2. phase advance, wrapping to phase 0 and counting a cycle on overflow.
//!
//! At most one transition is proposed per evaluation. A slightly late
//! evaluation anchors the new phase at the instant the old one ended, so
//! frequent and infrequent evaluation produce the same phase sequence. When
//! the overshoot already covers the whole next phase (a suspended host, a
//! long gap between callbacks), the old phase is simply treated as complete
//! and the next one starts at `now`; missed phases are not replayed.

use serde::{Deserialize, Serialize};

use super::clock::{self, ClockSample};
use super::state::{SessionConfig, SessionState};
use crate::cue::CueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Stay,
    Advance {
        to_index: usize,
        /// The index wrapped from the last phase back to 0.
        wrapped: bool,
        phase_started_at_ms: u64,
    },
    Complete,
}

/// A phase entry to announce to cue dispatchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub index: usize,
    pub label: String,
    pub duration_ms: u64,
    pub cue: CueKind,
}

/// What one evaluation proposes. Applied by [`SessionState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Clock sample taken before the transition.
    pub sample: ClockSample,
    pub transition: Transition,
    pub enter: Option<PhaseEntry>,
}

/// Evaluate the state machine at `now_ms`.
pub fn evaluate(state: &SessionState, config: &SessionConfig, now_ms: u64) -> Decision {
    let sample = clock::sample(state, config, now_ms);

    if !state.running {
        return Decision {
            sample,
            transition: Transition::Stay,
            enter: None,
        };
    }

    if config.is_bounded() && sample.session_elapsed_ms >= config.total_ms() {
        return Decision {
            sample,
            transition: Transition::Complete,
            enter: None,
        };
    }

    let exercise = &config.exercise;
    if sample.phase_progress >= 1.0 {
        let next = state.current_phase_index + 1;
        let wrapped = next >= exercise.len();
        let to_index = if wrapped { 0 } else { next };
        let phase = exercise.phase(to_index);
        let phase_started_at_ms = state
            .phase_started_at_ms
            .map(|at| at.saturating_add(sample.phase_duration_ms))
            .filter(|ended_at| now_ms.saturating_sub(*ended_at) < phase.duration_ms())
            .map_or(now_ms, |ended_at| ended_at.min(now_ms));

        // The label was cleared by the advance, so the new phase always announces.
        return Decision {
            sample,
            transition: Transition::Advance {
                to_index,
                wrapped,
                phase_started_at_ms,
            },
            enter: Some(PhaseEntry {
                index: to_index,
                label: phase.label().to_string(),
                duration_ms: phase.duration_ms(),
                cue: phase.cue(),
            }),
        };
    }

    let phase = exercise.phase(state.current_phase_index);
    let enter = (state.last_announced_phase_label.as_deref() != Some(phase.label())).then(|| {
        PhaseEntry {
            index: state.current_phase_index,
            label: phase.label().to_string(),
            duration_ms: phase.duration_ms(),
            cue: phase.cue(),
        }
    });

    Decision {
        sample,
        transition: Transition::Stay,
        enter,
    }
}
