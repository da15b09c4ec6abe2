//! Deterministic simulation harness for sessions.
//!
//! Drives a [`SessionController`] against a [`ManualClock`], firing each armed
//! tick exactly at its due time and flipping visibility on a plan. Used to
//! check that fine and coarse driving land on the same phase and cycle, and
//! by the `simulate` CLI command.

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::lifecycle::{SessionController, Visibility};
use crate::timer::{ManualClock, MonotonicClock, SessionState};

/// Seed for reproducible visibility plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationSeed(pub u64);

impl Default for SimulationSeed {
    fn default() -> Self {
        Self(42)
    }
}

/// Xorshift64* generator.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: SimulationSeed) -> Self {
        // Xorshift has a fixed point at zero.
        Self {
            state: seed.0.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Value in `[0, max)`; `0` when `max` is zero.
    pub fn next_below(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.next_u64() % max
    }
}

/// When the simulated host changes visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivePlan {
    pub start_in: Visibility,
    /// Offsets from session start at which visibility flips.
    pub toggle_at_ms: Vec<u64>,
}

impl DrivePlan {
    /// Foreground the whole time.
    pub fn fine() -> Self {
        Self {
            start_in: Visibility::Foreground,
            toggle_at_ms: Vec::new(),
        }
    }

    /// Background the whole time.
    pub fn coarse() -> Self {
        Self {
            start_in: Visibility::Background,
            toggle_at_ms: Vec::new(),
        }
    }

    /// Flip every `every_ms` until `until_ms`.
    pub fn alternating(every_ms: u64, until_ms: u64) -> Self {
        let every_ms = every_ms.max(1);
        Self {
            start_in: Visibility::Foreground,
            toggle_at_ms: (1..)
                .map(|k| k * every_ms)
                .take_while(|at| *at < until_ms)
                .collect(),
        }
    }

    /// `count` flips at seeded random offsets within `span_ms`.
    pub fn random(seed: SimulationSeed, count: usize, span_ms: u64) -> Self {
        let mut rng = DeterministicRng::new(seed);
        let start_in = if rng.next_below(2) == 0 {
            Visibility::Foreground
        } else {
            Visibility::Background
        };
        let mut toggle_at_ms: Vec<u64> = (0..count).map(|_| rng.next_below(span_ms)).collect();
        toggle_at_ms.sort_unstable();
        Self {
            start_in,
            toggle_at_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub events: Vec<Event>,
    /// Armed ticks that fired.
    pub ticks_fired: u64,
    pub final_state: SessionState,
    pub snapshot: Event,
}

/// Start a session at the clock's current time and drive it for
/// `duration_ms` of simulated time.
///
/// Ticks due exactly at the end are fired, and a last evaluation runs at the
/// end time so the final state reflects it.
pub fn run(
    controller: &mut SessionController,
    clock: &mut ManualClock,
    duration_ms: u64,
    plan: &DrivePlan,
) -> SimulationReport {
    let start_ms = clock.now_ms();
    let until_ms = start_ms.saturating_add(duration_ms);

    let mut toggles: Vec<u64> = plan
        .toggle_at_ms
        .iter()
        .map(|offset| start_ms.saturating_add(*offset))
        .filter(|at| *at <= until_ms)
        .collect();
    toggles.sort_unstable();
    let mut toggles = toggles.into_iter().peekable();

    let mut events = controller.set_visibility(plan.start_in, start_ms);
    events.extend(controller.start(start_ms));
    let mut ticks_fired = 0;

    loop {
        let tick = controller.pending().filter(|t| t.due_at_ms <= until_ms);
        let toggle = toggles.peek().copied();

        // Visibility changes win ties with ticks due at the same instant.
        if let Some(at) = toggle {
            if tick.map_or(true, |t| at <= t.due_at_ms) {
                toggles.next();
                clock.set(at);
                let flipped = match controller.visibility() {
                    Visibility::Foreground => Visibility::Background,
                    Visibility::Background => Visibility::Foreground,
                };
                events.extend(controller.set_visibility(flipped, at));
                continue;
            }
        }

        let Some(tick) = tick else { break };
        clock.set(tick.due_at_ms);
        events.extend(controller.fire(tick.token, tick.due_at_ms));
        ticks_fired += 1;
    }

    clock.set(until_ms);
    events.extend(controller.poll(until_ms));
    tracing::debug!(ticks_fired, events = events.len(), "simulation finished");

    SimulationReport {
        events,
        ticks_fired,
        final_state: controller.state().clone(),
        snapshot: controller.snapshot(until_ms),
    }
}
