//! Lifecycle controller.
//!
//! Owns the [`SessionState`] and is the only thing that mutates it. Every
//! operation takes the current monotonic time explicitly; the host decides
//! where time comes from and when armed ticks fire.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> Completed
//!   ^________________ reset (from any state) ________|
//! ```
//!
//! ## Driving
//!
//! After each evaluation the controller arms exactly one tick, using the
//! backend for the current visibility. The host waits until `due_at_ms` and
//! calls [`SessionController::fire`] with the tick's token. `pause`, `reset`
//! and completion drop the armed tick, so a callback that was already queued
//! carries a stale token and is ignored.
//!
//! ```ignore
//! let mut controller = SessionController::new(catalog, settings, prefs, collaborators);
//! controller.start(clock.now_ms());
//! while let Some(tick) = controller.pending() {
//!     sleep_until(tick.due_at_ms);
//!     controller.fire(tick.token, clock.now_ms());
//! }
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::catalog::{Catalog, ExerciseDefinition};
use crate::collaborators::Collaborators;
use crate::display;
use crate::error::{CatalogError, CollaboratorError};
use crate::events::Event;
use crate::storage::preferences::{
    PreferenceStore, Preferences, DURATION_KEY, EXERCISE_KEY, SOUND_KEY,
};
use crate::timer::{
    clock, scheduler, ArmedTick, ClockSample, Decision, DriveBackend, DriveMode, FramePoll,
    OneShotTimer, ScaleRange, SessionConfig, SessionState, SessionStatus, TickToken, Transition,
};

/// What happens to the wake lock when a session is paused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeLockPolicy {
    /// Keep holding it, so resuming doesn't need a fresh acquire.
    #[default]
    Retain,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Foreground,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineSettings {
    pub scale: ScaleRange,
    pub fine: FramePoll,
    pub coarse: OneShotTimer,
    pub wake_lock_on_pause: WakeLockPolicy,
}

pub struct SessionController {
    catalog: Catalog,
    settings: EngineSettings,
    session: SessionConfig,
    state: SessionState,
    visibility: Visibility,
    pending: Option<ArmedTick>,
    next_token: u64,
    wake_lock_held: bool,
    sound_enabled: bool,
    prefs: Box<dyn PreferenceStore>,
    collaborators: Collaborators,
}

impl SessionController {
    /// Build a controller from stored preferences.
    ///
    /// Missing or invalid preferences fall back to defaults; this never fails.
    pub fn new(
        catalog: Catalog,
        settings: EngineSettings,
        prefs: Box<dyn PreferenceStore>,
        mut collaborators: Collaborators,
    ) -> Self {
        let stored = Preferences::load(prefs.as_ref(), &catalog);
        let exercise = catalog
            .get(&stored.exercise_id)
            .unwrap_or_else(|_| catalog.default_exercise());
        collaborators.cues.set_enabled(stored.sound_enabled);

        let mut controller = Self {
            catalog,
            settings,
            session: SessionConfig::new(exercise, stored.total_duration_seconds),
            state: SessionState::idle(),
            visibility: Visibility::Foreground,
            pending: None,
            next_token: 0,
            wake_lock_held: false,
            sound_enabled: stored.sound_enabled,
            prefs,
            collaborators,
        };
        controller.render(0);
        controller
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn exercise(&self) -> &Arc<ExerciseDefinition> {
        &self.session.exercise
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn drive_mode(&self) -> DriveMode {
        self.backend().mode()
    }

    /// The armed tick, if the session is being driven.
    pub fn pending(&self) -> Option<ArmedTick> {
        self.pending
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn wake_lock_held(&self) -> bool {
        self.wake_lock_held
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            exercise_id: self.session.exercise.id().to_string(),
            total_duration_seconds: self.session.total_duration_seconds,
            sound_enabled: self.sound_enabled,
        }
    }

    pub fn sample(&self, now_ms: u64) -> ClockSample {
        clock::sample(&self.state, &self.session, now_ms)
    }

    /// Current shape scale.
    pub fn scale(&self, now_ms: u64) -> f64 {
        let sample = self.sample(now_ms);
        self.scale_for(&sample)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now_ms: u64) -> Event {
        let sample = self.sample(now_ms);
        let phase = self.session.exercise.phase(self.state.current_phase_index);
        Event::StateSnapshot {
            status: self.state.status(),
            exercise_id: self.session.exercise.id().to_string(),
            phase_index: self.state.current_phase_index,
            phase_label: phase.label().to_string(),
            phase_progress: sample.phase_progress,
            phase_remaining_ms: sample.phase_remaining_ms,
            scale: self.scale_for(&sample),
            cycle_count: self.state.cycle_count,
            session_elapsed_ms: sample.session_elapsed_ms,
            session_remaining_ms: sample.session_remaining_ms,
            drive_mode: self.drive_mode(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a fresh session, or resume a paused one with its remaining
    /// time intact. Starting a completed session starts over.
    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        if self.state.running {
            return Vec::new();
        }
        self.cancel();
        if self.state.completed {
            self.state = SessionState::idle();
        }

        let mut events = Vec::new();
        match self.state.snapshot.take() {
            Some(snapshot) => {
                let (phase_at, session_at) = clock::resume_anchors(snapshot, now_ms);
                self.state.phase_started_at_ms = Some(phase_at);
                self.state.session_started_at_ms = Some(session_at);
                self.state.running = true;

                let sample = self.sample(now_ms);
                info!(
                    exercise = %self.session.exercise.id(),
                    phase_remaining_ms = sample.phase_remaining_ms,
                    "session resumed"
                );
                events.push(Event::SessionResumed {
                    phase_remaining_ms: sample.phase_remaining_ms,
                    session_remaining_ms: sample.session_remaining_ms,
                    at: Utc::now(),
                });
            }
            None => {
                self.state = SessionState {
                    running: true,
                    phase_started_at_ms: Some(now_ms),
                    session_started_at_ms: Some(now_ms),
                    ..SessionState::idle()
                };
                info!(
                    exercise = %self.session.exercise.id(),
                    total_secs = self.session.total_duration_seconds,
                    "session started"
                );
                events.push(Event::SessionStarted {
                    exercise_id: self.session.exercise.id().to_string(),
                    total_duration_seconds: self.session.total_duration_seconds,
                    at: Utc::now(),
                });
            }
        }

        self.acquire_wake_lock();
        best_effort("cue warm-up", self.collaborators.cues.warm_up());
        events.extend(self.evaluate(now_ms));
        events
    }

    /// Freeze the session. Phase index and cycle count are kept.
    pub fn pause(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.state.running {
            return Vec::new();
        }
        self.cancel();

        let snapshot = clock::pause_snapshot(&self.state, &self.session, now_ms);
        self.state.running = false;
        self.state.snapshot = Some(snapshot);

        best_effort("cue silence", self.collaborators.cues.silence());
        if self.settings.wake_lock_on_pause == WakeLockPolicy::Release {
            self.release_wake_lock();
        }
        self.render(now_ms);

        let sample = self.sample(now_ms);
        info!(
            phase_remaining_ms = sample.phase_remaining_ms,
            "session paused"
        );
        vec![Event::SessionPaused {
            phase_remaining_ms: sample.phase_remaining_ms,
            session_remaining_ms: sample.session_remaining_ms,
            at: Utc::now(),
        }]
    }

    /// Stop and return to idle from any state.
    pub fn reset(&mut self, now_ms: u64) -> Vec<Event> {
        self.cancel();

        let elapsed_ms = if self.state.session_started_at_ms.is_some() {
            self.sample(now_ms).session_elapsed_ms
        } else {
            0
        };
        let cycle_count = self.state.cycle_count;
        self.state = SessionState::idle();

        best_effort("cue silence", self.collaborators.cues.silence());
        self.release_wake_lock();
        self.render(now_ms);

        info!(cycle_count, elapsed_ms, "session reset");
        vec![Event::SessionReset {
            exercise_id: self.session.exercise.id().to_string(),
            cycle_count,
            elapsed_ms,
            at: Utc::now(),
        }]
    }

    /// Run the armed tick. Ticks whose token does not match the armed one
    /// were cancelled and are ignored.
    pub fn fire(&mut self, token: TickToken, now_ms: u64) -> Vec<Event> {
        match self.pending {
            Some(armed) if armed.token == token => {}
            _ => {
                trace!(token = token.0, "ignoring stale tick");
                return Vec::new();
            }
        }
        self.pending = None;
        if !self.state.running {
            return Vec::new();
        }
        self.evaluate(now_ms)
    }

    /// Evaluate now, outside the armed schedule, and re-arm.
    pub fn poll(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.state.running {
            self.render(now_ms);
            return Vec::new();
        }
        self.cancel();
        self.evaluate(now_ms)
    }

    /// Switch between fine (foreground) and coarse (background) driving.
    ///
    /// The session state is untouched; a running session is evaluated at
    /// `now_ms` so overdue transitions land before the new backend arms.
    pub fn set_visibility(&mut self, visibility: Visibility, now_ms: u64) -> Vec<Event> {
        if self.visibility == visibility {
            return Vec::new();
        }
        self.visibility = visibility;
        let mode = self.drive_mode();
        debug!(?mode, "drive mode changed");

        let mut events = vec![Event::DriveModeChanged {
            mode,
            at: Utc::now(),
        }];
        if self.state.running {
            self.cancel();
            events.extend(self.evaluate(now_ms));
        } else if visibility == Visibility::Foreground {
            self.render(now_ms);
        }
        events
    }

    /// Choose another exercise. An active session is reset first.
    ///
    /// # Errors
    /// Returns `UnknownExercise` if the id is not in the catalog.
    pub fn select_exercise(&mut self, id: &str, now_ms: u64) -> Result<Vec<Event>, CatalogError> {
        let exercise = self.catalog.get(id)?;
        let mut events = Vec::new();
        if self.state.status() != SessionStatus::Idle {
            events.extend(self.reset(now_ms));
        }
        self.session.exercise = exercise;
        self.persist(EXERCISE_KEY, id);
        self.render(now_ms);
        info!(exercise = %id, "exercise selected");
        Ok(events)
    }

    /// Change the session length; `0` makes it unbounded. A running session
    /// is re-evaluated and may complete immediately.
    pub fn set_total_duration(&mut self, seconds: u64, now_ms: u64) -> Vec<Event> {
        self.session.total_duration_seconds = seconds;
        self.persist(DURATION_KEY, &seconds.to_string());
        if self.state.running {
            self.cancel();
            return self.evaluate(now_ms);
        }
        self.render(now_ms);
        Vec::new()
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        self.collaborators.cues.set_enabled(enabled);
        if !enabled {
            best_effort("cue silence", self.collaborators.cues.silence());
        }
        self.persist(SOUND_KEY, &enabled.to_string());
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn backend(&self) -> &dyn DriveBackend {
        match self.visibility {
            Visibility::Foreground => &self.settings.fine,
            Visibility::Background => &self.settings.coarse,
        }
    }

    /// One scheduler step: apply at most one transition, announce, render,
    /// re-arm.
    fn evaluate(&mut self, now_ms: u64) -> Vec<Event> {
        let decision = scheduler::evaluate(&self.state, &self.session, now_ms);
        if decision.transition == Transition::Complete {
            return self.complete(&decision, now_ms);
        }

        let mut events = Vec::new();
        self.state.apply(&decision);

        if let Transition::Advance { wrapped: true, .. } = decision.transition {
            debug!(cycle_count = self.state.cycle_count, "cycle completed");
            events.push(Event::CycleCompleted {
                cycle_count: self.state.cycle_count,
                at: Utc::now(),
            });
        }

        if let Some(entry) = decision.enter {
            debug!(phase = %entry.label, index = entry.index, "phase entered");
            best_effort(
                "phase cue",
                self.collaborators
                    .cues
                    .on_phase_enter(&entry.label, entry.duration_ms, entry.cue),
            );
            events.push(Event::PhaseEntered {
                phase_index: entry.index,
                label: entry.label,
                duration_ms: entry.duration_ms,
                cue: entry.cue,
                cycle_count: self.state.cycle_count,
                at: Utc::now(),
            });
        }

        self.render(now_ms);
        self.arm(now_ms);
        events
    }

    fn complete(&mut self, decision: &Decision, now_ms: u64) -> Vec<Event> {
        self.cancel();
        self.state.apply(decision);

        best_effort("completion cue", self.collaborators.cues.on_complete());
        self.release_wake_lock();
        self.render(now_ms);

        info!(
            exercise = %self.session.exercise.id(),
            cycle_count = self.state.cycle_count,
            "session completed"
        );
        vec![Event::SessionCompleted {
            exercise_id: self.session.exercise.id().to_string(),
            cycle_count: self.state.cycle_count,
            elapsed_ms: decision.sample.session_elapsed_ms,
            at: Utc::now(),
        }]
    }

    fn arm(&mut self, now_ms: u64) {
        let sample = self.sample(now_ms);
        let backend = self.backend();
        let delay = backend.next_delay_ms(&sample);
        let mode = backend.mode();
        self.next_token += 1;
        self.pending = Some(ArmedTick {
            token: TickToken(self.next_token),
            due_at_ms: now_ms.saturating_add(delay),
            mode,
        });
    }

    fn cancel(&mut self) {
        if let Some(armed) = self.pending.take() {
            trace!(token = armed.token.0, "cancelled pending tick");
        }
    }

    fn acquire_wake_lock(&mut self) {
        if !self.wake_lock_held {
            self.wake_lock_held =
                best_effort("wake lock acquire", self.collaborators.wake_lock.acquire());
        }
    }

    fn release_wake_lock(&mut self) {
        if self.wake_lock_held {
            best_effort("wake lock release", self.collaborators.wake_lock.release());
            self.wake_lock_held = false;
        }
    }

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.prefs.set(key, value) {
            warn!(key, error = %e, "failed to save preference");
        }
    }

    fn scale_for(&self, sample: &ClockSample) -> f64 {
        match self.state.status() {
            SessionStatus::Running | SessionStatus::Paused => {
                let phase = self.session.exercise.phase(self.state.current_phase_index);
                self.settings.scale.scale_for(phase.motion(), sample.phase_progress)
            }
            SessionStatus::Idle | SessionStatus::Completed => self.settings.scale.min,
        }
    }

    fn render(&mut self, now_ms: u64) {
        let sample = self.sample(now_ms);
        let status = self.state.status();
        let scale = self.scale_for(&sample);
        let label = self.session.exercise.phase(self.state.current_phase_index).label();
        let instruction = display::instruction_text(status, label);
        let countdown = match status {
            SessionStatus::Running | SessionStatus::Paused => {
                display::countdown_text(sample.phase_remaining_ms)
            }
            SessionStatus::Idle | SessionStatus::Completed => String::new(),
        };
        let remaining = display::session_remaining_text(sample.session_remaining_ms);

        let render = &mut self.collaborators.render;
        render.set_scale(scale);
        render.set_instruction_text(&instruction);
        render.set_phase_countdown_text(&countdown);
        render.set_session_remaining_text(&remaining);
        render.set_cycle_count_text(self.state.cycle_count);
        render.flush();
    }
}

/// Log a collaborator failure and report whether the call succeeded.
fn best_effort(what: &str, result: Result<(), CollaboratorError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "{what} failed; continuing without it");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CueDispatcher, RenderTarget, WakeLock};
    use crate::cue::CueKind;
    use crate::storage::preferences::MemoryPreferences;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        cues: Vec<String>,
        wake: Vec<&'static str>,
        instructions: Vec<String>,
    }

    struct Cues(Rc<RefCell<Log>>, bool);

    impl CueDispatcher for Cues {
        fn on_phase_enter(
            &mut self,
            label: &str,
            _: u64,
            _: CueKind,
        ) -> Result<(), CollaboratorError> {
            self.0.borrow_mut().cues.push(label.to_string());
            if self.1 {
                return Err(CollaboratorError::Unavailable {
                    collaborator: "audio",
                    message: "locked".into(),
                });
            }
            Ok(())
        }

        fn on_complete(&mut self) -> Result<(), CollaboratorError> {
            self.0.borrow_mut().cues.push("complete".into());
            Ok(())
        }

        fn set_enabled(&mut self, _enabled: bool) {}
    }

    struct Wake(Rc<RefCell<Log>>);

    impl WakeLock for Wake {
        fn acquire(&mut self) -> Result<(), CollaboratorError> {
            self.0.borrow_mut().wake.push("acquire");
            Ok(())
        }

        fn release(&mut self) -> Result<(), CollaboratorError> {
            self.0.borrow_mut().wake.push("release");
            Ok(())
        }
    }

    struct Screen(Rc<RefCell<Log>>);

    impl RenderTarget for Screen {
        fn set_scale(&mut self, _: f64) {}
        fn set_instruction_text(&mut self, text: &str) {
            self.0.borrow_mut().instructions.push(text.to_string());
        }
        fn set_phase_countdown_text(&mut self, _: &str) {}
        fn set_session_remaining_text(&mut self, _: &str) {}
        fn set_cycle_count_text(&mut self, _: u64) {}
    }

    fn controller(
        exercise: &str,
        total: u64,
        policy: WakeLockPolicy,
        failing_cues: bool,
    ) -> (SessionController, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut prefs = MemoryPreferences::new();
        Preferences {
            exercise_id: exercise.into(),
            total_duration_seconds: total,
            sound_enabled: true,
        }
        .save(&mut prefs)
        .unwrap();
        let settings = EngineSettings {
            wake_lock_on_pause: policy,
            ..EngineSettings::default()
        };
        let collaborators = Collaborators::new(
            Box::new(Cues(log.clone(), failing_cues)),
            Box::new(Wake(log.clone())),
            Box::new(Screen(log.clone())),
        );
        let c =
            SessionController::new(Catalog::builtin(), settings, Box::new(prefs), collaborators);
        (c, log)
    }

    #[test]
    fn start_announces_first_phase_and_arms_a_frame() {
        let (mut c, log) = controller("calm", 0, WakeLockPolicy::Retain, false);
        let events = c.start(1_000);
        assert!(matches!(events[0], Event::SessionStarted { .. }));
        assert!(matches!(events[1], Event::PhaseEntered { phase_index: 0, .. }));
        let tick = c.pending().unwrap();
        assert_eq!(tick.due_at_ms, 1_016);
        assert_eq!(tick.mode, DriveMode::Fine);
        assert_eq!(log.borrow().cues, ["Inhale"]);
        assert_eq!(log.borrow().wake, ["acquire"]);
        assert!(c.wake_lock_held());
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let (mut c, _) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.start(0);
        assert!(c.start(500).is_empty());
    }

    #[test]
    fn stale_token_is_ignored_after_reset() {
        let (mut c, log) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.set_visibility(Visibility::Background, 0);
        c.start(0);
        let stale = c.pending().unwrap();
        assert_eq!(stale.due_at_ms, 4_000);

        c.reset(1_000);
        assert!(c.pending().is_none());
        assert!(c.fire(stale.token, 4_000).is_empty());
        assert_eq!(c.status(), SessionStatus::Idle);
        assert_eq!(log.borrow().cues, ["Inhale"]);
    }

    #[test]
    fn pause_keeps_position_and_resume_restores_remaining() {
        let (mut c, _) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.start(0);
        let events = c.pause(2_500);
        assert!(matches!(
            events[0],
            Event::SessionPaused {
                phase_remaining_ms: 1_500,
                ..
            }
        ));
        assert!(c.pending().is_none());
        assert_eq!(c.status(), SessionStatus::Paused);

        let events = c.start(30_000);
        assert!(matches!(
            events[0],
            Event::SessionResumed {
                phase_remaining_ms: 1_500,
                ..
            }
        ));
        // Same phase, already announced: no second cue.
        assert_eq!(events.len(), 1);
        assert_eq!(c.sample(30_000).phase_remaining_ms, 1_500);
        assert_eq!(c.sample(31_500).phase_progress, 1.0);
    }

    #[test]
    fn wake_lock_policy_on_pause() {
        let (mut retain, log) = controller("calm", 0, WakeLockPolicy::Retain, false);
        retain.start(0);
        retain.pause(100);
        retain.start(200);
        assert_eq!(log.borrow().wake, ["acquire"]);

        let (mut release, log) = controller("calm", 0, WakeLockPolicy::Release, false);
        release.start(0);
        release.pause(100);
        release.start(200);
        assert_eq!(log.borrow().wake, ["acquire", "release", "acquire"]);
    }

    #[test]
    fn failing_cues_do_not_disturb_timing() {
        let (mut c, log) = controller("calm", 0, WakeLockPolicy::Retain, true);
        c.start(0);
        c.poll(4_000);
        c.poll(10_000);
        assert_eq!(c.state().cycle_count, 1);
        assert_eq!(c.state().current_phase_index, 0);
        assert_eq!(log.borrow().cues, ["Inhale", "Exhale", "Inhale"]);
    }

    #[test]
    fn completion_releases_wake_lock_and_shows_message() {
        let (mut c, log) = controller("calm", 10, WakeLockPolicy::Retain, false);
        c.start(0);
        c.poll(4_000);
        let events = c.poll(10_000);
        assert!(matches!(
            events[..],
            [Event::SessionCompleted {
                cycle_count: 0,
                elapsed_ms: 10_000,
                ..
            }]
        ));
        assert_eq!(c.status(), SessionStatus::Completed);
        assert!(c.pending().is_none());
        assert_eq!(log.borrow().wake, ["acquire", "release"]);
        assert_eq!(log.borrow().cues.last().map(String::as_str), Some("complete"));
        assert_eq!(
            log.borrow().instructions.last().map(String::as_str),
            Some(display::COMPLETE_TEXT)
        );
        // Display keeps the final position.
        assert_eq!(c.state().current_phase_index, 1);
    }

    #[test]
    fn long_gap_enters_only_the_next_phase() {
        let (mut c, log) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.start(0);
        // No callbacks for ten minutes.
        c.poll(600_000);
        while let Some(tick) = c.pending() {
            if tick.due_at_ms > 602_000 {
                break;
            }
            c.fire(tick.token, tick.due_at_ms);
        }
        assert_eq!(log.borrow().cues, ["Inhale", "Exhale"]);
        assert_eq!(c.state().current_phase_index, 1);
        assert_eq!(c.state().cycle_count, 0);
        assert_eq!(c.sample(602_000).phase_remaining_ms, 4_000);
    }

    #[test]
    fn restart_after_completion_begins_fresh() {
        let (mut c, _) = controller("calm", 10, WakeLockPolicy::Retain, false);
        c.start(0);
        c.poll(10_000);
        let events = c.start(20_000);
        assert!(matches!(events[0], Event::SessionStarted { .. }));
        assert_eq!(c.state().current_phase_index, 0);
        assert_eq!(c.state().cycle_count, 0);
    }

    #[test]
    fn reset_zeroes_state_and_reports_elapsed() {
        let (mut c, log) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.start(0);
        c.poll(4_000);
        c.poll(10_000);
        let events = c.reset(12_000);
        assert!(matches!(
            events[..],
            [Event::SessionReset {
                cycle_count: 1,
                elapsed_ms: 12_000,
                ..
            }]
        ));
        assert_eq!(*c.state(), SessionState::idle());
        assert_eq!(
            log.borrow().instructions.last().map(String::as_str),
            Some(display::READY_TEXT)
        );
    }

    #[test]
    fn background_arms_until_phase_end() {
        let (mut c, _) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.start(0);
        let events = c.set_visibility(Visibility::Background, 1_000);
        assert!(matches!(
            events[0],
            Event::DriveModeChanged {
                mode: DriveMode::Coarse,
                ..
            }
        ));
        let tick = c.pending().unwrap();
        assert_eq!(tick.due_at_ms, 4_000);
        assert_eq!(tick.mode, DriveMode::Coarse);

        c.fire(tick.token, 4_000);
        assert_eq!(c.state().current_phase_index, 1);
        assert_eq!(c.pending().unwrap().due_at_ms, 10_000);

        c.set_visibility(Visibility::Foreground, 5_000);
        assert_eq!(c.pending().unwrap().due_at_ms, 5_016);
        assert!(c.set_visibility(Visibility::Foreground, 5_001).is_empty());
    }

    #[test]
    fn selecting_exercise_resets_and_persists() {
        let (mut c, _) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.start(0);
        let events = c.select_exercise("box", 1_000).unwrap();
        assert!(matches!(events[..], [Event::SessionReset { .. }]));
        assert_eq!(c.exercise().id(), "box");
        assert_eq!(c.preferences().exercise_id, "box");
        assert!(c.select_exercise("nope", 1_000).is_err());
        assert_eq!(c.exercise().id(), "box");
    }

    #[test]
    fn shortening_duration_completes_running_session() {
        let (mut c, _) = controller("calm", 0, WakeLockPolicy::Retain, false);
        c.start(0);
        let events = c.set_total_duration(5, 6_000);
        assert!(matches!(events[..], [Event::SessionCompleted { .. }]));
        assert_eq!(c.preferences().total_duration_seconds, 5);
    }
}
