//! Interfaces the controller drives but does not own the semantics of.
//!
//! Cue output and wake lock are best-effort: their errors are logged at the
//! call site and never reach the timing state machine. Render targets are
//! pure sinks and cannot fail.

use crate::cue::CueKind;
use crate::error::CollaboratorError;

/// Plays (or otherwise signals) phase and completion cues.
pub trait CueDispatcher {
    fn on_phase_enter(
        &mut self,
        label: &str,
        duration_ms: u64,
        cue: CueKind,
    ) -> Result<(), CollaboratorError>;

    fn on_complete(&mut self) -> Result<(), CollaboratorError>;

    fn set_enabled(&mut self, enabled: bool);

    /// Prepare the output device before the first cue.
    fn warm_up(&mut self) -> Result<(), CollaboratorError> {
        Ok(()) // default no-op
    }

    /// Cut any tone that is still sounding.
    fn silence(&mut self) -> Result<(), CollaboratorError> {
        Ok(()) // default no-op
    }
}

/// Keeps the screen (or machine) awake while a session runs.
pub trait WakeLock {
    fn acquire(&mut self) -> Result<(), CollaboratorError>;
    fn release(&mut self) -> Result<(), CollaboratorError>;
}

/// Output sinks written after every evaluation.
pub trait RenderTarget {
    fn set_scale(&mut self, scale: f64);
    fn set_instruction_text(&mut self, text: &str);
    fn set_phase_countdown_text(&mut self, text: &str);
    fn set_session_remaining_text(&mut self, text: &str);
    fn set_cycle_count_text(&mut self, cycles: u64);

    /// Called once after all setters of an update.
    fn flush(&mut self) {}
}

/// Cue dispatcher that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCues;

impl CueDispatcher for SilentCues {
    fn on_phase_enter(&mut self, _: &str, _: u64, _: CueKind) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn on_complete(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn set_enabled(&mut self, _enabled: bool) {}
}

/// Wake lock for hosts with no power management hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&mut self) -> Result<(), CollaboratorError> {
        tracing::debug!("wake lock not supported on this host; ignoring acquire");
        Ok(())
    }

    fn release(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Render target that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRender;

impl RenderTarget for NullRender {
    fn set_scale(&mut self, _: f64) {}
    fn set_instruction_text(&mut self, _: &str) {}
    fn set_phase_countdown_text(&mut self, _: &str) {}
    fn set_session_remaining_text(&mut self, _: &str) {}
    fn set_cycle_count_text(&mut self, _: u64) {}
}

/// The three collaborators a controller is built with.
pub struct Collaborators {
    pub cues: Box<dyn CueDispatcher>,
    pub wake_lock: Box<dyn WakeLock>,
    pub render: Box<dyn RenderTarget>,
}

impl Collaborators {
    pub fn new(
        cues: Box<dyn CueDispatcher>,
        wake_lock: Box<dyn WakeLock>,
        render: Box<dyn RenderTarget>,
    ) -> Self {
        Self {
            cues,
            wake_lock,
            render,
        }
    }

    /// No sound, no wake lock, no output.
    pub fn headless() -> Self {
        Self::new(
            Box::new(SilentCues),
            Box::new(NoopWakeLock),
            Box::new(NullRender),
        )
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::headless()
    }
}
