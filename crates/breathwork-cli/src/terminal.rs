//! Terminal collaborators for `breathwork run`.

use std::io::Write;

use breathwork_core::collaborators::{CueDispatcher, RenderTarget};
use breathwork_core::cue::COMPLETION_TONE;
use breathwork_core::{CollaboratorError, CueKind};

const BAR_WIDTH: usize = 30;
const BELL: &str = "\x07";

/// Rings the terminal bell. A terminal can't play tones, so the tone profile
/// only shows up in debug logs.
#[derive(Debug, Default)]
pub struct BellCues {
    muted: bool,
}

impl BellCues {
    pub fn new() -> Self {
        Self::default()
    }

    fn ring(&self, times: usize) -> Result<(), CollaboratorError> {
        if self.muted {
            return Ok(());
        }
        let mut err = std::io::stderr();
        err.write_all(BELL.repeat(times).as_bytes())
            .and_then(|()| err.flush())
            .map_err(|e| CollaboratorError::Unavailable {
                collaborator: "terminal bell",
                message: e.to_string(),
            })
    }
}

impl CueDispatcher for BellCues {
    fn on_phase_enter(
        &mut self,
        label: &str,
        duration_ms: u64,
        cue: CueKind,
    ) -> Result<(), CollaboratorError> {
        let tone = cue.tone();
        tracing::debug!(
            label,
            duration_ms,
            frequency_hz = tone.frequency_hz,
            length_ms = tone.length_ms,
            "cue"
        );
        self.ring(1)
    }

    fn on_complete(&mut self) -> Result<(), CollaboratorError> {
        tracing::debug!(frequency_hz = COMPLETION_TONE.frequency_hz, "completion cue");
        self.ring(2)
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.muted = !enabled;
    }
}

/// Draws a single status line, redrawn in place.
///
/// ```text
/// [##################            ] Inhale     3 | 2:45 left | 4 cycles
/// ```
#[derive(Debug, Default)]
pub struct TerminalRender {
    scale: f64,
    instruction: String,
    countdown: String,
    remaining: String,
    cycles: u64,
    last_line: String,
}

impl TerminalRender {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self) -> String {
        let scaled = (self.scale.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
        let filled = scaled.min(BAR_WIDTH);
        let bar = format!("{}{}", "#".repeat(filled), " ".repeat(BAR_WIDTH - filled));
        format!(
            "[{bar}] {:<16} {:>3} | {} left | {} cycles",
            self.instruction, self.countdown, self.remaining, self.cycles
        )
    }
}

impl RenderTarget for TerminalRender {
    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn set_instruction_text(&mut self, text: &str) {
        self.instruction = text.to_string();
    }

    fn set_phase_countdown_text(&mut self, text: &str) {
        self.countdown = text.to_string();
    }

    fn set_session_remaining_text(&mut self, text: &str) {
        self.remaining = text.to_string();
    }

    fn set_cycle_count_text(&mut self, cycles: u64) {
        self.cycles = cycles;
    }

    fn flush(&mut self) {
        let line = self.line();
        if line == self.last_line {
            return;
        }
        let mut out = std::io::stdout();
        // A closed stdout only loses the display.
        let _ = write!(out, "\r{line}\x1b[K").and_then(|()| out.flush());
        self.last_line = line;
    }
}

impl Drop for TerminalRender {
    fn drop(&mut self) {
        if !self.last_line.is_empty() {
            println!();
        }
    }
}
