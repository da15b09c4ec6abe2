//! Text shown next to the breathing shape.

use crate::timer::SessionStatus;

pub const READY_TEXT: &str = "Ready";
pub const PAUSED_TEXT: &str = "Paused";
pub const COMPLETE_TEXT: &str = "Session complete";
pub const UNBOUNDED_TEXT: &str = "∞";

/// Whole seconds left, rounded up so "0" only shows at the boundary.
pub fn countdown_text(remaining_ms: u64) -> String {
    remaining_ms.div_ceil(1000).to_string()
}

/// `m:ss`, or `∞` for an unbounded session.
pub fn session_remaining_text(remaining_ms: Option<u64>) -> String {
    match remaining_ms {
        Some(ms) => {
            let secs = ms.div_ceil(1000);
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => UNBOUNDED_TEXT.to_string(),
    }
}

/// Instruction line for the current status and phase label.
pub fn instruction_text(status: SessionStatus, label: &str) -> String {
    match status {
        SessionStatus::Idle => READY_TEXT.to_string(),
        SessionStatus::Paused => PAUSED_TEXT.to_string(),
        SessionStatus::Completed => COMPLETE_TEXT.to_string(),
        SessionStatus::Running => capitalize(label),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_rounds_up() {
        assert_eq!(countdown_text(4_000), "4");
        assert_eq!(countdown_text(3_001), "4");
        assert_eq!(countdown_text(1), "1");
        assert_eq!(countdown_text(0), "0");
    }

    #[test]
    fn session_remaining_formats_minutes() {
        assert_eq!(session_remaining_text(Some(180_000)), "3:00");
        assert_eq!(session_remaining_text(Some(179_001)), "3:00");
        assert_eq!(session_remaining_text(Some(65_000)), "1:05");
        assert_eq!(session_remaining_text(Some(0)), "0:00");
        assert_eq!(session_remaining_text(None), "∞");
    }

    #[test]
    fn instruction_follows_status() {
        assert_eq!(instruction_text(SessionStatus::Running, "inhale"), "Inhale");
        assert_eq!(instruction_text(SessionStatus::Paused, "inhale"), "Paused");
        assert_eq!(instruction_text(SessionStatus::Idle, "inhale"), "Ready");
        assert_eq!(
            instruction_text(SessionStatus::Completed, "exhale"),
            "Session complete"
        );
    }
}
