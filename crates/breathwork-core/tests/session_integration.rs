//! Integration tests for the session controller.
//!
//! These drive a full controller through the public API with a manual clock
//! and recording collaborators.

use std::cell::RefCell;
use std::rc::Rc;

use breathwork_core::collaborators::{Collaborators, CueDispatcher, NoopWakeLock, NullRender};
use breathwork_core::simulation::{self, DrivePlan};
use breathwork_core::storage::{Database, MemoryPreferences, Preferences, UnavailablePreferences};
use breathwork_core::timer::ease;
use breathwork_core::{
    Catalog, CollaboratorError, CueKind, EngineSettings, Event, ManualClock, MonotonicClock,
    SessionController, SessionStatus, Visibility,
};

#[derive(Default)]
struct Recorded {
    entered: Vec<(String, CueKind)>,
    completions: u32,
}

struct RecordingCues(Rc<RefCell<Recorded>>);

impl CueDispatcher for RecordingCues {
    fn on_phase_enter(
        &mut self,
        label: &str,
        _: u64,
        cue: CueKind,
    ) -> Result<(), CollaboratorError> {
        self.0.borrow_mut().entered.push((label.to_string(), cue));
        Ok(())
    }

    fn on_complete(&mut self) -> Result<(), CollaboratorError> {
        self.0.borrow_mut().completions += 1;
        Ok(())
    }

    fn set_enabled(&mut self, _enabled: bool) {}
}

fn recording_controller(exercise: &str, total: u64) -> (SessionController, Rc<RefCell<Recorded>>) {
    let recorded = Rc::new(RefCell::new(Recorded::default()));
    let mut prefs = MemoryPreferences::new();
    Preferences {
        exercise_id: exercise.to_string(),
        total_duration_seconds: total,
        sound_enabled: true,
    }
    .save(&mut prefs)
    .unwrap();
    let controller = SessionController::new(
        Catalog::builtin(),
        EngineSettings::default(),
        Box::new(prefs),
        Collaborators::new(
            Box::new(RecordingCues(recorded.clone())),
            Box::new(NoopWakeLock),
            Box::new(NullRender),
        ),
    );
    (controller, recorded)
}

/// Fire armed ticks until `until_ms`, advancing the clock to each due time.
fn drive_until(
    controller: &mut SessionController,
    clock: &mut ManualClock,
    until_ms: u64,
) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(tick) = controller.pending() {
        if tick.due_at_ms > until_ms {
            break;
        }
        clock.set(tick.due_at_ms);
        events.extend(controller.fire(tick.token, tick.due_at_ms));
    }
    clock.set(until_ms);
    events
}

#[test]
fn test_ease_fixed_points() {
    assert_eq!(ease(0.0), 0.0);
    assert!((ease(0.5) - 0.5).abs() < 1e-12);
    assert!((ease(1.0) - 1.0).abs() < 1e-12);
}

#[test]
fn test_two_phase_cycle_after_ten_seconds() {
    let (mut controller, _) = recording_controller("calm", 0);
    let mut clock = ManualClock::default();
    controller.start(clock.now_ms());
    drive_until(&mut controller, &mut clock, 10_000);

    assert_eq!(controller.state().cycle_count, 1);
    assert_eq!(controller.state().current_phase_index, 0);
}

#[test]
fn test_pause_resume_keeps_remaining_phase_time() {
    let (mut controller, recorded) = recording_controller("calm", 0);
    let mut clock = ManualClock::default();
    controller.start(0);
    drive_until(&mut controller, &mut clock, 2_500);
    controller.pause(2_500);
    assert_eq!(controller.status(), SessionStatus::Paused);

    // A long time passes while paused.
    clock.set(600_000);
    controller.start(clock.now_ms());
    assert_eq!(controller.sample(600_000).phase_remaining_ms, 1_500);

    drive_until(&mut controller, &mut clock, 601_600);
    assert_eq!(controller.state().current_phase_index, 1);
    let labels: Vec<_> = recorded.borrow().entered.iter().map(|(l, _)| l.clone()).collect();
    assert_eq!(labels, ["Inhale", "Exhale"]);
}

#[test]
fn test_completion_wins_over_coinciding_boundary() {
    let (mut controller, recorded) = recording_controller("calm", 180);
    let mut clock = ManualClock::default();
    controller.start(0);
    let events = drive_until(&mut controller, &mut clock, 200_000);

    let completions = events
        .iter()
        .filter(|e| matches!(e, Event::SessionCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
    assert_eq!(recorded.borrow().completions, 1);
    assert_eq!(controller.status(), SessionStatus::Completed);
    // 180s is exactly 18 cycles; the 18th wrap never happens.
    assert_eq!(controller.state().cycle_count, 17);
    assert_eq!(controller.state().current_phase_index, 1);
    assert!(controller.pending().is_none());

    // Further polling changes nothing.
    assert!(controller.poll(250_000).is_empty());
    assert_eq!(recorded.borrow().completions, 1);
}

#[test]
fn test_phase_cue_fires_once_per_entry() {
    let (mut controller, recorded) = recording_controller("box", 0);
    controller.start(0);
    for t in 1..=1000 {
        controller.poll(t * 3);
    }
    assert_eq!(recorded.borrow().entered, [("Inhale".to_string(), CueKind::Inhale)]);

    controller.poll(4_000);
    controller.poll(4_001);
    assert_eq!(recorded.borrow().entered.len(), 2);
    assert_eq!(recorded.borrow().entered[1].1, CueKind::Hold);
}

#[test]
fn test_late_background_timer_does_not_replay_missed_phases() {
    let (mut controller, recorded) = recording_controller("box", 0);
    let mut clock = ManualClock::default();
    controller.set_visibility(Visibility::Background, 0);
    controller.start(0);
    let tick = controller.pending().unwrap();
    assert_eq!(tick.due_at_ms, 4_000);

    // The timer is delivered five minutes late.
    clock.set(300_000);
    let events = controller.fire(tick.token, clock.now_ms());
    let entered = events
        .iter()
        .filter(|e| matches!(e, Event::PhaseEntered { .. }))
        .count();
    assert_eq!(entered, 1);

    drive_until(&mut controller, &mut clock, 303_000);
    assert_eq!(recorded.borrow().entered.len(), 2);
    assert_eq!(recorded.borrow().entered[1].1, CueKind::Hold);
    assert_eq!(controller.state().current_phase_index, 1);
    assert_eq!(controller.state().cycle_count, 0);
}

#[test]
fn test_mode_switch_matches_single_mode() {
    let total = 97_000;
    let (mut fine, _) = recording_controller("box", 0);
    let fine_report =
        simulation::run(&mut fine, &mut ManualClock::default(), total, &DrivePlan::fine());

    let (mut mixed, _) = recording_controller("box", 0);
    let plan = DrivePlan {
        start_in: Visibility::Foreground,
        toggle_at_ms: vec![1_234, 30_000, 61_111],
    };
    let mixed_report = simulation::run(&mut mixed, &mut ManualClock::default(), total, &plan);

    assert_eq!(fine_report.final_state.cycle_count, 6);
    assert_eq!(fine_report.final_state.cycle_count, mixed_report.final_state.cycle_count);
    assert_eq!(
        fine_report.final_state.current_phase_index,
        mixed_report.final_state.current_phase_index
    );
}

#[test]
fn test_unbounded_session_never_completes() {
    let (mut controller, recorded) = recording_controller("coherent", 0);
    let mut clock = ManualClock::default();
    controller.set_visibility(Visibility::Background, 0);
    controller.start(0);
    drive_until(&mut controller, &mut clock, 3_600_000);

    assert_eq!(controller.status(), SessionStatus::Running);
    assert_eq!(recorded.borrow().completions, 0);
    assert!(controller.sample(3_600_000).session_remaining_ms.is_none());
}

#[test]
fn test_unavailable_store_starts_with_defaults() {
    let controller = SessionController::new(
        Catalog::builtin(),
        EngineSettings::default(),
        Box::new(UnavailablePreferences),
        Collaborators::headless(),
    );
    assert_eq!(controller.exercise().id(), "box");
    assert_eq!(controller.session().total_duration_seconds, 0);
    assert!(controller.sound_enabled());
}

#[test]
fn test_preferences_persist_in_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("breathwork.db");
    {
        let db = Database::open_at(&path).unwrap();
        let mut controller = SessionController::new(
            Catalog::builtin(),
            EngineSettings::default(),
            Box::new(db),
            Collaborators::headless(),
        );
        controller.select_exercise("4-7-8", 0).unwrap();
        controller.set_total_duration(300, 0);
        controller.set_sound_enabled(false);
    }

    let db = Database::open_at(&path).unwrap();
    let controller = SessionController::new(
        Catalog::builtin(),
        EngineSettings::default(),
        Box::new(db),
        Collaborators::headless(),
    );
    assert_eq!(controller.exercise().id(), "4-7-8");
    assert_eq!(controller.session().total_duration_seconds, 300);
    assert!(!controller.sound_enabled());
}
