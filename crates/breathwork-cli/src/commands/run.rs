use std::time::Duration;

use breathwork_core::collaborators::{Collaborators, NoopWakeLock, NullRender, SilentCues};
use breathwork_core::storage::Database;
use breathwork_core::{
    Config, Event, MonotonicClock, SessionController, SystemClock, Visibility,
};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::terminal::{BellCues, TerminalRender};

#[derive(Args)]
pub struct RunArgs {
    /// Exercise id (saved as the new default)
    #[arg(long)]
    exercise: Option<String>,
    /// Session length in seconds, 0 for unbounded (saved)
    #[arg(long)]
    duration: Option<u64>,
    /// Turn sound cues off (saved)
    #[arg(long)]
    mute: bool,
    /// Drive with one-shot timers instead of frame polling
    #[arg(long)]
    background: bool,
    /// Print events as JSON lines instead of drawing the status line
    #[arg(long)]
    json: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let catalog = config.catalog()?;
    let settings = config.engine_settings()?;
    let prefs = Database::open()?;
    let history = Database::open()?;

    let collaborators = if args.json {
        Collaborators::new(
            Box::new(SilentCues),
            Box::new(NoopWakeLock),
            Box::new(NullRender),
        )
    } else {
        Collaborators::new(
            Box::new(BellCues::new()),
            Box::new(NoopWakeLock),
            Box::new(TerminalRender::new()),
        )
    };
    let mut controller = SessionController::new(catalog, settings, Box::new(prefs), collaborators);
    let clock = SystemClock::new();

    if let Some(id) = &args.exercise {
        controller.select_exercise(id, clock.now_ms())?;
    }
    if let Some(secs) = args.duration {
        controller.set_total_duration(secs, clock.now_ms());
    }
    if args.mute {
        controller.set_sound_enabled(false);
    }
    if args.background {
        controller.set_visibility(Visibility::Background, clock.now_ms());
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(drive(&mut controller, &clock, &history, args.json))
}

/// Sleep until each armed tick, fire it, and stop on completion or Ctrl-C.
async fn drive(
    controller: &mut SessionController,
    clock: &SystemClock,
    history: &Database,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Utc::now();
    let mut events = controller.start(clock.now_ms());
    let mut interrupted = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        for event in events.drain(..) {
            handle_event(&event, history, started_at, json)?;
        }
        if interrupted {
            break;
        }
        let Some(tick) = controller.pending() else {
            break;
        };

        let delay = tick.due_at_ms.saturating_sub(clock.now_ms());
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay)) => {
                events = controller.fire(tick.token, clock.now_ms());
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted; resetting session");
                events = controller.reset(clock.now_ms());
                interrupted = true;
            }
        }
    }
    Ok(())
}

fn handle_event(
    event: &Event,
    history: &Database,
    started_at: DateTime<Utc>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    }
    match event {
        Event::SessionCompleted {
            exercise_id,
            cycle_count,
            elapsed_ms,
            at,
        } => {
            let elapsed_secs = elapsed_ms / 1000;
            history.record_session(
                exercise_id,
                *cycle_count,
                elapsed_secs,
                true,
                started_at,
                *at,
            )?;
        }
        Event::SessionReset {
            exercise_id,
            cycle_count,
            elapsed_ms,
            at,
        } if *elapsed_ms > 0 => {
            let elapsed_secs = elapsed_ms / 1000;
            history.record_session(
                exercise_id,
                *cycle_count,
                elapsed_secs,
                false,
                started_at,
                *at,
            )?;
        }
        _ => {}
    }
    Ok(())
}
