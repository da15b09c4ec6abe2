use breathwork_core::collaborators::Collaborators;
use breathwork_core::storage::Database;
use breathwork_core::{Config, SessionController};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print stored preferences as JSON
    Show,
    /// Choose the default exercise
    SetExercise {
        /// Exercise id
        id: String,
    },
    /// Set the session length in seconds (0 for unbounded)
    SetDuration { seconds: u64 },
    /// Turn sound cues on or off
    SetSound {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut controller = SessionController::new(
        config.catalog()?,
        config.engine_settings()?,
        Box::new(Database::open()?),
        Collaborators::headless(),
    );

    match action {
        PrefsAction::Show => {}
        PrefsAction::SetExercise { id } => {
            controller.select_exercise(&id, 0)?;
        }
        PrefsAction::SetDuration { seconds } => {
            controller.set_total_duration(seconds, 0);
        }
        PrefsAction::SetSound { enabled } => {
            controller.set_sound_enabled(enabled);
        }
    }
    println!("{}", serde_json::to_string_pretty(&controller.preferences())?);
    Ok(())
}
