use breathwork_core::Config;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ExercisesAction {
    /// List available exercises
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one exercise as JSON
    Show {
        /// Exercise id
        id: String,
    },
}

pub fn run(action: ExercisesAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Config::load()?.catalog()?;

    match action {
        ExercisesAction::List { json } => {
            if json {
                let all: Vec<_> = catalog.iter().map(|e| &**e).collect();
                println!("{}", serde_json::to_string_pretty(&all)?);
                return Ok(());
            }
            for exercise in catalog.iter() {
                let phases: Vec<String> = exercise
                    .phases()
                    .iter()
                    .map(|p| format!("{} {}s", p.label(), p.duration_ms() as f64 / 1000.0))
                    .collect();
                println!(
                    "{:<10} {:<20} {}",
                    exercise.id(),
                    exercise.name(),
                    phases.join(" / ")
                );
            }
        }
        ExercisesAction::Show { id } => {
            let exercise = catalog.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&*exercise)?);
        }
    }
    Ok(())
}
