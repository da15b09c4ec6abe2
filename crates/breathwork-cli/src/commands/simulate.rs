use breathwork_core::collaborators::Collaborators;
use breathwork_core::simulation::{self, DrivePlan, SimulationSeed};
use breathwork_core::storage::{MemoryPreferences, Preferences};
use breathwork_core::{Config, ManualClock, SessionController};
use clap::{Args, ValueEnum};

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Frame polling the whole time
    Fine,
    /// One-shot timers the whole time
    Coarse,
    /// Flip between the two every `--every-ms`
    Alternate,
    /// Flip at seeded random times
    Random,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Exercise id (defaults to the catalog default)
    #[arg(long)]
    exercise: Option<String>,
    /// Session length in seconds, 0 for unbounded
    #[arg(long, default_value_t = 0)]
    duration: u64,
    /// Simulated time to run for, in milliseconds
    #[arg(long)]
    elapsed_ms: u64,
    #[arg(long, value_enum, default_value_t = Mode::Fine)]
    mode: Mode,
    /// Interval between visibility flips in alternate and random mode
    #[arg(long, default_value_t = 2_500)]
    every_ms: u64,
    /// Seed for random mode
    #[arg(long)]
    seed: Option<u64>,
}

/// Prints every event as one JSON line; the last line is the final snapshot.
/// Stored preferences and history are not touched.
pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let catalog = config.catalog()?;
    let settings = config.engine_settings()?;

    let exercise = match &args.exercise {
        Some(id) => catalog.get(id)?,
        None => catalog.default_exercise(),
    };
    let mut prefs = MemoryPreferences::new();
    Preferences {
        exercise_id: exercise.id().to_string(),
        total_duration_seconds: args.duration,
        sound_enabled: false,
    }
    .save(&mut prefs)?;

    let plan = match args.mode {
        Mode::Fine => DrivePlan::fine(),
        Mode::Coarse => DrivePlan::coarse(),
        Mode::Alternate => DrivePlan::alternating(args.every_ms, args.elapsed_ms),
        Mode::Random => {
            let seed = args.seed.map(SimulationSeed).unwrap_or_default();
            let count = args.elapsed_ms / args.every_ms.max(1);
            DrivePlan::random(seed, usize::try_from(count)?, args.elapsed_ms)
        }
    };

    let mut controller =
        SessionController::new(catalog, settings, Box::new(prefs), Collaborators::headless());
    let mut clock = ManualClock::default();
    let report = simulation::run(&mut controller, &mut clock, args.elapsed_ms, &plan);

    for event in &report.events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!("{}", serde_json::to_string(&report.snapshot)?);
    Ok(())
}
