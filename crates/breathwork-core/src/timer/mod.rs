pub mod clock;
mod driver;
mod projector;
pub mod scheduler;
mod state;

pub use clock::{ClockSample, ManualClock, MonotonicClock, SystemClock};
pub use driver::{ArmedTick, DriveBackend, DriveMode, FramePoll, OneShotTimer, TickToken};
pub use projector::{ease, ScaleRange};
pub use scheduler::{Decision, PhaseEntry, Transition};
pub use state::{ElapsedSnapshot, SessionConfig, SessionState, SessionStatus};
