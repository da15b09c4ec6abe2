pub mod config;
pub mod exercises;
pub mod prefs;
pub mod run;
pub mod simulate;
pub mod stats;
