//! Core polling types.

mod builder;
mod scheduler;
mod settings;
mod tracker;

pub use builder::SchedulerBuilder;
pub use scheduler::{DEFAULT_INTERVAL, Scheduler, SchedulerState};
pub use settings::{PollerSettings, SettingsLoader};
pub use tracker::ChangeTracker;
