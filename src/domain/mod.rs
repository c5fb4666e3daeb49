//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod recording;
pub mod schedule;

// Re-export common types
pub use catalog::{CatalogEntry, ErasePolicy, EraseReport};
pub use command::{DatagramCommand, RequestRoute};
pub use config::AppConfig;
pub use error::*;
pub use recording::{RecordingFileName, RecordingSession, SampleBuffer};
pub use schedule::{ClockTime, Schedule, ScheduleState};
