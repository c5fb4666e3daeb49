//! Application layer - Use cases and port interfaces
//!
//! Contains the recording controller, the schedule evaluator, the
//! catalog and the command dispatcher, written against the port traits.

pub mod catalog;
pub mod dispatcher;
pub mod ports;
pub mod recorder;
pub mod response;
pub mod scheduler;
pub mod station;

#[cfg(test)]
pub(crate) mod testing;

// Re-export use cases
pub use catalog::FileCatalog;
pub use dispatcher::{CommandDispatcher, DispatchError};
pub use recorder::{DrainOutcome, RecorderControl, RecorderSettings, RecordingController};
pub use scheduler::{ScheduleEvaluator, ScheduleTransition};
pub use station::{Station, StationSettings};
