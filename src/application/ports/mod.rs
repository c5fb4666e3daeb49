//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_source;
pub mod clock;
pub mod config;
pub mod indicator;
pub mod storage;

// Re-export common types
pub use audio_source::{AcquisitionError, AudioSource};
pub use clock::Clock;
pub use config::ConfigStore;
pub use indicator::{Indicator, IndicatorError};
pub use storage::{CatalogCursor, Storage, StorageError, StorageReader, StorageWriter};
