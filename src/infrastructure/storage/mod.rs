//! Storage adapters

mod local;

pub use local::{LocalCursor, LocalReader, LocalStorage, LocalWriter};
