//! Audio acquisition adapters

mod cpal_source;

pub use cpal_source::{CaptureSettings, CpalAudioSource, DEFAULT_QUEUE_BLOCKS};
