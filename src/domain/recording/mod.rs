//! Recording domain: session state, file naming and the sample buffer

mod file_name;
mod sample_buffer;
mod session;

pub use file_name::{DeviceId, RecordingFileName};
pub use sample_buffer::SampleBuffer;
pub use session::{InvalidStateTransition, RecordingSession, RecordingSummary, SessionState};
