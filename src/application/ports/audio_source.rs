//! Audio acquisition port

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Acquisition errors
#[derive(Debug, Clone, Error)]
pub enum AcquisitionError {
    #[error("No samples within {0:?}")]
    Timeout(Duration),

    #[error("Audio stream closed")]
    StreamClosed,

    #[error("No audio device available")]
    NoAudioDevice,

    #[error("Failed to start acquisition: {0}")]
    StartFailed(String),
}

/// Port for a continuously running acquisition pipeline
#[async_trait]
pub trait AudioSource: Send {
    /// Read up to `buf.len()` signed 16-bit samples.
    ///
    /// Waits at most `timeout` for the first sample; never blocks
    /// indefinitely.
    ///
    /// # Returns
    /// The number of samples written to the front of `buf`
    async fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, AcquisitionError>;

    /// Drop every sample captured so far, so the next `read` returns only
    /// audio that arrives after this call.
    async fn discard_pending(&mut self);
}
