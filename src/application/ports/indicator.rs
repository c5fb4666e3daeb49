//! Recording indicator port (e.g. an LED)

use async_trait::async_trait;
use thiserror::Error;

/// Indicator errors
#[derive(Debug, Clone, Error)]
pub enum IndicatorError {
    #[error("Failed to switch indicator: {0}")]
    SwitchFailed(String),
}

/// Port for an on/off recording indicator
#[async_trait]
pub trait Indicator: Send + Sync {
    /// Switch the indicator on or off
    async fn set(&self, on: bool) -> Result<(), IndicatorError>;
}
