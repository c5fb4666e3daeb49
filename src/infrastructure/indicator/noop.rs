//! No-op indicator
//!
//! Used when no LED is configured.

use async_trait::async_trait;

use crate::application::ports::{Indicator, IndicatorError};

pub struct NoOpIndicator;

impl NoOpIndicator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Indicator for NoOpIndicator {
    async fn set(&self, _on: bool) -> Result<(), IndicatorError> {
        Ok(())
    }
}
