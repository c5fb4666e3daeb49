//! LED indicator through the Linux LED class (`/sys/class/leds/<name>`)

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{Indicator, IndicatorError};

const LED_CLASS_DIR: &str = "/sys/class/leds";

pub struct SysfsLedIndicator {
    brightness: PathBuf,
}

impl SysfsLedIndicator {
    pub fn new(name: &str) -> Self {
        Self::with_path(Path::new(LED_CLASS_DIR).join(name).join("brightness"))
    }

    /// Drive an arbitrary brightness file
    pub fn with_path(brightness: impl Into<PathBuf>) -> Self {
        Self {
            brightness: brightness.into(),
        }
    }

    pub fn brightness_path(&self) -> &Path {
        &self.brightness
    }
}

#[async_trait]
impl Indicator for SysfsLedIndicator {
    async fn set(&self, on: bool) -> Result<(), IndicatorError> {
        let value: &[u8] = if on { b"1" } else { b"0" };
        tokio::fs::write(&self.brightness, value)
            .await
            .map_err(|e| IndicatorError::SwitchFailed(format!("{}: {}", self.brightness.display(), e)))
    }
}
