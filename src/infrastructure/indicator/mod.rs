//! Recording indicator adapters

mod noop;
mod sysfs;

pub use noop::NoOpIndicator;
pub use sysfs::SysfsLedIndicator;

use std::path::PathBuf;

use crate::application::ports::{Indicator, IndicatorError};

/// Sysfs LED when a name is configured, otherwise a no-op
pub enum StationIndicator {
    Led(SysfsLedIndicator),
    None(NoOpIndicator),
}

impl StationIndicator {
    /// `led` is either an LED class name (`led0`) or a brightness file path
    pub fn from_config(led: Option<&str>) -> Self {
        match led {
            Some(path) if path.contains('/') => Self::Led(SysfsLedIndicator::with_path(path)),
            Some(name) if !name.is_empty() => Self::Led(SysfsLedIndicator::new(name)),
            _ => Self::None(NoOpIndicator::new()),
        }
    }

    pub fn brightness_path(&self) -> Option<PathBuf> {
        match self {
            Self::Led(led) => Some(led.brightness_path().to_path_buf()),
            Self::None(_) => None,
        }
    }
}

#[async_trait::async_trait]
impl Indicator for StationIndicator {
    async fn set(&self, on: bool) -> Result<(), IndicatorError> {
        match self {
            Self::Led(led) => led.set(on).await,
            Self::None(noop) => noop.set(on).await,
        }
    }
}
