//! Recording file naming convention: `/<deviceId>_<epochSeconds>.<ext>`

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidDeviceIdError;

/// Identifier of the capture unit, used as the file name prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Default identifier when none is configured
    pub const DEFAULT: &'static str = "audio_station";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl FromStr for DeviceId {
    type Err = InvalidDeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidDeviceIdError {
                input: s.to_string(),
            })
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of one recording file in the storage namespace.
///
/// Names have one-second granularity: two sessions started within the same
/// second on the same device map to the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFileName {
    device_id: DeviceId,
    epoch_secs: u64,
    extension: String,
}

impl RecordingFileName {
    pub fn new(device_id: DeviceId, epoch_secs: u64, extension: &str) -> Self {
        Self {
            device_id,
            epoch_secs,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn epoch_secs(&self) -> u64 {
        self.epoch_secs
    }

    /// Absolute path in the storage namespace (leading `/`)
    pub fn path(&self) -> String {
        format!("/{}", self)
    }
}

impl fmt::Display for RecordingFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.device_id, self.epoch_secs)?;
        if !self.extension.is_empty() {
            write!(f, ".{}", self.extension)?;
        }
        Ok(())
    }
}
