//! Application configuration value object

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::ErasePolicy;
use crate::domain::recording::DeviceId;
use crate::domain::schedule::ClockTime;

pub const DEFAULT_UDP_PORT: u16 = 12345;
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_FILE_EXTENSION: &str = "bin";
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_CHANNELS: u16 = 1;
pub const DEFAULT_BUFFER_SAMPLES: usize = 1024;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 20;
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 10;

/// Acquisition settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub buffer_samples: Option<usize>,
    pub read_timeout_ms: Option<u64>,
    pub idle_interval_ms: Option<u64>,
}

/// One-shot schedule window as `hh:mm:ss` times of day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub start: Option<String>,
    pub stop: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub device_id: Option<String>,
    pub storage_root: Option<String>,
    pub file_extension: Option<String>,
    pub erase_suffix: Option<String>,
    pub recursive_erase: Option<bool>,
    pub udp_port: Option<u16>,
    pub http_port: Option<u16>,
    pub multicast_group: Option<String>,
    pub utc_offset_secs: Option<i64>,
    pub stop_disarms_schedule: Option<bool>,
    pub indicator_led: Option<String>,
    pub audio: Option<AudioConfig>,
    pub schedule: Option<ScheduleConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            device_id: Some(DeviceId::DEFAULT.to_string()),
            storage_root: Some(Self::default_storage_root().to_string_lossy().to_string()),
            file_extension: Some(DEFAULT_FILE_EXTENSION.to_string()),
            erase_suffix: None,
            recursive_erase: Some(false),
            udp_port: Some(DEFAULT_UDP_PORT),
            http_port: Some(DEFAULT_HTTP_PORT),
            multicast_group: None,
            utc_offset_secs: Some(0),
            stop_disarms_schedule: Some(false),
            indicator_led: None,
            audio: Some(AudioConfig {
                sample_rate: Some(DEFAULT_SAMPLE_RATE),
                channels: Some(DEFAULT_CHANNELS),
                buffer_samples: Some(DEFAULT_BUFFER_SAMPLES),
                read_timeout_ms: Some(DEFAULT_READ_TIMEOUT_MS),
                idle_interval_ms: Some(DEFAULT_IDLE_INTERVAL_MS),
            }),
            schedule: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Directory recordings go to when nothing is configured
    pub fn default_storage_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("audio-station")
            .join("recordings")
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            device_id: other.device_id.or(self.device_id),
            storage_root: other.storage_root.or(self.storage_root),
            file_extension: other.file_extension.or(self.file_extension),
            erase_suffix: other.erase_suffix.or(self.erase_suffix),
            recursive_erase: other.recursive_erase.or(self.recursive_erase),
            udp_port: other.udp_port.or(self.udp_port),
            http_port: other.http_port.or(self.http_port),
            multicast_group: other.multicast_group.or(self.multicast_group),
            utc_offset_secs: other.utc_offset_secs.or(self.utc_offset_secs),
            stop_disarms_schedule: other.stop_disarms_schedule.or(self.stop_disarms_schedule),
            indicator_led: other.indicator_led.or(self.indicator_led),
            audio: Self::merge_audio_config(self.audio, other.audio),
            schedule: Self::merge_schedule_config(self.schedule, other.schedule),
        }
    }

    /// Merge audio config sections
    fn merge_audio_config(
        base: Option<AudioConfig>,
        other: Option<AudioConfig>,
    ) -> Option<AudioConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(AudioConfig {
                sample_rate: o.sample_rate.or(b.sample_rate),
                channels: o.channels.or(b.channels),
                buffer_samples: o.buffer_samples.or(b.buffer_samples),
                read_timeout_ms: o.read_timeout_ms.or(b.read_timeout_ms),
                idle_interval_ms: o.idle_interval_ms.or(b.idle_interval_ms),
            }),
        }
    }

    /// Merge schedule sections
    fn merge_schedule_config(
        base: Option<ScheduleConfig>,
        other: Option<ScheduleConfig>,
    ) -> Option<ScheduleConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(ScheduleConfig {
                start: o.start.or(b.start),
                stop: o.stop.or(b.stop),
            }),
        }
    }

    /// Get device id, or default if not set/invalid
    pub fn device_id_or_default(&self) -> DeviceId {
        self.device_id
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn storage_root_or_default(&self) -> PathBuf {
        self.storage_root
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_storage_root)
    }

    pub fn file_extension_or_default(&self) -> &str {
        self.file_extension
            .as_deref()
            .unwrap_or(DEFAULT_FILE_EXTENSION)
    }

    /// Erase policy. The suffix defaults to the recording extension; an
    /// explicitly empty suffix selects every file.
    pub fn erase_policy(&self) -> ErasePolicy {
        let suffix = match self.erase_suffix.as_deref() {
            Some("") => None,
            Some(suffix) => Some(suffix.to_string()),
            None => {
                let ext = self.file_extension_or_default().trim_start_matches('.');
                if ext.is_empty() {
                    None
                } else {
                    Some(format!(".{}", ext))
                }
            }
        };
        ErasePolicy {
            suffix,
            recursive: self.recursive_erase.unwrap_or(false),
        }
    }

    pub fn udp_port_or_default(&self) -> u16 {
        self.udp_port.unwrap_or(DEFAULT_UDP_PORT)
    }

    pub fn http_port_or_default(&self) -> u16 {
        self.http_port.unwrap_or(DEFAULT_HTTP_PORT)
    }

    pub fn utc_offset_or_default(&self) -> i64 {
        self.utc_offset_secs.unwrap_or(0)
    }

    pub fn stop_disarms_schedule_or_default(&self) -> bool {
        self.stop_disarms_schedule.unwrap_or(false)
    }

    pub fn sample_rate_or_default(&self) -> u32 {
        self.audio
            .as_ref()
            .and_then(|a| a.sample_rate)
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn channels_or_default(&self) -> u16 {
        self.audio
            .as_ref()
            .and_then(|a| a.channels)
            .filter(|c| *c > 0)
            .unwrap_or(DEFAULT_CHANNELS)
    }

    pub fn buffer_samples_or_default(&self) -> usize {
        self.audio
            .as_ref()
            .and_then(|a| a.buffer_samples)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_BUFFER_SAMPLES)
    }

    pub fn read_timeout_or_default(&self) -> Duration {
        Duration::from_millis(
            self.audio
                .as_ref()
                .and_then(|a| a.read_timeout_ms)
                .unwrap_or(DEFAULT_READ_TIMEOUT_MS),
        )
    }

    pub fn idle_interval_or_default(&self) -> Duration {
        Duration::from_millis(
            self.audio
                .as_ref()
                .and_then(|a| a.idle_interval_ms)
                .unwrap_or(DEFAULT_IDLE_INTERVAL_MS),
        )
    }

    /// Schedule window if both ends are set and valid
    pub fn schedule_window(&self) -> Option<(ClockTime, ClockTime)> {
        let schedule = self.schedule.as_ref()?;
        let start = schedule.start.as_ref()?.parse().ok()?;
        let stop = schedule.stop.as_ref()?.parse().ok()?;
        Some((start, stop))
    }
}
