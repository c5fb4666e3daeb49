//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::config::{AppConfig, ScheduleConfig};

/// Networked audio capture station
#[derive(Parser, Debug)]
#[command(name = "audio-station")]
#[command(version)]
#[command(about = "Audio capture station controlled by schedule, UDP datagrams and HTTP requests")]
#[command(long_about = None)]
pub struct Cli {
    /// Device identifier used in recording file names
    #[arg(long, value_name = "ID")]
    pub device_id: Option<String>,

    /// Directory recordings are stored in
    #[arg(short = 'r', long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Recording file extension
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// UDP port for datagram commands
    #[arg(long, value_name = "PORT")]
    pub udp_port: Option<u16>,

    /// TCP port for HTTP requests
    #[arg(long, value_name = "PORT")]
    pub http_port: Option<u16>,

    /// IPv4 multicast group to join on the datagram port
    #[arg(long, value_name = "ADDR")]
    pub multicast_group: Option<String>,

    /// Local time offset from UTC in seconds
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub utc_offset: Option<i64>,

    /// Start of today's recording window (hh:mm:ss)
    #[arg(long, value_name = "TIME", requires = "stop_at")]
    pub start_at: Option<String>,

    /// End of today's recording window (hh:mm:ss)
    #[arg(long, value_name = "TIME", requires = "start_at")]
    pub stop_at: Option<String>,

    /// Recording indicator LED (class name or brightness file)
    #[arg(long, value_name = "LED")]
    pub led: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Send one datagram command (START_RECORDING, STOP_RECORDING, ERASE_SD)
    Send {
        /// Command token
        payload: String,
        /// Station address (unicast or multicast group)
        #[arg(long, value_name = "ADDR:PORT", default_value = "127.0.0.1:12345")]
        to: String,
    },
    /// Talk to a running station over HTTP
    Remote {
        /// Station base URL
        #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8080")]
        host: String,
        #[command(subcommand)]
        action: RemoteAction,
    },
}

/// Remote station actions
#[derive(Subcommand, Debug, Clone)]
pub enum RemoteAction {
    /// List stored files
    List,
    /// Start recording
    Start,
    /// Stop recording
    Stop,
    /// Download a stored file
    Download {
        /// File name as listed
        name: String,
        /// Where to write it (defaults to the file name)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

impl Cli {
    /// Flags as a config layer; unset flags stay `None`
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            device_id: self.device_id.clone(),
            storage_root: self
                .root
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            file_extension: self.extension.clone(),
            udp_port: self.udp_port,
            http_port: self.http_port,
            multicast_group: self.multicast_group.clone(),
            utc_offset_secs: self.utc_offset,
            indicator_led: self.led.clone(),
            schedule: match (&self.start_at, &self.stop_at) {
                (Some(start), Some(stop)) => Some(ScheduleConfig {
                    start: Some(start.clone()),
                    stop: Some(stop.clone()),
                }),
                _ => None,
            },
            ..Default::default()
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "device_id",
    "storage_root",
    "file_extension",
    "erase_suffix",
    "recursive_erase",
    "udp_port",
    "http_port",
    "multicast_group",
    "utc_offset_secs",
    "stop_disarms_schedule",
    "indicator_led",
    "schedule.start",
    "schedule.stop",
    "audio.sample_rate",
    "audio.channels",
    "audio.buffer_samples",
    "audio.read_timeout_ms",
    "audio.idle_interval_ms",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
