//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the network channels and the station runner.

pub mod app;
pub mod args;
pub mod channels;
pub mod config_cmd;
pub mod presenter;
pub mod remote_cmd;
pub mod signals;
pub mod station_app;

// Re-export commonly used types
pub use app::{load_merged_config, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, RemoteAction};
pub use presenter::Presenter;
pub use station_app::run_station;
