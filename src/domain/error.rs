//! Domain error types

use thiserror::Error;

/// Error when parsing a time of day string
#[derive(Debug, Clone, Error)]
#[error("Invalid time of day: \"{input}\". Expected format: hh:mm:ss (e.g., 08:30:00)")]
pub struct ClockTimeParseError {
    pub input: String,
}

/// Error when a device identifier cannot be used in a file name
#[derive(Debug, Clone, Error)]
#[error("Invalid device id: \"{input}\". Use letters, digits, '-' or '_' only")]
pub struct InvalidDeviceIdError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
