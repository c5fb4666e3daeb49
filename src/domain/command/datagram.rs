//! Datagram command tokens

use std::fmt;

/// Largest datagram payload the station reads
pub const MAX_DATAGRAM_LEN: usize = 255;

/// Commands accepted on the datagram channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatagramCommand {
    Start,
    Stop,
    Erase,
    /// Anything else, kept for logging
    Unknown(String),
}

impl DatagramCommand {
    pub const START_TOKEN: &'static str = "START_RECORDING";
    pub const STOP_TOKEN: &'static str = "STOP_RECORDING";
    pub const ERASE_TOKEN: &'static str = "ERASE_SD";

    /// Parse a payload. Surrounding whitespace and line endings are ignored;
    /// the token itself must match exactly (case-sensitive).
    pub fn parse(payload: &[u8]) -> Self {
        let payload = &payload[..payload.len().min(MAX_DATAGRAM_LEN)];
        let text = String::from_utf8_lossy(payload);
        let token = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        match token {
            Self::START_TOKEN => Self::Start,
            Self::STOP_TOKEN => Self::Stop,
            Self::ERASE_TOKEN => Self::Erase,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_token(&self) -> &str {
        match self {
            Self::Start => Self::START_TOKEN,
            Self::Stop => Self::STOP_TOKEN,
            Self::Erase => Self::ERASE_TOKEN,
            Self::Unknown(text) => text,
        }
    }
}

impl fmt::Display for DatagramCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}
