//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "recording",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// What is left of a session once it has been closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub file_name: String,
    pub started_at: u64,
    pub bytes_written: u64,
}

/// The single recording session.
///
/// The writer only exists while the session is active, so "active" and
/// "holds an open handle" cannot disagree.
///
/// State machine:
///   IDLE -> ACTIVE (begin)
///   ACTIVE -> IDLE (finish)
#[derive(Debug)]
pub enum RecordingSession<W> {
    Idle,
    Active {
        writer: W,
        file_name: String,
        started_at: u64,
        bytes_written: u64,
    },
}

impl<W> Default for RecordingSession<W> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<W> RecordingSession<W> {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::Idle
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        match self {
            Self::Idle => SessionState::Idle,
            Self::Active { .. } => SessionState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Name of the file being written, if any
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Active { file_name, .. } => Some(file_name),
        }
    }

    pub fn bytes_written(&self) -> u64 {
        match self {
            Self::Idle => 0,
            Self::Active { bytes_written, .. } => *bytes_written,
        }
    }

    /// Transition from IDLE to ACTIVE, taking ownership of the open writer
    pub fn begin(
        &mut self,
        writer: W,
        file_name: impl Into<String>,
        started_at: u64,
    ) -> Result<(), InvalidStateTransition> {
        if self.is_active() {
            return Err(InvalidStateTransition {
                current_state: self.state(),
                action: "begin a session".to_string(),
            });
        }
        *self = Self::Active {
            writer,
            file_name: file_name.into(),
            started_at,
            bytes_written: 0,
        };
        Ok(())
    }

    /// Mutable access to the open writer while active
    pub fn writer_mut(&mut self) -> Option<&mut W> {
        match self {
            Self::Idle => None,
            Self::Active { writer, .. } => Some(writer),
        }
    }

    /// Account for bytes appended to the file
    pub fn record_written(&mut self, count: usize) {
        if let Self::Active { bytes_written, .. } = self {
            *bytes_written += count as u64;
        }
    }

    /// Transition from ACTIVE to IDLE, handing back the writer for closing
    pub fn finish(&mut self) -> Option<(W, RecordingSummary)> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Active {
                writer,
                file_name,
                started_at,
                bytes_written,
            } => Some((
                writer,
                RecordingSummary {
                    file_name,
                    started_at,
                    bytes_written,
                },
            )),
        }
    }
}
