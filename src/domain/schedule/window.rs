//! One-shot recording window

use std::fmt;

use super::ClockTime;

pub const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Schedule state, derived from `(enabled, recording)` rather than stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleState {
    /// No schedule armed
    Idle,
    /// Armed, not recording
    Waiting,
    /// Armed and recording
    Active,
}

impl ScheduleState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A start/stop window in epoch seconds.
///
/// `start_epoch < stop_epoch` is expected but not enforced; a window with
/// `stop <= start` never contains any instant and disarms on first tick at
/// or after `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schedule {
    enabled: bool,
    start_epoch: u64,
    stop_epoch: u64,
}

impl Schedule {
    /// A schedule that never triggers
    pub fn disarmed() -> Self {
        Self::default()
    }

    /// Arm a window with explicit epochs
    pub fn armed(start_epoch: u64, stop_epoch: u64) -> Self {
        Self {
            enabled: true,
            start_epoch,
            stop_epoch,
        }
    }

    /// Arm a window for the day containing `now_epoch`.
    /// A stop time not after the start time is taken to be on the next day.
    pub fn for_day(start: ClockTime, stop: ClockTime, now_epoch: u64) -> Self {
        let midnight = now_epoch - now_epoch % SECS_PER_DAY;
        let start_epoch = midnight + start.seconds_from_midnight();
        let mut stop_epoch = midnight + stop.seconds_from_midnight();
        if stop_epoch <= start_epoch {
            stop_epoch += SECS_PER_DAY;
        }
        Self::armed(start_epoch, stop_epoch)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start_epoch(&self) -> u64 {
        self.start_epoch
    }

    pub fn stop_epoch(&self) -> u64 {
        self.stop_epoch
    }

    /// `start <= now < stop`
    pub fn contains(&self, now_epoch: u64) -> bool {
        now_epoch >= self.start_epoch && now_epoch < self.stop_epoch
    }

    /// `now >= stop`
    pub fn has_elapsed(&self, now_epoch: u64) -> bool {
        now_epoch >= self.stop_epoch
    }

    /// Consume the schedule; it will not trigger again until re-armed
    pub fn disarm(&mut self) {
        self.enabled = false;
    }

    pub fn state(&self, recording: bool) -> ScheduleState {
        match (self.enabled, recording) {
            (false, _) => ScheduleState::Idle,
            (true, false) => ScheduleState::Waiting,
            (true, true) => ScheduleState::Active,
        }
    }
}
