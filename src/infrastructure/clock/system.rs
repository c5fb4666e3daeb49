//! System wall clock with a fixed offset from UTC

use chrono::Utc;

use crate::application::ports::Clock;

/// Reads the host clock, which is assumed to be synchronized already
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    utc_offset_secs: i64,
}

impl SystemClock {
    pub fn new(utc_offset_secs: i64) -> Self {
        Self { utc_offset_secs }
    }

    pub fn utc_offset_secs(&self) -> i64 {
        self.utc_offset_secs
    }
}

impl Clock for SystemClock {
    fn now_epoch(&self) -> u64 {
        let local = Utc::now().timestamp().saturating_add(self.utc_offset_secs);
        u64::try_from(local).unwrap_or(0)
    }
}
