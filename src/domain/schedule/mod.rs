//! Recording schedule domain

mod clock_time;
mod window;

pub use clock_time::ClockTime;
pub use window::{Schedule, ScheduleState, SECS_PER_DAY};
