//! Wall clock adapters

mod system;

pub use system::SystemClock;
