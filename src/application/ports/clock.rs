//! Time source port

/// Port for the wall clock
pub trait Clock: Send + Sync {
    /// Current time in epoch seconds, local offset applied
    fn now_epoch(&self) -> u64;
}
