//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio device, the filesystem, the host clock
//! and the network.

pub mod audio;
pub mod clock;
pub mod config;
pub mod indicator;
pub mod remote;
pub mod storage;

// Re-export adapters
pub use audio::{CaptureSettings, CpalAudioSource};
pub use clock::SystemClock;
pub use config::XdgConfigStore;
pub use indicator::{NoOpIndicator, StationIndicator, SysfsLedIndicator};
pub use remote::{send_datagram, RemoteError, StationClient};
pub use storage::LocalStorage;
