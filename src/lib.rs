//! Audio Station - networked audio capture station
//!
//! This crate records audio from a capture device into flat files, driven by a
//! daily schedule, datagram commands (unicast or multicast) and plain HTTP
//! requests that also serve the stored files.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Schedule windows, command grammars, file naming, sample buffering and errors
//! - **Application**: Recording controller, schedule evaluator, command dispatcher and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal capture, local storage, sysfs LED, XDG config, HTTP client)
//! - **CLI**: Argument parsing, network channels, the station loop and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
