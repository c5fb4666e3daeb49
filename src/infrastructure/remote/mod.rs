//! Clients for talking to a running station

mod datagram_sender;
mod station_client;

pub use datagram_sender::send_datagram;
pub use station_client::{RemoteError, StationClient, StatusResponse};
