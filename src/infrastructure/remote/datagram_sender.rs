//! One-shot datagram sender for the station's command channel

use tokio::net::UdpSocket;

use super::station_client::RemoteError;

/// Send `payload` to `addr` (`host:port`, unicast or multicast group).
///
/// # Returns
/// Bytes sent
pub async fn send_datagram(addr: &str, payload: &[u8]) -> Result<usize, RemoteError> {
    let send_failed = |e: std::io::Error| RemoteError::SendFailed {
        addr: addr.to_string(),
        message: e.to_string(),
    };

    let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(send_failed)?;
    socket.send_to(payload, addr).await.map_err(send_failed)
}
