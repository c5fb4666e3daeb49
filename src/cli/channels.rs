//! Network endpoints of the station: UDP datagrams and HTTP requests
//!
//! Both are polled without blocking from the station loop.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use log::{info, warn};
use tokio::net::{TcpListener, TcpStream, UdpSocket};

/// Where the channels listen
#[derive(Debug, Clone, Copy)]
pub struct ChannelSettings {
    pub bind_addr: Ipv4Addr,
    pub udp_port: u16,
    pub http_port: u16,
    pub multicast_group: Option<Ipv4Addr>,
}

pub struct CommandChannels {
    udp: UdpSocket,
    http: TcpListener,
}

impl CommandChannels {
    pub async fn bind(settings: ChannelSettings) -> io::Result<Self> {
        let udp = UdpSocket::bind(SocketAddrV4::new(settings.bind_addr, settings.udp_port)).await?;
        if let Some(group) = settings.multicast_group {
            udp.join_multicast_v4(group, settings.bind_addr)?;
            info!("Joined multicast group {}", group);
        }

        let http = TcpListener::bind(SocketAddrV4::new(settings.bind_addr, settings.http_port)).await?;

        info!(
            "Listening for datagrams on {} and requests on {}",
            udp.local_addr()?,
            http.local_addr()?
        );
        Ok(Self { udp, http })
    }

    pub fn udp_addr(&self) -> io::Result<SocketAddr> {
        self.udp.local_addr()
    }

    pub fn http_addr(&self) -> io::Result<SocketAddr> {
        self.http.local_addr()
    }

    /// Take one pending datagram, if any. Oversized payloads are truncated
    /// to `buf.len()`.
    pub fn try_datagram(&self, buf: &mut [u8]) -> Option<(usize, SocketAddr)> {
        match self.udp.try_recv_from(buf) {
            Ok(received) => Some(received),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("Datagram receive failed: {}", e);
                None
            }
        }
    }

    /// Take one pending connection, if any
    pub async fn try_accept(&self) -> Option<(TcpStream, SocketAddr)> {
        match tokio::time::timeout(Duration::ZERO, self.http.accept()).await {
            Ok(Ok(accepted)) => Some(accepted),
            Ok(Err(e)) => {
                warn!("Accept failed: {}", e);
                None
            }
            Err(_) => None,
        }
    }
}
