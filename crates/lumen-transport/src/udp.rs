//! UDP transport implementation
//!
//! One socket per protocol: the Art-Net core binds 6454 with broadcast
//! enabled, the sACN core binds 5568 and joins multicast groups. Receive
//! is strictly non-blocking (`Ok(None)` when no datagram is queued) so the
//! scheduler's tick rate stays bounded; suspension happens only in the
//! runner's own sleep.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use bytes::BytesMut;
use tokio::net::UdpSocket;

use lumen_core::{LumenError, LumenResult};

/// Largest datagram either protocol produces (a full E1.31 data packet)
pub const MAX_DATAGRAM_SIZE: usize = 638;

/// UDP transport bound to one protocol port
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind to a port on all interfaces
    pub async fn bind(port: u16) -> LumenResult<Self> {
        let addr = SocketAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| LumenError::Transport(e.to_string()))?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| LumenError::Transport(e.to_string()))?;

        Ok(UdpTransport { socket, local_addr })
    }

    /// Bind with broadcast enabled (Art-Net replies go to the directed
    /// broadcast address)
    pub async fn bind_broadcast(port: u16) -> LumenResult<Self> {
        let transport = Self::bind(port).await?;
        transport
            .socket
            .set_broadcast(true)
            .map_err(|e| LumenError::Transport(e.to_string()))?;
        Ok(transport)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Send one datagram
    pub async fn send_to(&self, bytes: &[u8], dest: SocketAddr) -> LumenResult<()> {
        self.socket
            .send_to(bytes, dest)
            .await
            .map_err(|e| LumenError::Transport(e.to_string()))?;
        Ok(())
    }

    /// Non-blocking receive: `Ok(None)` when no datagram is queued.
    /// `buf` is cleared and filled with the datagram payload.
    pub fn try_recv_from(&self, buf: &mut BytesMut) -> LumenResult<Option<SocketAddr>> {
        buf.clear();
        buf.resize(MAX_DATAGRAM_SIZE, 0);
        match self.socket.try_recv_from(buf) {
            Ok((len, from)) => {
                buf.truncate(len);
                Ok(Some(from))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                buf.truncate(0);
                Ok(None)
            }
            Err(e) => {
                buf.truncate(0);
                Err(LumenError::Transport(e.to_string()))
            }
        }
    }

    /// Await one datagram (used by tests and non-tick embedders)
    pub async fn recv_from(&self, buf: &mut BytesMut) -> LumenResult<SocketAddr> {
        buf.clear();
        buf.resize(MAX_DATAGRAM_SIZE, 0);
        let (len, from) = self
            .socket
            .recv_from(buf)
            .await
            .map_err(|e| LumenError::Transport(e.to_string()))?;
        buf.truncate(len);
        Ok(from)
    }

    /// Join an E1.31 multicast group on all interfaces
    pub fn join_group(&self, group: Ipv4Addr) -> LumenResult<()> {
        self.socket
            .join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
            .map_err(|e| LumenError::Transport(e.to_string()))?;
        tracing::debug!(%group, "joined multicast group");
        Ok(())
    }

    pub fn leave_group(&self, group: Ipv4Addr) -> LumenResult<()> {
        self.socket
            .leave_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
            .map_err(|e| LumenError::Transport(e.to_string()))?;
        tracing::debug!(%group, "left multicast group");
        Ok(())
    }
}
