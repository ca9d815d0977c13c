//! The host's listening side.

use std::net::SocketAddr;

use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::info;

use crate::error::GomokuError;
use crate::network::Connection;

/// A bound listener that accepts exactly one guest.
///
/// [`HostEndpoint::accept_one`] consumes the endpoint, so the listening
/// socket is closed as soon as the guest is in and any later connection
/// attempt is refused by the OS.
#[derive(Debug)]
pub struct HostEndpoint {
    listener: TcpListener,
}

impl HostEndpoint {
    /// Bind the listening socket.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, GomokuError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// The address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, GomokuError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for one guest, then stop listening.
    pub async fn accept_one(self) -> Result<Connection, GomokuError> {
        let (stream, peer) = self.listener.accept().await?;
        info!(%peer, "guest connected");
        drop(self.listener);
        Ok(Connection::from_tcp(stream))
    }
}
