use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::GomokuCodec;
use crate::error::GomokuError;
use crate::message::Message;
use crate::network::DEFAULT_PORT;

/// Capacity of the inbound and outbound queues.
const CHANNEL_CAPACITY: usize = 64;

pub type ConnectionSender = mpsc::Sender<Message>;

/// Item delivered by [`Connection::recv`]. An `Err` is always the last
/// item: the reader stops after reporting it.
pub type Inbound = Result<Message, GomokuError>;

/// The single stream between the two peers.
///
/// Owns a writer task (user → network) and a reader task
/// (network → user), both joined to the caller by `mpsc` channels.
/// Dropping the connection, or calling [`Connection::shutdown`], stops
/// the reader and closes the write half so the peer sees end-of-stream.
#[derive(Debug)]
pub struct Connection {
    // Channel to send messages to background writer task
    tx: ConnectionSender,
    // Channel to receive messages from background reader task
    rx: mpsc::Receiver<Inbound>,
    cancel: CancellationToken,
    peer: Option<SocketAddr>,
}

impl Connection {
    /// Wrap any byte stream and start the reader and writer tasks.
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (mut net_writer, mut net_reader) = Framed::new(stream, GomokuCodec::new()).split();
        let cancel = CancellationToken::new();

        // User -> Network
        let (user_tx, mut network_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);

        // Network -> User
        let (network_tx, user_rx) = mpsc::channel::<Inbound>(CHANNEL_CAPACITY);

        // Writer task: User -> Network
        let writer_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    _ = writer_cancel.cancelled() => break,
                    next = network_rx.recv() => match next {
                        Some(message) => message,
                        None => break,
                    },
                };
                debug!(%message, "sending");
                if let Err(e) = net_writer.send(message).await {
                    warn!(error = %e, "network write failed");
                    return;
                }
            }
            if let Err(e) = net_writer.close().await {
                debug!(error = %e, "closing write half failed");
            }
        });

        // Reader task: Network -> User
        let reader_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = reader_cancel.cancelled() => {
                        debug!("reader cancelled");
                        break;
                    }
                    next = net_reader.next() => next,
                };

                let item = match next {
                    Some(Ok(message)) => Ok(message),
                    Some(Err(e)) => {
                        warn!(error = %e, "network read failed");
                        Err(e)
                    }
                    None => {
                        debug!("peer closed the stream");
                        Err(GomokuError::PeerDisconnected)
                    }
                };

                let terminal = item.is_err();
                if network_tx.send(item).await.is_err() {
                    // user_rx was dropped, stop reading
                    break;
                }
                if terminal {
                    break;
                }
            }
        });

        Self {
            tx: user_tx,
            rx: user_rx,
            cancel,
            peer: None,
        }
    }

    /// Wrap an established TCP stream, remembering the peer address.
    pub fn from_tcp(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "could not disable Nagle");
        }
        let mut conn = Self::new(stream);
        conn.peer = peer;
        conn
    }

    /// Dial the host.
    pub async fn connect(addr: &PeerAddr) -> Result<Self, GomokuError> {
        let stream = TcpStream::connect((addr.host(), addr.port())).await?;
        Ok(Self::from_tcp(stream))
    }

    /// Queue a message for the writer task.
    pub async fn send(&self, message: Message) -> Result<(), GomokuError> {
        self.tx.send(message).await?;
        Ok(())
    }

    /// Next inbound item, or `None` once the reader has stopped and
    /// everything it produced has been consumed.
    pub async fn recv(&mut self) -> Option<Inbound> {
        self.rx.recv().await
    }

    pub fn sender(&self) -> ConnectionSender {
        self.tx.clone()
    }

    /// A token that stops both background tasks when cancelled.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop reading and close the write half.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── PeerAddr ─────────────────────────────────────────────────────

/// Where a guest should connect: a host name or IP plus a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddr {
    host: String,
    port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl PeerAddr {
    /// Parse `host`, `host:port`, `[v6]` or `[v6]:port`, using
    /// `default_port` when the text names no port.
    pub fn parse_with_default(s: &str, default_port: u16) -> Result<Self, GomokuError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GomokuError::Other("empty address".into()));
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::new(addr.ip().to_string(), addr.port()));
        }
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| GomokuError::Other(format!("unterminated '[' in {s:?}")))?;
            let port = match tail.strip_prefix(':') {
                Some(port) => parse_port(port)?,
                None if tail.is_empty() => default_port,
                None => return Err(GomokuError::Other(format!("invalid address {s:?}"))),
            };
            return Ok(Self::new(host, port));
        }
        match s.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => Ok(Self::new(host, parse_port(port)?)),
            // Bare host name, or an IPv6 address without brackets.
            _ => Ok(Self::new(s, default_port)),
        }
    }
}

/// Same as [`PeerAddr::parse_with_default`] with [`DEFAULT_PORT`].
impl FromStr for PeerAddr {
    type Err = GomokuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default(s, DEFAULT_PORT)
    }
}

fn parse_port(s: &str) -> Result<u16, GomokuError> {
    s.parse()
        .map_err(|_| GomokuError::Other(format!("invalid port {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_only_uses_default_port() {
        let addr: PeerAddr = "192.168.1.100".parse().unwrap();
        assert_eq!(addr, PeerAddr::new("192.168.1.100", DEFAULT_PORT));
    }

    #[test]
    fn parse_host_and_port() {
        let addr: PeerAddr = "example.org:4000".parse().unwrap();
        assert_eq!(addr.host(), "example.org");
        assert_eq!(addr.port(), 4000);
        assert_eq!(addr.to_string(), "example.org:4000");
    }

    #[test]
    fn parse_ipv6() {
        let addr: PeerAddr = "[::1]:5000".parse().unwrap();
        assert_eq!(addr, PeerAddr::new("::1", 5000));
        assert_eq!(addr.to_string(), "[::1]:5000");

        let addr: PeerAddr = "::1".parse().unwrap();
        assert_eq!(addr, PeerAddr::new("::1", DEFAULT_PORT));
    }

    #[test]
    fn missing_port_falls_back_to_given_default() {
        let addr = PeerAddr::parse_with_default("10.0.0.2", 6000).unwrap();
        assert_eq!(addr, PeerAddr::new("10.0.0.2", 6000));

        let addr = PeerAddr::parse_with_default("[::1]", 6000).unwrap();
        assert_eq!(addr.port(), 6000);

        // An explicit port wins.
        let addr = PeerAddr::parse_with_default("10.0.0.2:7000", 6000).unwrap();
        assert_eq!(addr.port(), 7000);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<PeerAddr>().is_err());
        assert!("host:notaport".parse::<PeerAddr>().is_err());
        assert!("[::1".parse::<PeerAddr>().is_err());
    }

    #[tokio::test]
    async fn messages_cross_a_duplex_pipe() {
        let (a, b) = tokio::io::duplex(256);
        let left = Connection::new(a);
        let mut right = Connection::new(b);

        left.send(Message::Move { x: 4, y: 5 }).await.unwrap();
        left.send(Message::NewGame).await.unwrap();

        assert_eq!(right.recv().await.unwrap().unwrap(), Message::Move { x: 4, y: 5 });
        assert_eq!(right.recv().await.unwrap().unwrap(), Message::NewGame);
    }

    #[tokio::test]
    async fn shutdown_reports_disconnect_to_peer() {
        let (a, b) = tokio::io::duplex(256);
        let left = Connection::new(a);
        let mut right = Connection::new(b);

        left.shutdown();

        let item = right.recv().await.unwrap();
        assert!(matches!(item, Err(GomokuError::PeerDisconnected)));
        assert!(right.recv().await.is_none());
    }
}
