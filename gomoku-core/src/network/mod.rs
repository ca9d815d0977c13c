pub mod connection;
pub mod endpoint;

pub use connection::{Connection, ConnectionSender, Inbound, PeerAddr};
pub use endpoint::HostEndpoint;

/// Port the host listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 50007;
