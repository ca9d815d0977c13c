pub mod connection;
pub mod session;

pub use connection::ConnectionStatus;
pub use session::SessionPhase;
