//! Observable status of the link to the peer.
//!
//! Published by the session and the coordinator's reader through a
//! `tokio::sync::watch` channel, so the UI can poll it at any time
//! without touching the socket.

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::GomokuError;

// ── ConnectionStatus ─────────────────────────────────────────────

/// The current state of the peer link.
///
/// ```text
///  Disconnected ──► Listening ──┐
///       │ ▲                     ├──► Connected ──► Lost
///       │ └──────────────────── │ ◄──────┘  (teardown)
///       └─────► Connecting ─────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No link and nothing in progress. Initial / idle state.
    #[default]
    Disconnected,

    /// Host is bound and waiting for the guest.
    Listening { local: SocketAddr },

    /// Guest is dialing the host.
    Connecting { target: String },

    /// The stream is up.
    Connected {
        /// Remote end, when known.
        peer: Option<SocketAddr>,
        /// When the stream was established.
        since: Instant,
    },

    /// The stream failed or the peer closed it. Terminal for the session.
    Lost { reason: String },
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Listening { local } => write!(f, "Waiting for opponent on {local}"),
            Self::Connecting { target } => write!(f, "Connecting to {target}"),
            Self::Connected { peer: Some(peer), .. } => write!(f, "Connected to {peer}"),
            Self::Connected { peer: None, .. } => write!(f, "Connected"),
            Self::Lost { reason } => write!(f, "Connection lost: {reason}"),
        }
    }
}

impl ConnectionStatus {
    /// Returns `true` while the stream is usable.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Returns `true` once the stream has failed.
    pub fn is_lost(&self) -> bool {
        matches!(self, Self::Lost { .. })
    }

    /// How long the stream has been up.
    ///
    /// Returns `None` for any other status.
    pub fn connected_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Connected { since, .. } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Listening`.
    ///
    /// Valid from: `Disconnected`.
    pub fn begin_listen(&mut self, local: SocketAddr) -> Result<(), GomokuError> {
        match self {
            Self::Disconnected => {
                *self = Self::Listening { local };
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition(
                "cannot listen: not in Disconnected state",
            )),
        }
    }

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Disconnected`.
    pub fn begin_connect(&mut self, target: impl Into<String>) -> Result<(), GomokuError> {
        match self {
            Self::Disconnected => {
                *self = Self::Connecting {
                    target: target.into(),
                };
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition(
                "cannot connect: not in Disconnected state",
            )),
        }
    }

    /// Transition to `Connected`.
    ///
    /// Valid from: `Listening`, `Connecting`.
    pub fn establish(&mut self, peer: Option<SocketAddr>) -> Result<(), GomokuError> {
        match self {
            Self::Listening { .. } | Self::Connecting { .. } => {
                *self = Self::Connected {
                    peer,
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition(
                "cannot establish: not listening or connecting",
            )),
        }
    }

    /// Transition to `Lost`.
    ///
    /// Valid from: `Connected`. Losing an already lost link keeps the
    /// first reason.
    pub fn lose(&mut self, reason: impl Into<String>) -> Result<(), GomokuError> {
        match self {
            Self::Connected { .. } => {
                *self = Self::Lost {
                    reason: reason.into(),
                };
                Ok(())
            }
            Self::Lost { .. } => Ok(()),
            _ => Err(GomokuError::InvalidTransition("cannot lose: not connected")),
        }
    }

    /// Force-reset to `Disconnected` regardless of current state.
    ///
    /// Use this for teardown and failed connection attempts.
    pub fn force_disconnect(&mut self) {
        *self = Self::Disconnected;
    }
}

// ── Tests ────────────────────────────────────────────────────────
