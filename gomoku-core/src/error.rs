//! Domain-specific error types for the gomoku core.
//!
//! All fallible operations return `Result<T, GomokuError>` or one of the
//! narrower enums below. No panics on invalid input or hostile peers.

use std::time::Duration;

use thiserror::Error;

// ── MoveError ────────────────────────────────────────────────────

/// Why a stone could not be placed.
///
/// These are validation failures, not faults: the UI treats them as
/// "nothing happens" and the reader logs and ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The coordinates fall outside the board.
    #[error("({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },

    /// The target cell already holds a stone.
    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: usize, y: usize },

    /// The stone's colour does not match the current turn.
    #[error("not your turn")]
    NotYourTurn,

    /// A winner has already been decided for this round.
    #[error("game is already over")]
    GameAlreadyOver,
}

// ── ProtocolError ────────────────────────────────────────────────

/// A single wire line could not be decoded.
///
/// Never terminal: the offending line is dropped and the reader
/// carries on with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The line contained nothing but whitespace.
    #[error("empty line")]
    Empty,

    /// The first word is not a known verb.
    #[error("unknown verb: {0:?}")]
    UnknownVerb(String),

    /// A verb arrived without all of its arguments.
    #[error("{verb} is missing an argument")]
    MissingArgument { verb: &'static str },

    /// A verb arrived with more arguments than it takes.
    #[error("{verb} has unexpected trailing argument {extra:?}")]
    TrailingArgument { verb: &'static str, extra: String },

    /// A coordinate is not an integer.
    #[error("invalid coordinate: {0:?}")]
    InvalidCoordinate(String),

    /// A coordinate parsed but does not fit on the board.
    #[error("coordinate {0} is outside the board")]
    CoordinateOutOfRange(i64),

    /// The line is not valid UTF-8.
    #[error("line is not valid utf-8")]
    InvalidUtf8,
}

// ── GomokuError ──────────────────────────────────────────────────

/// The canonical error type for the gomoku core.
#[derive(Debug, Error)]
pub enum GomokuError {
    // ── Game Errors ──────────────────────────────────────────────
    /// A move was rejected by the board or the turn rules.
    #[error("illegal move: {0}")]
    Move(#[from] MoveError),

    // ── Protocol Errors ──────────────────────────────────────────
    /// A line could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The peer sent a line longer than the codec accepts.
    #[error("line too long: more than {max} bytes without a newline")]
    LineTooLong { max: usize },

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The peer closed the stream.
    #[error("peer disconnected")]
    PeerDisconnected,

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// An operation needs a live connection and there is none.
    #[error("not connected")]
    NotConnected,

    // ── Session Errors ───────────────────────────────────────────
    /// A session phase transition is not allowed from the current phase.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl GomokuError {
    /// Returns `true` if the error ends the current session's transport.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::PeerDisconnected
                | Self::LineTooLong { .. }
                | Self::ChannelClosed
                | Self::Timeout(_)
        )
    }
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for GomokuError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        GomokuError::ChannelClosed
    }
}
