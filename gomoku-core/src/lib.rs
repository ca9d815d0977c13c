//! # gomoku-core
//!
//! Core library for two-peer networked five-in-a-row.
//!
//! This crate contains:
//! - **Board**: `Board`, `Stone`, placement and five-in-a-row detection
//! - **Roles**: `Role::Host` plays black and opens, `Role::Guest` plays white
//! - **Protocol**: `Message` (`MOVE x y` / `NEWGAME`) and `GomokuCodec` for
//!   newline-framed TCP I/O via `tokio_util`
//! - **Network**: `Connection` with reader/writer tasks, `HostEndpoint` for
//!   the single-guest listener
//! - **Game**: `Coordinator`, the mutex-guarded game shared by local input
//!   and the network reader
//! - **State**: `ConnectionStatus` and `SessionPhase` state machines
//! - **Session**: `Session`, the façade a front end drives
//! - **Error**: `GomokuError`, typed, `thiserror`-based error hierarchy

pub mod board;
pub mod codec;
pub mod error;
pub mod game;
pub mod message;
pub mod network;
pub mod role;
pub mod session;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use board::{BOARD_SIZE, Board, Stone, WIN_LENGTH};
pub use codec::{GomokuCodec, MAX_LINE_LENGTH};
pub use error::{GomokuError, MoveError, ProtocolError};
pub use game::{Coordinator, FIRST_TO_MOVE, GameSnapshot, GameState};
pub use message::Message;
pub use network::{Connection, ConnectionSender, DEFAULT_PORT, HostEndpoint, Inbound, PeerAddr};
pub use role::Role;
pub use session::Session;
pub use state::{ConnectionStatus, SessionPhase};
