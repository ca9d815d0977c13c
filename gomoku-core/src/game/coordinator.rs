//! Shared game state between the local input path and the network
//! reader.
//!
//! Board, turn and winner live in one [`GameState`] behind a single
//! `std::sync::Mutex`. Every read-modify-write, from either path, runs
//! under that lock, and the lock is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::board::{Board, Stone};
use crate::error::{GomokuError, MoveError};
use crate::game::state::{GameSnapshot, GameState};
use crate::message::Message;
use crate::network::{Connection, ConnectionSender, Inbound};
use crate::role::Role;
use crate::state::ConnectionStatus;

#[derive(Debug)]
struct Shared {
    game: Mutex<GameState>,
    status: watch::Sender<ConnectionStatus>,
}

/// Handle to one game session's shared state. Cheap to clone; every
/// clone refers to the same game.
#[derive(Debug, Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
    outbound: ConnectionSender,
}

impl Coordinator {
    /// A coordinator that sends its moves into `outbound`.
    ///
    /// The connection status starts as `status`; the reader updates it
    /// when the stream ends.
    pub fn new(role: Role, outbound: ConnectionSender, status: ConnectionStatus) -> Self {
        let (status, _) = watch::channel(status);
        Self {
            shared: Arc::new(Shared {
                game: Mutex::new(GameState::new(role)),
                status,
            }),
            outbound,
        }
    }

    /// Take ownership of an established connection and start the
    /// background reader that applies the peer's messages.
    pub fn start(role: Role, conn: Connection, status: ConnectionStatus) -> (Self, JoinHandle<()>) {
        let coordinator = Self::new(role, conn.sender(), status);
        let reader = tokio::spawn(coordinator.clone().run_reader(conn));
        (coordinator, reader)
    }

    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.shared
            .game
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ── Local path ───────────────────────────────────────────────

    /// Place the local player's stone and announce it to the peer.
    ///
    /// The move is applied before it is sent, so the local board is
    /// never behind what the peer has been told.
    pub async fn apply_local_move(&self, x: i32, y: i32) -> Result<(), GomokuError> {
        let message = self.lock().apply_local_move(x, y)?;
        debug!(x, y, "local move applied");
        self.outbound.send(message).await?;
        Ok(())
    }

    /// Reset locally and ask the peer to reset too.
    pub async fn request_new_game(&self) -> Result<(), GomokuError> {
        self.apply_new_game();
        self.outbound.send(Message::NewGame).await?;
        Ok(())
    }

    // ── Remote path ──────────────────────────────────────────────

    /// Place the peer's stone. Never writes to the network.
    pub fn apply_remote_move(&self, x: usize, y: usize) -> Result<(), MoveError> {
        let mut game = self.lock();
        game.apply_remote_move(x, y)?;
        if let Some(winner) = game.winner() {
            info!(%winner, "peer completed five in a row");
        }
        Ok(())
    }

    /// Reset board, turn and winner to the opening position.
    pub fn apply_new_game(&self) {
        self.lock().reset();
        info!("new game");
    }

    /// Apply one item from the connection.
    ///
    /// Returns the terminal error once the stream has ended, `None`
    /// while the reader should keep going.
    pub fn handle_inbound(&self, item: Inbound) -> Option<GomokuError> {
        match item {
            Ok(Message::Move { x, y }) => {
                if let Err(e) = self.apply_remote_move(x, y) {
                    warn!(x, y, error = %e, "peer sent an illegal move; ignoring");
                }
                None
            }
            Ok(Message::NewGame) => {
                self.apply_new_game();
                None
            }
            Err(e) => Some(e),
        }
    }

    /// Reader loop: apply messages in stream order until the stream ends.
    async fn run_reader(self, mut conn: Connection) {
        while let Some(item) = conn.recv().await {
            if let Some(e) = self.handle_inbound(item) {
                info!(error = %e, "connection closed");
                self.shared.status.send_modify(|status| {
                    if let Err(transition) = status.lose(e.to_string()) {
                        debug!(error = %transition, "status not updated");
                    }
                });
                return;
            }
        }
        // The connection was shut down from this side.
        debug!("reader stopped");
    }

    // ── Observers ────────────────────────────────────────────────

    /// A consistent copy of board, turn and winner.
    pub fn snapshot(&self) -> GameSnapshot {
        self.lock().snapshot()
    }

    pub fn board(&self) -> Board {
        self.lock().board().clone()
    }

    pub fn turn(&self) -> Stone {
        self.lock().turn()
    }

    pub fn winner(&self) -> Option<Stone> {
        self.lock().winner()
    }

    pub fn role(&self) -> Role {
        self.lock().role()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Receive every change to the connection status.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }
}

// ── Tests ────────────────────────────────────────────────────────
