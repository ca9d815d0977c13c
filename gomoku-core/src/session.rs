//! The single entry point the front end drives.
//!
//! A [`Session`] walks through [`SessionPhase`]: pick a role in the menu,
//! wait for the peer, play, and tear down again. The accept or connect
//! runs on its own task and completes a `oneshot` exactly once, so the UI
//! only ever polls and never blocks on the socket.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::ToSocketAddrs;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::board::{Board, Stone};
use crate::error::{GomokuError, MoveError};
use crate::game::{Coordinator, GameSnapshot};
use crate::network::{Connection, HostEndpoint, PeerAddr};
use crate::role::Role;
use crate::state::{ConnectionStatus, SessionPhase};

type ConnectResult = Result<Connection, GomokuError>;

/// An accept or connect still in flight.
#[derive(Debug)]
struct Pending {
    rx: oneshot::Receiver<ConnectResult>,
    task: JoinHandle<()>,
}

/// Everything that exists only while connected.
#[derive(Debug)]
struct ActiveGame {
    coordinator: Coordinator,
    reader: JoinHandle<()>,
    shutdown: CancellationToken,
}

#[derive(Debug, Default)]
pub struct Session {
    phase: SessionPhase,
    role: Option<Role>,
    // Status before the game starts; afterwards the coordinator owns it.
    status: ConnectionStatus,
    connect_timeout: Option<Duration>,
    pending: Option<Pending>,
    game: Option<ActiveGame>,
    last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up joining after `timeout`. Hosting waits indefinitely.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    // ── Connecting ───────────────────────────────────────────────

    /// Host on `port` on all interfaces. See [`Session::host_on`].
    pub async fn host(&mut self, port: u16) -> Result<SocketAddr, GomokuError> {
        self.host_on(("0.0.0.0", port)).await
    }

    /// Bind `addr` and wait for one guest in the background.
    ///
    /// Returns the bound address. A bind failure leaves the session in
    /// `Menu` with [`Session::last_error`] set.
    pub async fn host_on(&mut self, addr: impl ToSocketAddrs) -> Result<SocketAddr, GomokuError> {
        self.phase.host()?;
        self.last_error = None;

        let endpoint = match HostEndpoint::bind(addr).await {
            Ok(endpoint) => endpoint,
            Err(e) => return Err(self.connect_failed(e)),
        };
        let local = match endpoint.local_addr() {
            Ok(local) => local,
            Err(e) => return Err(self.connect_failed(e)),
        };
        if let Err(e) = self.status.begin_listen(local) {
            return Err(self.connect_failed(e));
        }
        self.role = Some(Role::Host);
        info!(%local, "waiting for guest");

        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = endpoint.accept_one().await;
            if tx.send(result).is_err() {
                debug!("guest arrived after the session gave up");
            }
        });
        self.pending = Some(Pending { rx, task });
        Ok(local)
    }

    /// Dial `addr` in the background.
    pub fn join(&mut self, addr: PeerAddr) -> Result<(), GomokuError> {
        self.phase.join()?;
        self.last_error = None;

        if let Err(e) = self.status.begin_connect(addr.to_string()) {
            return Err(self.connect_failed(e));
        }
        self.role = Some(Role::Guest);
        info!(%addr, "connecting to host");

        let limit = self.connect_timeout;
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = match limit {
                Some(limit) => tokio::time::timeout(limit, Connection::connect(&addr))
                    .await
                    .unwrap_or(Err(GomokuError::Timeout(limit))),
                None => Connection::connect(&addr).await,
            };
            if tx.send(result).is_err() {
                debug!("connect finished after the session gave up");
            }
        });
        self.pending = Some(Pending { rx, task });
        Ok(())
    }

    /// Check for a finished accept or connect without waiting.
    ///
    /// `Ok(true)` once the game is running, `Ok(false)` while still
    /// waiting. A failed attempt returns the error and the session is back
    /// in `Menu`.
    pub fn poll_connected(&mut self) -> Result<bool, GomokuError> {
        let Some(pending) = self.pending.as_mut() else {
            return Ok(self.phase.has_game());
        };
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return Ok(false),
            Err(oneshot::error::TryRecvError::Closed) => Err(GomokuError::Other(
                "connection task ended without a result".into(),
            )),
        };
        self.pending = None;
        self.finish_connect(result).map(|()| true)
    }

    /// Wait for the pending accept or connect to finish.
    pub async fn wait_connected(&mut self) -> Result<(), GomokuError> {
        let Some(pending) = self.pending.as_mut() else {
            return if self.phase.has_game() {
                Ok(())
            } else {
                Err(GomokuError::NotConnected)
            };
        };
        let result = match (&mut pending.rx).await {
            Ok(result) => result,
            Err(_) => Err(GomokuError::Other(
                "connection task ended without a result".into(),
            )),
        };
        self.pending = None;
        self.finish_connect(result)
    }

    /// Abandon a pending accept or connect and return to `Menu`.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
            info!("connection attempt cancelled");
        }
        if self.phase.is_connecting() {
            self.transition(SessionPhase::abort);
            self.status.force_disconnect();
            self.role = None;
        }
    }

    fn finish_connect(&mut self, result: ConnectResult) -> Result<(), GomokuError> {
        let conn = match result {
            Ok(conn) => conn,
            Err(e) => return Err(self.connect_failed(e)),
        };
        let Some(role) = self.role else {
            return Err(self.connect_failed(GomokuError::InvalidTransition(
                "connected without a role",
            )));
        };
        if let Err(e) = self.status.establish(conn.peer_addr()) {
            return Err(self.connect_failed(e));
        }
        self.phase.connected()?;

        let shutdown = conn.shutdown_handle();
        let (coordinator, reader) = Coordinator::start(role, conn, self.status.clone());
        info!(%role, stone = %role.stone(), "game started");
        self.game = Some(ActiveGame {
            coordinator,
            reader,
            shutdown,
        });
        Ok(())
    }

    fn connect_failed(&mut self, e: GomokuError) -> GomokuError {
        warn!(error = %e, phase = %self.phase, "connection attempt failed");
        self.last_error = Some(e.to_string());
        self.pending = None;
        self.transition(SessionPhase::abort);
        self.status.force_disconnect();
        self.role = None;
        e
    }

    // ── Playing ──────────────────────────────────────────────────

    /// The local player clicked cell `(x, y)`.
    ///
    /// Illegal moves change nothing and come back as
    /// [`GomokuError::Move`], which the UI may show or ignore.
    pub async fn on_local_click(&mut self, x: i32, y: i32) -> Result<(), GomokuError> {
        match self.phase {
            SessionPhase::Active => {}
            SessionPhase::Finished => return Err(MoveError::GameAlreadyOver.into()),
            _ => return Err(GomokuError::NotConnected),
        }
        let coordinator = self.coordinator()?.clone();
        let result = coordinator.apply_local_move(x, y).await;
        if let Err(e) = &result {
            debug!(x, y, error = %e, "click ignored");
        }
        self.refresh();
        result
    }

    /// Start a new round on the same connection and tell the peer.
    pub async fn on_new_game_requested(&mut self) -> Result<(), GomokuError> {
        if !self.phase.has_game() {
            return Err(GomokuError::NotConnected);
        }
        let coordinator = self.coordinator()?.clone();
        if !coordinator.connection_status().is_connected() {
            return Err(GomokuError::PeerDisconnected);
        }
        coordinator.request_new_game().await?;
        if self.phase == SessionPhase::Finished {
            self.transition(SessionPhase::rematch);
        }
        Ok(())
    }

    /// Bring the phase up to date with the connection and the board.
    ///
    /// Called by the UI on every tick.
    pub fn refresh(&mut self) {
        if self.phase.is_connecting() {
            if let Err(e) = self.poll_connected() {
                debug!(error = %e, "still in menu");
            }
            return;
        }

        let Some((snapshot, status)) = self.game.as_ref().map(|game| {
            (
                game.coordinator.snapshot(),
                game.coordinator.connection_status(),
            )
        }) else {
            return;
        };

        match self.phase {
            SessionPhase::Active if snapshot.is_over() => {
                match snapshot.winner {
                    Some(winner) => info!(%winner, "round finished"),
                    None => info!("round drawn"),
                }
                self.transition(SessionPhase::finish);
            }
            SessionPhase::Active => {
                if let ConnectionStatus::Lost { reason } = status {
                    warn!(%reason, "connection lost mid-game");
                    self.teardown();
                    self.last_error = Some(GomokuError::PeerDisconnected.to_string());
                }
            }
            SessionPhase::Finished => {
                if let ConnectionStatus::Lost { reason } = &status {
                    if self.last_error.is_none() {
                        self.last_error = Some(reason.clone());
                    }
                } else if !snapshot.is_over() {
                    // The peer asked for a rematch.
                    self.transition(SessionPhase::rematch);
                }
            }
            _ => {}
        }
    }

    /// Leave a finished round: shut the connection down and return to
    /// `Menu`.
    pub fn play_again(&mut self) -> Result<(), GomokuError> {
        if self.phase != SessionPhase::Finished {
            return Err(GomokuError::InvalidTransition(
                "cannot play again: round not finished",
            ));
        }
        self.teardown();
        self.last_error = None;
        Ok(())
    }

    /// Drop whatever is running and return to `Menu` from any phase.
    pub fn disconnect(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
        if let Some(game) = self.game.take() {
            game.shutdown.cancel();
            game.reader.abort();
            info!("session closed");
        }
        self.phase.reset();
        self.status.force_disconnect();
        self.role = None;
    }

    fn transition(&mut self, f: impl FnOnce(&mut SessionPhase) -> Result<(), GomokuError>) {
        if let Err(e) = f(&mut self.phase) {
            warn!(error = %e, phase = %self.phase, "phase not changed");
        }
    }

    // ── Observers ────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// `None` in the menu.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// The live board, or an empty one when no game is running.
    pub fn board(&self) -> Board {
        self.game
            .as_ref()
            .map(|game| game.coordinator.board())
            .unwrap_or_default()
    }

    pub fn turn(&self) -> Option<Stone> {
        self.game.as_ref().map(|game| game.coordinator.turn())
    }

    pub fn winner(&self) -> Option<Stone> {
        self.game.as_ref().and_then(|game| game.coordinator.winner())
    }

    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.game.as_ref().map(|game| game.coordinator.snapshot())
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        match &self.game {
            Some(game) => game.coordinator.connection_status(),
            None => self.status.clone(),
        }
    }

    /// Status updates while a game is running.
    pub fn subscribe_status(&self) -> Option<watch::Receiver<ConnectionStatus>> {
        self.game
            .as_ref()
            .map(|game| game.coordinator.subscribe_status())
    }

    /// The most recent connection failure, for display.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn coordinator(&self) -> Result<&Coordinator, GomokuError> {
        self.game
            .as_ref()
            .map(|game| &game.coordinator)
            .ok_or(GomokuError::NotConnected)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
        if let Some(game) = self.game.take() {
            game.shutdown.cancel();
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
