//! Board, turn and winner as one unit, with the placement rules.
//!
//! `GameState` does no I/O and no locking; [`super::Coordinator`] wraps
//! it in a mutex and wires it to the connection.

use tracing::warn;

use crate::board::{Board, Stone};
use crate::error::MoveError;
use crate::message::Message;
use crate::role::Role;

/// Colour that opens every round.
pub const FIRST_TO_MOVE: Stone = Stone::Black;

#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    turn: Stone,
    winner: Option<Stone>,
    role: Role,
    last_move: Option<(usize, usize)>,
}

impl GameState {
    /// A fresh round for the given local role.
    pub fn new(role: Role) -> Self {
        Self {
            board: Board::new(),
            turn: FIRST_TO_MOVE,
            winner: None,
            role,
            last_move: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Stone {
        self.turn
    }

    pub fn winner(&self) -> Option<Stone> {
        self.winner
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn last_move(&self) -> Option<(usize, usize)> {
        self.last_move
    }

    /// Returns `true` if the local player may place now.
    pub fn is_local_turn(&self) -> bool {
        self.winner.is_none() && self.turn == self.role.stone()
    }

    /// Returns `true` once the board filled up without a winner.
    pub fn is_draw(&self) -> bool {
        self.winner.is_none() && self.board.is_full()
    }

    /// Returns `true` when the round has a winner or is drawn.
    pub fn is_over(&self) -> bool {
        self.winner.is_some() || self.board.is_full()
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Place the local player's stone.
    ///
    /// On success returns the message announcing the move to the peer.
    /// On failure nothing changes.
    pub fn apply_local_move(&mut self, x: i32, y: i32) -> Result<Message, MoveError> {
        let (x, y) = self.place(x, y, self.role.stone(), true)?;
        Ok(Message::Move { x, y })
    }

    /// Place the peer's stone at the coordinates it announced.
    ///
    /// Bounds, occupancy and game-over are checked as for a local move.
    /// A move sent out of turn is still applied, since the stream order
    /// is authoritative, but it is logged. Either way the turn flips.
    pub fn apply_remote_move(&mut self, x: usize, y: usize) -> Result<(), MoveError> {
        let x = i32::try_from(x).unwrap_or(i32::MAX);
        let y = i32::try_from(y).unwrap_or(i32::MAX);
        let stone = self.role.opponent_stone();
        let out_of_turn = self.turn != stone;
        self.place(x, y, stone, false)?;
        if out_of_turn {
            warn!(x, y, "peer moved out of turn");
        }
        Ok(())
    }

    /// Back to the opening position. The role is kept.
    pub fn reset(&mut self) {
        self.board.reset();
        self.turn = FIRST_TO_MOVE;
        self.winner = None;
        self.last_move = None;
    }

    /// Winner is checked before turn, so a click after the game ended
    /// always reports `GameAlreadyOver`. Every placement flips the turn.
    fn place(&mut self, x: i32, y: i32, stone: Stone, check_turn: bool) -> Result<(usize, usize), MoveError> {
        if self.winner.is_some() {
            return Err(MoveError::GameAlreadyOver);
        }
        if check_turn && self.turn != stone {
            return Err(MoveError::NotYourTurn);
        }
        self.board.place(x, y, stone)?;

        // `Board::place` only succeeds for in-range coordinates.
        let cell = (x as usize, y as usize);
        self.last_move = Some(cell);
        self.turn = self.turn.opponent();
        if self.board.check_win(stone) {
            self.winner = Some(stone);
        }
        Ok(cell)
    }

    /// A consistent copy for display.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.clone(),
            turn: self.turn,
            winner: self.winner,
            role: self.role,
            last_move: self.last_move,
        }
    }
}

// ── GameSnapshot ─────────────────────────────────────────────────

/// A point-in-time copy of the shared game, taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board: Board,
    pub turn: Stone,
    pub winner: Option<Stone>,
    pub role: Role,
    pub last_move: Option<(usize, usize)>,
}

impl GameSnapshot {
    pub fn is_local_turn(&self) -> bool {
        self.winner.is_none() && self.turn == self.role.stone()
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none() && self.board.is_full()
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some() || self.board.is_full()
    }

    /// `Some(true)` if the local player won, `Some(false)` if the peer
    /// did, `None` while undecided or drawn.
    pub fn local_won(&self) -> Option<bool> {
        self.winner.map(|w| w == self.role.stone())
    }
}

/// Every cell of the board in an order that fills it without a five.
///
/// Black cells (113) and White cells (112) alternate, Black first, so the
/// list is legal from the opening position. Cells come in pairs along each
/// row and the pattern shifts every row, so no line ever holds more than
/// two stones of one colour.
#[cfg(test)]
pub(crate) fn draw_sequence() -> Vec<(usize, usize)> {
    use crate::board::BOARD_SIZE;

    let cells = (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| (x, y)));
    let (black, white): (Vec<_>, Vec<_>) = cells.partition(|&(x, y)| (x / 2 + y) % 2 == 0);

    let mut order = Vec::with_capacity(BOARD_SIZE * BOARD_SIZE);
    let mut white = white.into_iter();
    for cell in black {
        order.push(cell);
        order.extend(white.next());
    }
    order
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_round_starts_with_host() {
        let host = GameState::new(Role::Host);
        assert_eq!(host.turn(), Stone::Black);
        assert!(host.is_local_turn());

        let guest = GameState::new(Role::Guest);
        assert_eq!(guest.turn(), Stone::Black);
        assert!(!guest.is_local_turn());
    }

    #[test]
    fn local_move_off_turn_changes_nothing() {
        let mut guest = GameState::new(Role::Guest);
        let before = guest.snapshot();
        assert_eq!(guest.apply_local_move(7, 7), Err(MoveError::NotYourTurn));
        assert_eq!(guest.snapshot(), before);
    }

    #[test]
    fn local_move_flips_turn_and_announces() {
        let mut host = GameState::new(Role::Host);
        let turn_before = host.turn();
        assert_eq!(host.apply_local_move(7, 3), Ok(Message::Move { x: 7, y: 3 }));
        assert_eq!(host.turn(), turn_before.opponent());
        assert_eq!(host.board().get(7, 3), Some(Stone::Black));
        assert_eq!(host.last_move(), Some((7, 3)));
        assert_eq!(host.winner(), None);
    }

    #[test]
    fn rejected_local_move_keeps_turn() {
        let mut host = GameState::new(Role::Host);
        assert!(matches!(
            host.apply_local_move(-1, 3),
            Err(MoveError::OutOfBounds { .. })
        ));
        assert_eq!(host.turn(), Stone::Black);
        assert!(host.board().is_empty());
    }

    #[test]
    fn remote_move_uses_opponent_colour() {
        let mut guest = GameState::new(Role::Guest);
        guest.apply_remote_move(7, 7).unwrap();
        assert_eq!(guest.board().get(7, 7), Some(Stone::Black));
        assert_eq!(guest.turn(), Stone::White);
        assert!(guest.is_local_turn());
    }

    #[test]
    fn remote_move_out_of_turn_still_flips_turn() {
        let mut guest = GameState::new(Role::Guest);
        guest.apply_remote_move(1, 1).unwrap();
        assert_eq!(guest.turn(), Stone::White);

        guest.apply_remote_move(2, 2).unwrap();
        assert_eq!(guest.board().get(1, 1), Some(Stone::Black));
        assert_eq!(guest.board().get(2, 2), Some(Stone::Black));
        assert_eq!(guest.turn(), Stone::Black);
        assert_eq!(guest.last_move(), Some((2, 2)));
    }

    #[test]
    fn remote_move_on_occupied_cell_is_rejected() {
        let mut host = GameState::new(Role::Host);
        host.apply_local_move(5, 5).unwrap();
        assert_eq!(
            host.apply_remote_move(5, 5),
            Err(MoveError::CellOccupied { x: 5, y: 5 })
        );
        assert_eq!(host.turn(), Stone::White);
    }

    #[test]
    fn remote_move_out_of_range_is_rejected() {
        let mut host = GameState::new(Role::Host);
        host.apply_local_move(0, 0).unwrap();
        assert!(matches!(
            host.apply_remote_move(usize::MAX, 0),
            Err(MoveError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn vertical_five_wins_exactly_on_fifth_stone() {
        let mut host = GameState::new(Role::Host);
        // Host builds column 7 from row 7 upwards; guest answers in column 8.
        let host_moves = [(7, 7), (7, 6), (7, 5), (7, 4), (7, 3)];
        let guest_moves = [(8, 7), (8, 6), (8, 5), (8, 4)];

        for (i, &(x, y)) in host_moves.iter().enumerate() {
            host.apply_local_move(x, y).unwrap();
            if i < 4 {
                assert_eq!(host.winner(), None, "won too early at stone {}", i + 1);
                assert!(!host.board().check_win(Stone::Black));
                let (gx, gy) = guest_moves[i];
                host.apply_remote_move(gx, gy).unwrap();
            }
        }
        assert_eq!(host.winner(), Some(Stone::Black));
        assert!(host.snapshot().local_won().unwrap());
        assert!(host.is_over());
    }

    #[test]
    fn no_moves_after_win() {
        let mut guest = GameState::new(Role::Guest);
        for i in 0..5 {
            guest.apply_remote_move(i, 0).unwrap();
            if i < 4 {
                guest.apply_local_move(i as i32, 1).unwrap();
            }
        }
        assert_eq!(guest.winner(), Some(Stone::Black));
        assert_eq!(guest.snapshot().local_won(), Some(false));

        let before = guest.snapshot();
        assert_eq!(guest.apply_local_move(10, 10), Err(MoveError::GameAlreadyOver));
        assert_eq!(guest.apply_remote_move(11, 11), Err(MoveError::GameAlreadyOver));
        assert_eq!(guest.snapshot(), before);
    }

    #[test]
    fn full_board_without_five_is_a_draw() {
        let mut host = GameState::new(Role::Host);
        for (i, (x, y)) in draw_sequence().into_iter().enumerate() {
            assert!(!host.is_over(), "ended early at move {}", i + 1);
            if i % 2 == 0 {
                host.apply_local_move(x as i32, y as i32).unwrap();
            } else {
                host.apply_remote_move(x, y).unwrap();
            }
        }

        assert!(host.board().is_full());
        assert!(host.is_over());
        assert!(host.is_draw());
        assert_eq!(host.winner(), None);
        assert!(!host.is_local_turn());

        let snapshot = host.snapshot();
        assert!(snapshot.is_draw());
        assert_eq!(snapshot.local_won(), None);
    }

    #[test]
    fn reset_after_win_restores_opening() {
        let mut host = GameState::new(Role::Host);
        for i in 0..5 {
            host.apply_local_move(i, 0).unwrap();
            if i < 4 {
                host.apply_remote_move(i as usize, 1).unwrap();
            }
        }
        assert!(host.winner().is_some());

        host.reset();
        assert_eq!(host.winner(), None);
        assert!(host.board().is_empty());
        assert_eq!(host.turn(), Stone::Black);
        assert_eq!(host.last_move(), None);
        assert_eq!(host.role(), Role::Host);
    }
}
