//! The 15×15 playing grid and five-in-a-row detection.

use std::fmt;

use crate::error::MoveError;

// ── Constants ────────────────────────────────────────────────────

/// Width and height of the board.
pub const BOARD_SIZE: usize = 15;

/// Number of consecutive stones needed to win.
pub const WIN_LENGTH: usize = 5;

/// Scan directions as `(dx, dy)`: horizontal, vertical, ↘, ↗.
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

// ── Stone ────────────────────────────────────────────────────────

/// A player's colour. Black (player A) always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    /// The other colour.
    pub fn opponent(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Black => write!(f, "Black"),
            Stone::White => write!(f, "White"),
        }
    }
}

// ── Board ────────────────────────────────────────────────────────

/// An N×N grid of cells, each empty or holding one stone.
///
/// Cells are indexed `(x, y)` = (column, row), both 0-based. A cell is
/// written at most once between resets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Stone>; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Put `stone` on the empty cell at `(x, y)`.
    pub fn place(&mut self, x: i32, y: i32, stone: Stone) -> Result<(), MoveError> {
        let (cx, cy) = Self::index(x, y).ok_or(MoveError::OutOfBounds { x, y })?;
        let cell = &mut self.cells[cy][cx];
        if cell.is_some() {
            return Err(MoveError::CellOccupied { x: cx, y: cy });
        }
        *cell = Some(stone);
        Ok(())
    }

    /// Returns `true` if `stone` has five in a row anywhere on the board.
    ///
    /// Scans every cell owned by `stone` and looks forward along each of
    /// the four directions, so each run is found from its first stone.
    pub fn check_win(&self, stone: Stone) -> bool {
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                if self.cells[y][x] != Some(stone) {
                    continue;
                }
                if DIRECTIONS
                    .iter()
                    .any(|&(dx, dy)| self.run_from(x, y, dx, dy, stone) >= WIN_LENGTH)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Clear every cell.
    pub fn reset(&mut self) {
        self.cells = [[None; BOARD_SIZE]; BOARD_SIZE];
    }

    /// The stone at `(x, y)`, or `None` if the cell is empty or off-board.
    pub fn get(&self, x: usize, y: usize) -> Option<Stone> {
        self.cells.get(y).and_then(|row| row.get(x)).copied().flatten()
    }

    /// Rows from top (`y = 0`) to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Stone>; BOARD_SIZE]> {
        self.cells.iter()
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Returns `true` once no empty cell is left.
    pub fn is_full(&self) -> bool {
        self.stone_count() == BOARD_SIZE * BOARD_SIZE
    }

    /// Returns `true` if no stone has been placed.
    pub fn is_empty(&self) -> bool {
        self.stone_count() == 0
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn index(x: i32, y: i32) -> Option<(usize, usize)> {
        let cx = usize::try_from(x).ok().filter(|&v| v < BOARD_SIZE)?;
        let cy = usize::try_from(y).ok().filter(|&v| v < BOARD_SIZE)?;
        Some((cx, cy))
    }

    /// Length of the run of `stone` starting at `(x, y)`, capped at
    /// `WIN_LENGTH`.
    fn run_from(&self, x: usize, y: usize, dx: isize, dy: isize, stone: Stone) -> usize {
        let mut len = 0;
        let (mut cx, mut cy) = (x as isize, y as isize);
        while len < WIN_LENGTH {
            let in_bounds = (0..BOARD_SIZE as isize).contains(&cx) && (0..BOARD_SIZE as isize).contains(&cy);
            if !in_bounds || self.cells[cy as usize][cx as usize] != Some(stone) {
                break;
            }
            len += 1;
            cx += dx;
            cy += dy;
        }
        len
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(stones: &[(i32, i32)], stone: Stone) -> Board {
        let mut board = Board::new();
        for &(x, y) in stones {
            board.place(x, y, stone).unwrap();
        }
        board
    }

    #[test]
    fn place_once_then_occupied() {
        let mut board = Board::new();
        for y in 0..BOARD_SIZE as i32 {
            for x in 0..BOARD_SIZE as i32 {
                board.place(x, y, Stone::Black).unwrap();
                assert_eq!(
                    board.place(x, y, Stone::White),
                    Err(MoveError::CellOccupied { x: x as usize, y: y as usize })
                );
                assert_eq!(board.get(x as usize, y as usize), Some(Stone::Black));
            }
        }
        assert!(board.is_full());
    }

    #[test]
    fn out_of_bounds_leaves_board_unchanged() {
        let mut board = Board::new();
        board.place(0, 0, Stone::White).unwrap();
        let before = board.clone();

        for (x, y) in [(-1, 0), (0, -1), (15, 0), (0, 15), (15, 15), (-3, 20), (i32::MAX, 2)] {
            assert_eq!(
                board.place(x, y, Stone::Black),
                Err(MoveError::OutOfBounds { x, y })
            );
        }
        assert_eq!(board, before);
    }

    #[test]
    fn empty_board_has_no_winner() {
        let board = Board::new();
        assert!(!board.check_win(Stone::Black));
        assert!(!board.check_win(Stone::White));
        assert!(board.is_empty());
    }

    #[test]
    fn four_in_a_row_is_not_a_win() {
        let board = board_with(&[(3, 3), (4, 3), (5, 3), (6, 3)], Stone::Black);
        assert!(!board.check_win(Stone::Black));
    }

    #[test]
    fn horizontal_win() {
        let board = board_with(&[(10, 0), (11, 0), (12, 0), (13, 0), (14, 0)], Stone::White);
        assert!(board.check_win(Stone::White));
        assert!(!board.check_win(Stone::Black));
    }

    #[test]
    fn vertical_win() {
        let board = board_with(&[(0, 10), (0, 11), (0, 12), (0, 13), (0, 14)], Stone::Black);
        assert!(board.check_win(Stone::Black));
    }

    #[test]
    fn falling_diagonal_win() {
        let board = board_with(&[(2, 2), (3, 3), (4, 4), (5, 5), (6, 6)], Stone::Black);
        assert!(board.check_win(Stone::Black));
    }

    #[test]
    fn rising_diagonal_win() {
        let board = board_with(&[(0, 14), (1, 13), (2, 12), (3, 11), (4, 10)], Stone::White);
        assert!(board.check_win(Stone::White));
    }

    #[test]
    fn broken_run_is_not_a_win() {
        let mut board = board_with(&[(0, 7), (1, 7), (3, 7), (4, 7), (5, 7)], Stone::Black);
        board.place(2, 7, Stone::White).unwrap();
        assert!(!board.check_win(Stone::Black));
    }

    #[test]
    fn runs_do_not_wrap_around_edges() {
        let board = board_with(&[(12, 4), (13, 4), (14, 4), (0, 5), (1, 5)], Stone::Black);
        assert!(!board.check_win(Stone::Black));
    }

    #[test]
    fn overline_counts_as_win() {
        let board = board_with(&[(4, 9), (5, 9), (6, 9), (7, 9), (8, 9), (9, 9)], Stone::White);
        assert!(board.check_win(Stone::White));
    }

    #[test]
    fn reset_clears_every_cell() {
        let mut board = board_with(&[(1, 1), (2, 2), (14, 14)], Stone::Black);
        assert_eq!(board.stone_count(), 3);
        board.reset();
        assert!(board.is_empty());
        assert_eq!(board, Board::new());
    }

    #[test]
    fn get_off_board_is_none() {
        let board = board_with(&[(14, 14)], Stone::Black);
        assert_eq!(board.get(14, 14), Some(Stone::Black));
        assert_eq!(board.get(15, 14), None);
        assert_eq!(board.get(14, 15), None);
    }

    #[test]
    fn opponent_flips() {
        assert_eq!(Stone::Black.opponent(), Stone::White);
        assert_eq!(Stone::White.opponent(), Stone::Black);
    }
}
