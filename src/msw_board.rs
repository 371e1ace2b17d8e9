// Minesweeper board engine
// Owns the mine layout, reveal and flag state; implements mine placement,
// adjacency counting and the flood-fill reveal

use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while building or initializing a board
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("board dimensions must be positive (got {rows}x{cols})")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("too many mines: {mines} requested for a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
    #[error("mine position ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("mines have already been placed on this board")]
    MinesAlreadyPlaced,
    #[error("mines must be placed before adjacency counts are computed")]
    MinesNotPlaced,
    #[error("adjacency counts have already been computed")]
    AdjacencyAlreadyComputed,
}

/// What a reveal request did to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    NoOp,                // Nothing changed
    Revealed,            // One safe cell exposed
    RevealedMine,        // A mine was exposed; the board is lost
    RevealedAndCascaded, // A zero cell exposed its surrounding region
}

impl RevealOutcome {
    /// Whether the board changed and the caller should re-render
    pub fn has_update(self) -> bool {
        !matches!(self, RevealOutcome::NoOp)
    }
}

/// Board-level game state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardStatus {
    InProgress,
    Won,
    Lost,
}

impl BoardStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, BoardStatus::Won | BoardStatus::Lost)
    }
}

/// Initialization progress: mines first, then adjacency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Empty,
    Mined,
    Ready,
}

/// Immutable content of a cell once the board is ready
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    mine: bool, // Contains a mine
    adj: u8,    // Adjacent mine count (0-8), unused for mines
}

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// In-bounds neighbors of (row, col) on a rows x cols grid
fn neighbors(rows: usize, cols: usize, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
    NEIGHBOR_OFFSETS.into_iter().filter_map(move |(dr, dc)| {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < rows && c < cols).then_some((r, c))
    })
}

/// A single game board
///
/// State lives in flat vectors indexed by `row * cols + col`. A board goes
/// through `new` -> `generate_mines` -> `compute_adjacency` before it accepts
/// moves; [`Board::generate`] and [`Board::with_mines`] do all of it at once.
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    mines: usize,
    cells: Vec<Cell>,
    revealed: Vec<bool>,
    flagged: Vec<bool>,
    revealed_count: usize, // Revealed safe cells
    flagged_count: usize,
    phase: Phase,
    status: BoardStatus,
    detonated: Option<(usize, usize)>,
}

impl Board {
    /// Allocate an empty board. Fails if a dimension is zero or the mines
    /// would not leave at least one safe cell.
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self, BoardError> {
        let cells = match rows.checked_mul(cols) {
            Some(n) if n > 0 => n,
            _ => return Err(BoardError::InvalidDimensions { rows, cols }),
        };
        if mines >= cells {
            return Err(BoardError::TooManyMines { mines, cells });
        }
        Ok(Board {
            rows,
            cols,
            mines,
            cells: vec![Cell::default(); cells],
            revealed: vec![false; cells],
            flagged: vec![false; cells],
            revealed_count: 0,
            flagged_count: 0,
            phase: Phase::Empty,
            status: BoardStatus::InProgress,
            detonated: None,
        })
    }

    /// Build a playable board with randomly placed mines
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        let mut board = Board::new(rows, cols, mines)?;
        board.generate_mines(rng)?;
        board.compute_adjacency()?;
        Ok(board)
    }

    /// Build a playable board from explicit mine positions.
    /// Duplicate positions count once.
    pub fn with_mines(rows: usize, cols: usize, positions: &[(usize, usize)]) -> Result<Self, BoardError> {
        let mut board = Board::new(rows, cols, 0)?;
        for &(row, col) in positions {
            if !board.contains(row, col) {
                return Err(BoardError::OutOfBounds { row, col });
            }
            let idx = board.index(row, col);
            board.cells[idx].mine = true;
        }
        let mines = board.cells.iter().filter(|c| c.mine).count();
        if mines >= board.cells.len() {
            return Err(BoardError::TooManyMines {
                mines,
                cells: board.cells.len(),
            });
        }
        board.mines = mines;
        board.phase = Phase::Mined;
        board.compute_adjacency()?;
        Ok(board)
    }

    /// Place `mine_count` mines uniformly at random.
    /// Draws a coordinate and redraws whenever it already holds a mine.
    pub fn generate_mines<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), BoardError> {
        if self.phase != Phase::Empty {
            return Err(BoardError::MinesAlreadyPlaced);
        }
        let mut placed = 0;
        let mut draws = 0usize;
        while placed < self.mines {
            let row = rng.gen_range(0..self.rows);
            let col = rng.gen_range(0..self.cols);
            draws += 1;
            let idx = self.index(row, col);
            if !self.cells[idx].mine {
                self.cells[idx].mine = true;
                placed += 1;
            }
        }
        self.phase = Phase::Mined;
        debug!(rows = self.rows, cols = self.cols, mines = self.mines, draws, "mines placed");
        Ok(())
    }

    /// Count mined neighbors for every safe cell. Runs exactly once, after placement.
    pub fn compute_adjacency(&mut self) -> Result<(), BoardError> {
        match self.phase {
            Phase::Empty => return Err(BoardError::MinesNotPlaced),
            Phase::Ready => return Err(BoardError::AdjacencyAlreadyComputed),
            Phase::Mined => {}
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = self.index(row, col);
                if self.cells[idx].mine {
                    continue;
                }
                let adj = neighbors(self.rows, self.cols, row, col)
                    .filter(|&(r, c)| self.cells[self.index(r, c)].mine)
                    .count();
                self.cells[idx].adj = adj as u8;
            }
        }
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Reveal a cell, cascading through zero-count regions.
    ///
    /// Out-of-bounds, revealed and flagged cells are no-ops, as is any move
    /// on a board that is not ready or already finished.
    pub fn reveal(&mut self, row: usize, col: usize) -> RevealOutcome {
        if !self.accepts_moves() || !self.contains(row, col) {
            return RevealOutcome::NoOp;
        }
        let idx = self.index(row, col);
        if self.revealed[idx] || self.flagged[idx] {
            return RevealOutcome::NoOp;
        }

        self.revealed[idx] = true;
        if self.cells[idx].mine {
            self.status = BoardStatus::Lost;
            self.detonated = Some((row, col));
            debug!(row, col, "mine revealed");
            return RevealOutcome::RevealedMine;
        }
        self.revealed_count += 1;

        let mut cascaded = 0usize;
        if self.cells[idx].adj == 0 {
            // Work-list flood fill. Cells are marked before being queued, so
            // each one is visited at most once. Neighbors of a zero cell are
            // never mines.
            let mut pending = vec![(row, col)];
            while let Some((r, c)) = pending.pop() {
                for (nr, nc) in neighbors(self.rows, self.cols, r, c) {
                    let nidx = self.index(nr, nc);
                    if self.revealed[nidx] || self.flagged[nidx] {
                        continue;
                    }
                    self.revealed[nidx] = true;
                    self.revealed_count += 1;
                    cascaded += 1;
                    if self.cells[nidx].adj == 0 {
                        pending.push((nr, nc));
                    }
                }
            }
        }
        trace!(row, col, cascaded, "cell revealed");

        if self.is_board_cleared() {
            self.status = BoardStatus::Won;
            debug!(revealed = self.revealed_count, "board cleared");
        }
        if cascaded > 0 {
            RevealOutcome::RevealedAndCascaded
        } else {
            RevealOutcome::Revealed
        }
    }

    /// Toggle the flag on a hidden cell and return the resulting flag state.
    /// Revealed cells, out-of-bounds cells and finished boards are left alone.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> bool {
        if !self.contains(row, col) {
            return false;
        }
        let idx = self.index(row, col);
        if !self.accepts_moves() || self.revealed[idx] {
            return self.flagged[idx];
        }
        self.flagged[idx] = !self.flagged[idx];
        if self.flagged[idx] {
            self.flagged_count += 1;
        } else {
            self.flagged_count -= 1;
        }
        trace!(row, col, flagged = self.flagged[idx], "flag toggled");
        self.flagged[idx]
    }

    /// True once every safe cell has been revealed. Flags play no part.
    pub fn is_board_cleared(&self) -> bool {
        self.revealed_count == self.cells.len() - self.mines
    }

    pub fn status(&self) -> BoardStatus {
        self.status
    }

    /// Ready for play: mines placed, adjacency computed, game not over
    pub fn accepts_moves(&self) -> bool {
        self.phase == Phase::Ready && self.status == BoardStatus::InProgress
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    /// Number of revealed safe cells
    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged_count
    }

    /// Mine counter value (total mines - flags). Negative when over-flagged.
    pub fn remaining_mines(&self) -> isize {
        self.mines as isize - self.flagged_count as isize
    }

    /// The mine whose reveal lost the game
    pub fn detonated(&self) -> Option<(usize, usize)> {
        self.detonated
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    // Accessors below panic on out-of-bounds coordinates

    pub fn is_mine(&self, row: usize, col: usize) -> bool {
        self.cells[self.checked_index(row, col)].mine
    }

    pub fn is_revealed(&self, row: usize, col: usize) -> bool {
        self.revealed[self.checked_index(row, col)]
    }

    pub fn is_flagged(&self, row: usize, col: usize) -> bool {
        self.flagged[self.checked_index(row, col)]
    }

    /// Mined neighbors of a safe cell. Always 0 for mines.
    pub fn adjacent_count(&self, row: usize, col: usize) -> u8 {
        self.cells[self.checked_index(row, col)].adj
    }

    /// Coordinates of every mine, row-major
    pub fn mines(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.mine)
            .map(|(i, _)| (i / self.cols, i % self.cols))
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn checked_index(&self, row: usize, col: usize) -> usize {
        assert!(
            self.contains(row, col),
            "cell ({row}, {col}) is outside a {}x{} board",
            self.rows,
            self.cols
        );
        self.index(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn brute_force_adjacency(board: &Board, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for r in row as i64 - 1..=row as i64 + 1 {
            for c in col as i64 - 1..=col as i64 + 1 {
                if (r, c) == (row as i64, col as i64) || r < 0 || c < 0 {
                    continue;
                }
                let (r, c) = (r as usize, c as usize);
                if board.contains(r, c) && board.is_mine(r, c) {
                    count += 1;
                }
            }
        }
        count
    }

    fn revealed_cells(board: &Board) -> usize {
        (0..board.rows())
            .flat_map(|r| (0..board.cols()).map(move |c| (r, c)))
            .filter(|&(r, c)| board.is_revealed(r, c))
            .count()
    }

    // 4x5 with a full wall of mines in column 3
    fn walled_board() -> Board {
        Board::with_mines(4, 5, &[(0, 3), (1, 3), (2, 3), (3, 3)]).unwrap()
    }

    #[test]
    fn new_rejects_invalid_configurations() {
        assert_eq!(
            Board::new(0, 5, 1).unwrap_err(),
            BoardError::InvalidDimensions { rows: 0, cols: 5 }
        );
        assert_eq!(
            Board::new(5, 0, 1).unwrap_err(),
            BoardError::InvalidDimensions { rows: 5, cols: 0 }
        );
        assert_eq!(
            Board::new(3, 3, 9).unwrap_err(),
            BoardError::TooManyMines { mines: 9, cells: 9 }
        );
        assert!(Board::new(3, 3, 8).is_ok());
        assert!(Board::new(1, 1, 0).is_ok());
    }

    #[test]
    fn generate_places_exact_mine_count() {
        let configs = [(9, 9, 10), (16, 16, 40), (16, 30, 99), (3, 3, 8), (1, 2, 1), (5, 5, 0)];
        for seed in 0..8u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for &(rows, cols, mines) in &configs {
                let board = Board::generate(rows, cols, mines, &mut rng).unwrap();
                assert_eq!(board.mines().count(), mines, "{rows}x{cols}/{mines} seed {seed}");
                assert_eq!(board.mine_count(), mines);
                assert!(board.accepts_moves());
            }
        }
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let a = Board::generate(16, 30, 99, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = Board::generate(16, 30, 99, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.mines().collect::<Vec<_>>(), b.mines().collect::<Vec<_>>());
    }

    #[test]
    fn initialization_order_is_enforced() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut board = Board::new(4, 4, 3).unwrap();
        assert_eq!(board.compute_adjacency(), Err(BoardError::MinesNotPlaced));
        assert_eq!(board.reveal(0, 0), RevealOutcome::NoOp);
        assert!(!board.toggle_flag(0, 0));

        board.generate_mines(&mut rng).unwrap();
        assert_eq!(board.generate_mines(&mut rng), Err(BoardError::MinesAlreadyPlaced));
        assert!(!board.accepts_moves());

        board.compute_adjacency().unwrap();
        assert_eq!(board.compute_adjacency(), Err(BoardError::AdjacencyAlreadyComputed));
        assert_eq!(board.mines().count(), 3);
        assert!(board.accepts_moves());
    }

    #[test]
    fn adjacency_matches_brute_force() {
        let layouts: [&[(usize, usize)]; 3] = [
            &[(0, 0)],
            &[(0, 3), (1, 3), (2, 3), (3, 3)],
            &[(1, 1), (1, 2), (2, 1), (3, 4), (0, 4)],
        ];
        for mines in layouts {
            let board = Board::with_mines(4, 5, mines).unwrap();
            for r in 0..4 {
                for c in 0..5 {
                    if !board.is_mine(r, c) {
                        assert_eq!(board.adjacent_count(r, c), brute_force_adjacency(&board, r, c), "({r}, {c})");
                    }
                }
            }
        }

        let board = Board::generate(16, 30, 99, &mut StdRng::seed_from_u64(7)).unwrap();
        for r in 0..16 {
            for c in 0..30 {
                if !board.is_mine(r, c) {
                    assert_eq!(board.adjacent_count(r, c), brute_force_adjacency(&board, r, c));
                }
            }
        }
    }

    #[test]
    fn with_mines_validates_positions() {
        assert_eq!(
            Board::with_mines(3, 3, &[(3, 0)]).unwrap_err(),
            BoardError::OutOfBounds { row: 3, col: 0 }
        );
        let all: Vec<_> = (0..2).flat_map(|r| (0..2).map(move |c| (r, c))).collect();
        assert_eq!(
            Board::with_mines(2, 2, &all).unwrap_err(),
            BoardError::TooManyMines { mines: 4, cells: 4 }
        );
        let board = Board::with_mines(3, 3, &[(1, 1), (1, 1)]).unwrap();
        assert_eq!(board.mine_count(), 1);
    }

    #[test]
    fn flood_fill_stops_at_numbered_border() {
        let mut board = walled_board();

        assert_eq!(board.reveal(0, 0), RevealOutcome::RevealedAndCascaded);
        for r in 0..4 {
            for c in 0..3 {
                assert!(board.is_revealed(r, c), "({r}, {c}) should be revealed");
            }
            assert!(!board.is_revealed(r, 3));
            assert!(!board.is_revealed(r, 4), "cascade must not cross the wall");
        }
        assert_eq!(board.revealed_count(), 12);
        assert_eq!(revealed_cells(&board), 12);
        assert!(!board.is_board_cleared());
        assert_eq!(board.status(), BoardStatus::InProgress);
    }

    #[test]
    fn numbered_cell_reveals_alone() {
        let mut board = walled_board();
        assert_eq!(board.adjacent_count(0, 4), 2);
        assert_eq!(board.reveal(0, 4), RevealOutcome::Revealed);
        assert_eq!(board.revealed_count(), 1);
    }

    #[test]
    fn flags_hold_back_the_cascade() {
        let mut board = walled_board();
        assert!(board.toggle_flag(3, 0));

        assert_eq!(board.reveal(0, 0), RevealOutcome::RevealedAndCascaded);
        assert!(!board.is_revealed(3, 0));
        assert!(board.is_flagged(3, 0));
        assert_eq!(board.revealed_count(), 11);
    }

    #[test]
    fn reveal_no_ops_leave_state_unchanged() {
        let mut board = walled_board();
        assert_eq!(board.reveal(0, 4), RevealOutcome::Revealed);
        assert_eq!(board.reveal(0, 4), RevealOutcome::NoOp);

        assert!(board.toggle_flag(1, 4));
        assert_eq!(board.reveal(1, 4), RevealOutcome::NoOp);
        assert!(!board.is_revealed(1, 4));

        assert_eq!(board.reveal(4, 0), RevealOutcome::NoOp);
        assert_eq!(board.reveal(0, 5), RevealOutcome::NoOp);
        assert_eq!(board.revealed_count(), 1);
        assert_eq!(board.status(), BoardStatus::InProgress);
    }

    #[test]
    fn toggle_flag_rules() {
        let mut board = walled_board();
        assert!(board.toggle_flag(2, 0));
        assert_eq!(board.flagged_count(), 1);
        assert!(!board.toggle_flag(2, 0));
        assert_eq!(board.flagged_count(), 0);

        board.reveal(0, 4);
        assert!(!board.toggle_flag(0, 4));
        assert!(!board.is_flagged(0, 4));
        assert!(!board.toggle_flag(9, 9));
        assert_eq!(board.flagged_count(), 0);
    }

    #[test]
    fn remaining_mines_goes_negative() {
        let mut board = Board::with_mines(3, 3, &[(0, 0)]).unwrap();
        for (r, c) in [(0, 0), (0, 1), (0, 2)] {
            board.toggle_flag(r, c);
        }
        assert_eq!(board.remaining_mines(), -2);
    }

    #[test]
    fn mine_reveal_loses_without_win_check() {
        // Only one safe cell left hidden after the mine: reveal count must not tip into a win
        let mut board = Board::with_mines(1, 2, &[(0, 0)]).unwrap();
        assert!(!board.is_board_cleared());

        assert_eq!(board.reveal(0, 0), RevealOutcome::RevealedMine);
        assert_eq!(board.status(), BoardStatus::Lost);
        assert_eq!(board.detonated(), Some((0, 0)));
        assert!(board.is_revealed(0, 0));
        assert!(!board.is_board_cleared());

        assert_eq!(board.reveal(0, 1), RevealOutcome::NoOp);
        assert!(!board.toggle_flag(0, 1));
        assert_eq!(board.revealed_count(), 0);
    }

    #[test]
    fn clearing_all_safe_cells_wins() {
        let mut board = walled_board();
        board.reveal(0, 0);
        for r in 0..4 {
            assert!(board.reveal(r, 4).has_update());
        }
        assert!(board.is_board_cleared());
        assert_eq!(board.status(), BoardStatus::Won);
        assert!(board.status().is_finished());
        assert_eq!(board.reveal(0, 3), RevealOutcome::NoOp);
    }

    #[test]
    fn win_ignores_flags() {
        let mut board = Board::with_mines(1, 3, &[(0, 0)]).unwrap();
        board.toggle_flag(0, 2);
        board.toggle_flag(0, 2);
        board.reveal(0, 1);
        board.reveal(0, 2);
        assert_eq!(board.status(), BoardStatus::Won);
        assert!(!board.is_flagged(0, 0));
    }

    #[test]
    fn large_empty_board_cascades_without_recursion() {
        let mut board = Board::generate(300, 300, 0, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(board.reveal(150, 150), RevealOutcome::RevealedAndCascaded);
        assert_eq!(board.revealed_count(), 300 * 300);
        assert_eq!(board.status(), BoardStatus::Won);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn accessors_panic_out_of_bounds() {
        let board = walled_board();
        board.is_mine(0, 5);
    }
}
