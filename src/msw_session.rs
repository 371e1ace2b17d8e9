// A single game in progress
// Ties a board to its difficulty, random source and game clock

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

use crate::msw_board::{Board, BoardError, BoardStatus, RevealOutcome};
use crate::msw_config::{ConfigError, Difficulty};

/// Reasons a board could not be dealt for a difficulty
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Current board plus the state the front end shows around it
pub struct Session {
    difficulty: Difficulty,
    board: Board,
    rng: StdRng,
    start_time: Option<Instant>, // Set while the clock runs
    elapsed: Duration,           // Frozen value once the game ends
}

fn build_board(difficulty: Difficulty, rng: &mut StdRng) -> Result<Board, SessionError> {
    difficulty.validate()?;
    let (rows, cols, mines) = difficulty.params();
    Ok(Board::generate(rows, cols, mines, rng)?)
}

impl Session {
    /// Start a session with an OS-seeded random source
    pub fn new(difficulty: Difficulty) -> Result<Self, SessionError> {
        Self::with_rng(difficulty, StdRng::from_entropy())
    }

    /// Start a session with a caller-supplied random source
    pub fn with_rng(difficulty: Difficulty, mut rng: StdRng) -> Result<Self, SessionError> {
        let board = build_board(difficulty, &mut rng)?;
        info!(difficulty = difficulty.name(), rows = board.rows(), cols = board.cols(), mines = board.mine_count(), "new game");
        Ok(Session {
            difficulty,
            board,
            rng,
            start_time: None,
            elapsed: Duration::ZERO,
        })
    }

    /// Replace the board with a fresh one of the same difficulty
    pub fn new_game(&mut self) -> Result<(), SessionError> {
        self.change_difficulty(self.difficulty)
    }

    /// Switch to another difficulty. On error the current board is kept.
    pub fn change_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SessionError> {
        let board = build_board(difficulty, &mut self.rng)?;
        info!(difficulty = difficulty.name(), rows = board.rows(), cols = board.cols(), mines = board.mine_count(), "new game");
        self.difficulty = difficulty;
        self.board = board;
        self.start_time = None;
        self.elapsed = Duration::ZERO;
        Ok(())
    }

    /// Reveal a cell; the first effective reveal starts the clock
    pub fn reveal(&mut self, row: usize, col: usize) -> RevealOutcome {
        let outcome = self.board.reveal(row, col);
        if !outcome.has_update() {
            return outcome;
        }
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        match self.board.status() {
            BoardStatus::Won => {
                self.stop_clock();
                info!(secs = self.elapsed.as_secs(), "game won");
            }
            BoardStatus::Lost => {
                self.stop_clock();
                info!(cell = ?self.board.detonated(), secs = self.elapsed.as_secs(), "game lost");
            }
            BoardStatus::InProgress => {}
        }
        outcome
    }

    /// Toggle a flag; returns the new flag state
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> bool {
        self.board.toggle_flag(row, col)
    }

    fn stop_clock(&mut self) {
        if let Some(t0) = self.start_time.take() {
            self.elapsed = t0.elapsed();
        }
    }

    /// Time since the first reveal, frozen once the game is over
    pub fn elapsed(&self) -> Duration {
        match self.start_time {
            Some(t0) => t0.elapsed(),
            None => self.elapsed,
        }
    }

    pub fn clock_running(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn remaining_mines(&self) -> isize {
        self.board.remaining_mines()
    }

    pub fn status(&self) -> BoardStatus {
        self.board.status()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn board(&self) -> &Board {
        &self.board
    }
}
