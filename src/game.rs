//! 2048 game state and move resolution.
//!
//! This module provides the core game logic, including:
//! - Board representation as a fixed 4x4 grid of tile values
//! - Move resolution (compress, merge, compress) for the four directions
//! - Legality and terminal detection
//! - Random tile spawning from an injected random source
//!
//! A `Game` never owns its random number generator. Every operation that
//! draws randomness takes a `&mut fastrand::Rng`, so a search can clone the
//! game freely while all draws come from one seedable stream.

use std::fmt;
use std::str::FromStr;

use fastrand::Rng;

use crate::constants::{CELLS, MAX_TILE, N, SPAWN_FOUR_PROB, START_TILES};
use crate::error::{Error, Result};

/// Raw 4x4 grid of tile values, row-major. 0 means empty.
pub type Grid = [[u32; N]; N];

/// A cell coordinate as `(row, col)`.
pub type Cell = (usize, usize);

/// One line of the board, ordered in the direction tiles slide towards.
type Line = [u32; N];

// =============================================================================
// Actions
// =============================================================================

/// The four move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in enumeration order (index 0..=3).
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, as accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Action::ALL
            .get(index)
            .copied()
            .ok_or(Error::InvalidAction(index))
    }
}

impl TryFrom<u8> for Action {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        Action::try_from(index as usize)
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "up" | "u" => Ok(Action::Up),
            "down" | "d" => Ok(Action::Down),
            "left" | "l" => Ok(Action::Left),
            "right" | "r" => Ok(Action::Right),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// =============================================================================
// Board
// =============================================================================

/// A 4x4 board of tiles.
///
/// Every non-zero cell holds a power of two >= 2. Boards built through
/// [`Board::from_rows`] or parsed from a string are validated (tiles at most
/// [`MAX_TILE`]); boards
/// produced by move resolution and spawning keep the invariant by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: Grid,
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board from raw rows, checking every tile value.
    pub fn from_rows(rows: Grid) -> Result<Self> {
        for (row, values) in rows.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if value != 0 && (value < 2 || value > MAX_TILE || !value.is_power_of_two()) {
                    return Err(Error::InvalidTile { row, col, value });
                }
            }
        }
        Ok(Self { cells: rows })
    }

    #[inline]
    pub fn rows(&self) -> &Grid {
        &self.cells
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row][col]
    }

    #[inline]
    fn set(&mut self, (row, col): Cell, value: u32) {
        self.cells[row][col] = value;
    }

    /// All empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Cell> {
        let mut empty = Vec::with_capacity(CELLS);
        for row in 0..N {
            for col in 0..N {
                if self.cells[row][col] == 0 {
                    empty.push((row, col));
                }
            }
        }
        empty
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&v| v == 0).count()
    }

    pub fn has_empty(&self) -> bool {
        self.cells.iter().flatten().any(|&v| v == 0)
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Sum of all tile values.
    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().flatten().map(|&v| v as u64).sum()
    }

    /// Read line `i` for `action`, ordered so that tiles slide towards index 0.
    ///
    /// Rows for left/right, columns for up/down, reversed for right/down.
    fn line(&self, action: Action, i: usize) -> Line {
        let mut line = [0; N];
        for (k, slot) in line.iter_mut().enumerate() {
            *slot = self.cells_at(action, i, k);
        }
        line
    }

    /// Write line `i` for `action` back, undoing the ordering of [`Board::line`].
    fn set_line(&mut self, action: Action, i: usize, line: &Line) {
        for (k, &value) in line.iter().enumerate() {
            let cell = line_cell(action, i, k);
            self.set(cell, value);
        }
    }

    #[inline]
    fn cells_at(&self, action: Action, i: usize, k: usize) -> u32 {
        let (row, col) = line_cell(action, i, k);
        self.cells[row][col]
    }

    /// Apply `action` to every line without spawning.
    ///
    /// Returns the points gained from merges.
    fn slide(&mut self, action: Action) -> u64 {
        let mut gained = 0;
        for i in 0..N {
            let (line, points) = slide_line(self.line(action, i));
            self.set_line(action, i, &line);
            gained += points;
        }
        gained
    }

    /// Whether any two horizontally or vertically adjacent cells are equal.
    fn has_equal_neighbors(&self) -> bool {
        for row in 0..N {
            for col in 0..N - 1 {
                if self.cells[row][col] == self.cells[row][col + 1] {
                    return true;
                }
            }
        }
        for col in 0..N {
            for row in 0..N - 1 {
                if self.cells[row][col] == self.cells[row + 1][col] {
                    return true;
                }
            }
        }
        false
    }
}

impl From<Board> for Grid {
    fn from(board: Board) -> Self {
        board.cells
    }
}

impl TryFrom<Grid> for Board {
    type Error = Error;

    fn try_from(rows: Grid) -> Result<Self> {
        Board::from_rows(rows)
    }
}

/// Parse a board from `"r0/r1/r2/r3"`, each row being four comma-separated values.
///
/// `;` and newlines are accepted as row separators too.
impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rows: Vec<&str> = s
            .split(['/', ';', '\n'])
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect();
        if rows.len() != N {
            return Err(Error::InvalidBoard(format!("found {} rows", rows.len())));
        }

        let mut grid = [[0; N]; N];
        for (r, row) in rows.iter().enumerate() {
            let values: Vec<&str> = row.split(',').map(str::trim).collect();
            if values.len() != N {
                return Err(Error::InvalidBoard(format!(
                    "row {r} has {} values",
                    values.len()
                )));
            }
            for (c, value) in values.iter().enumerate() {
                grid[r][c] = value
                    .parse()
                    .map_err(|_| Error::InvalidBoard(format!("'{value}' is not a tile value")))?;
            }
        }
        Board::from_rows(grid)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.max_tile().max(1).to_string().len().max(4);
        for row in &self.cells {
            let cells: Vec<String> = row
                .iter()
                .map(|&v| {
                    if v == 0 {
                        format!("{:>width$}", ".")
                    } else {
                        format!("{v:>width$}")
                    }
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Map position `k` of line `i` for `action` to a board cell.
#[inline]
fn line_cell(action: Action, i: usize, k: usize) -> Cell {
    match action {
        Action::Left => (i, k),
        Action::Right => (i, N - 1 - k),
        Action::Up => (k, i),
        Action::Down => (N - 1 - k, i),
    }
}

// =============================================================================
// Line Resolution
// =============================================================================

/// Pack non-zero values towards index 0, keeping their order.
fn compress(line: &Line) -> Line {
    let mut packed = [0; N];
    for (slot, &v) in packed.iter_mut().zip(line.iter().filter(|&&v| v != 0)) {
        *slot = v;
    }
    packed
}

/// Merge equal adjacent pairs in a single left-to-right pass.
///
/// The doubled value stays in the first cell and the second becomes 0, so a
/// freshly merged tile is never compared again with its new right
/// neighbour. Returns the sum of the newly formed tiles.
fn merge(line: &mut Line) -> u64 {
    let mut gained = 0;
    for i in 0..N - 1 {
        if line[i] != 0 && line[i] == line[i + 1] {
            line[i] *= 2;
            line[i + 1] = 0;
            gained += line[i] as u64;
        }
    }
    gained
}

/// Compress, merge, compress one line. Returns the new line and the points gained.
pub(crate) fn slide_line(line: Line) -> (Line, u64) {
    let mut line = compress(&line);
    let gained = merge(&mut line);
    (compress(&line), gained)
}

// =============================================================================
// Game
// =============================================================================

/// A snapshot of the game: board plus cumulative score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GameState {
    pub board: Board,
    pub score: u64,
}

/// Result of [`Game::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub board: Board,
    /// Cumulative score after the step.
    pub score: u64,
    /// Whether the post-move state is terminal.
    pub terminal: bool,
}

/// The 2048 board state model.
///
/// Cloning a `Game` is a deep copy; search iterations each work on their own clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    score: u64,
    last_move_valid: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Create a game with an empty board and score 0.
    ///
    /// Call [`Game::reset`] to place the starting tiles.
    pub fn new() -> Self {
        Self::from_state(Board::new(), 0)
    }

    /// Create a game positioned at the given board and score.
    pub fn from_state(board: Board, score: u64) -> Self {
        Self {
            board,
            score,
            last_move_valid: true,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn state(&self) -> GameState {
        GameState {
            board: self.board,
            score: self.score,
        }
    }

    /// Whether the most recent [`Game::step`] changed the board.
    pub fn last_move_valid(&self) -> bool {
        self.last_move_valid
    }

    /// Clear the board, reset the score and place the two starting tiles.
    pub fn reset(&mut self, rng: &mut Rng) -> GameState {
        self.board = Board::new();
        self.score = 0;
        self.last_move_valid = true;
        for _ in 0..START_TILES {
            self.spawn_tile(rng);
        }
        self.state()
    }

    /// Place a 2 (90%) or a 4 (10%) on a uniformly chosen empty cell.
    ///
    /// Returns the cell written, or `None` if the board is full.
    pub fn spawn_tile(&mut self, rng: &mut Rng) -> Option<Cell> {
        let empty = self.board.empty_cells();
        if empty.is_empty() {
            return None;
        }
        let cell = empty[rng.usize(..empty.len())];
        let value = if rng.f64() < 1.0 - SPAWN_FOUR_PROB { 2 } else { 4 };
        self.board.set(cell, value);
        Some(cell)
    }

    /// Slide and merge every line in the direction of `action`.
    ///
    /// Adds the value of every newly formed tile to the score, saturating at
    /// `u64::MAX`. Does not spawn. Returns whether any line changed.
    pub fn resolve_move(&mut self, action: Action) -> bool {
        let before = self.board;
        self.score = self.score.saturating_add(self.board.slide(action));
        self.board != before
    }

    /// Play `action`: resolve the move and, if it changed the board, spawn a tile.
    ///
    /// On a terminal board nothing moves and nothing spawns; the outcome
    /// reports terminal again.
    pub fn step(&mut self, action: Action, rng: &mut Rng) -> StepOutcome {
        let moved = self.resolve_move(action);
        self.last_move_valid = moved;
        if moved {
            self.spawn_tile(rng);
        }
        StepOutcome {
            board: self.board,
            score: self.score,
            terminal: self.is_terminal(),
        }
    }

    /// Whether `action` would change the board. Neither the board nor the score is touched.
    pub fn is_legal(&self, action: Action) -> bool {
        let mut copy = self.board;
        copy.slide(action);
        copy != self.board
    }

    /// Legal actions in enumeration order.
    pub fn legal_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|&a| self.is_legal(a))
            .collect()
    }

    /// No empty cell and no equal neighbours.
    pub fn is_terminal(&self) -> bool {
        !self.board.has_empty() && !self.board.has_equal_neighbors()
    }
}
