//! Constants for board geometry, tile spawning, search and evaluation.
//!
//! All tuning values used by the engine live here so that the game model,
//! the evaluator and the tree search agree on them.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN). 2048 is played on a 4x4 grid.
pub const N: usize = 4;

/// Number of cells on the board.
pub const CELLS: usize = N * N;

/// Largest tile accepted on a caller-supplied board (131072).
///
/// A 16-cell board holding tiles up to this value sums to at most 2^21, and
/// each move adds at most 4 to the sum, so no tile can outgrow `u32` within
/// any feasible game.
pub const MAX_TILE: u32 = 1 << 17;

/// Number of tiles placed by a reset.
pub const START_TILES: usize = 2;

// =============================================================================
// Tile Spawning
// =============================================================================

/// Probability that a spawned tile is a 4 instead of a 2.
pub const SPAWN_FOUR_PROB: f64 = 0.1;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of simulations per decision.
pub const N_SIMS: usize = 10;

/// Exploration constant `C` of the UCT formula.
pub const UCT_C: f64 = 1.4;

// =============================================================================
// Heuristic Weights
// =============================================================================

/// Weight of each empty cell.
pub const EMPTY_WEIGHT: f64 = 0.1;

/// Fraction of the largest tile awarded when it sits in a corner.
pub const CORNER_WEIGHT: f64 = 0.1;

/// Weight of each monotone adjacent pair.
pub const MONOTONICITY_WEIGHT: f64 = 0.2;
