//! Static evaluation of a board used by rollouts.
//!
//! The evaluation is `score + 0.1 * empty + corner + 0.2 * monotonicity`, where
//! `corner` is a tenth of the largest tile when that tile sits in a corner.
//!
//! Monotonicity counts adjacent pairs with `earlier >= later` along every row
//! and column, once in each traversal direction. Equal pairs therefore count
//! twice; the weights were tuned with this counting.

use crate::constants::{CORNER_WEIGHT, EMPTY_WEIGHT, MONOTONICITY_WEIGHT, N};
use crate::game::Board;

/// Score a `(board, score)` snapshot. Higher is better.
pub fn evaluate(board: &Board, score: u64) -> f64 {
    score as f64
        + EMPTY_WEIGHT * board.empty_count() as f64
        + corner_bonus(board)
        + MONOTONICITY_WEIGHT * monotonicity(board) as f64
}

/// A tenth of the largest tile if any corner holds it, else 0.
pub fn corner_bonus(board: &Board) -> f64 {
    let max = board.max_tile();
    let corners = [
        board.get(0, 0),
        board.get(0, N - 1),
        board.get(N - 1, 0),
        board.get(N - 1, N - 1),
    ];
    if corners.contains(&max) {
        CORNER_WEIGHT * max as f64
    } else {
        0.0
    }
}

/// Non-increasing adjacent pairs over every row and column, both directions.
pub fn monotonicity(board: &Board) -> u32 {
    let rows = board.rows();
    let mut total = 0;
    for i in 0..N {
        let row = rows[i];
        let col: [u32; N] = std::array::from_fn(|r| rows[r][i]);
        total += line_monotonicity(&row) + line_monotonicity(&col);
    }
    total
}

fn line_monotonicity(line: &[u32; N]) -> u32 {
    let forward = line.windows(2).filter(|w| w[0] >= w[1]).count();
    let backward = line.windows(2).filter(|w| w[1] >= w[0]).count();
    (forward + backward) as u32
}
