use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid action index {0}: expected 0 (up), 1 (down), 2 (left) or 3 (right)")]
    InvalidAction(usize),

    #[error("Invalid tile {value} at ({row}, {col}): tiles must be 0 or a power of two from 2 to 131072")]
    InvalidTile { row: usize, col: usize, value: u32 },

    #[error("Unknown action '{0}': expected up, down, left or right")]
    UnknownAction(String),

    #[error("Invalid board: {0} (expected 4 rows of 4 comma-separated values)")]
    InvalidBoard(String),

    #[error("No legal actions available")]
    NoLegalAction,

    #[error("Number of simulations must be positive")]
    ZeroSimulations,
}

pub type Result<T> = std::result::Result<T, Error>;
