//! Errors raised while turning a game record into engine input.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Failed to parse SGF: {0}")]
    Parse(String),

    #[error("Unsupported board size: {0}")]
    UnsupportedSize(u32),

    #[error("Coordinate out of range: row {row}, col {col}")]
    Range { row: u32, col: u32 },
}
