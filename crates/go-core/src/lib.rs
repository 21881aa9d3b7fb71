//! Go game records to GTP engine input.
//!
//! - [`sgf`] loads a record into a board size and a move list
//! - [`moves`] holds the stone types and the turn-order fix-up
//! - [`coords`] renders points as GTP vertices
//! - [`policy`] draws a move from engine priors at a given temperature

pub mod coords;
pub mod error;
pub mod moves;
pub mod policy;
pub mod sgf;

pub use coords::{RowOrigin, PASS};
pub use error::CoreError;
pub use moves::{ensure_turn, BoardSize, Color, Move, Point};
pub use policy::{Policy, Temperature};
pub use sgf::{load_game_record, GameRecord};
