//! Stones, moves and the turn-order correction applied before replay.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Board sizes the engines are asked to play on.
pub const SUPPORTED_SIZES: [u32; 3] = [9, 13, 19];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSize(u32);

impl BoardSize {
    pub fn new(size: u32) -> Result<Self, CoreError> {
        if SUPPORTED_SIZES.contains(&size) {
            Ok(Self(size))
        } else {
            Err(CoreError::UnsupportedSize(size))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn contains(self, point: Point) -> bool {
        point.row < self.0 && point.col < self.0
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter form used in GTP `play` and `genmove` commands.
    pub fn gtp(self) -> &'static str {
        match self {
            Color::Black => "b",
            Color::White => "w",
        }
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts anything that starts with `b` or `w` ("black", "B", "white", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('b') => Ok(Color::Black),
            Some('w') => Ok(Color::White),
            _ => Err(format!("Unknown color: {s:?}")),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// Zero-based intersection, (0, 0) is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub row: u32,
    pub col: u32,
}

impl Point {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// A placed stone or a pass (`point == None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub color: Color,
    pub point: Option<Point>,
}

impl Move {
    pub fn play(color: Color, row: u32, col: u32) -> Self {
        Self {
            color,
            point: Some(Point::new(row, col)),
        }
    }

    pub fn pass(color: Color) -> Self {
        Self { color, point: None }
    }
}

/// Make the sequence end with a stone of `to_play`'s opponent.
///
/// The engine decides whose turn it is from the last stone played, so the
/// last opponent move is moved to the end instead of appending a pass. When
/// the opponent has no move at all the sequence is returned as is.
pub fn ensure_turn(mut moves: Vec<Move>, to_play: Color) -> Vec<Move> {
    let opponent = to_play.opposite();
    let Some(last_idx) = moves.iter().rposition(|m| m.color == opponent) else {
        return moves;
    };

    if last_idx != moves.len() - 1 {
        let mv = moves.remove(last_idx);
        moves.push(mv);
    }
    moves
}
