//! GTP vertex rendering.
//!
//! Columns run `A`..`Z` without `I`, rows are numbered from 1 at the bottom
//! edge. Points coming out of an SGF are counted from the top, so callers pick
//! a [`RowOrigin`] to say which way their rows run.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::moves::{BoardSize, Move, Point};

/// Column letters in order. `I` is left out.
const COLUMNS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

pub const PASS: &str = "pass";

static VERTEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-HJ-Za-hj-z])([1-9]\d?)$").unwrap());

/// Render a bottom-up `(row, col)` as a vertex such as `D4`.
pub fn vertex(row: u32, col: u32) -> Result<String, CoreError> {
    let letter = COLUMNS
        .get(col as usize)
        .ok_or(CoreError::Range { row, col })?;
    Ok(format!("{}{}", *letter as char, row + 1))
}

/// Inverse of [`vertex`]. Case-insensitive; `pass` is not a vertex.
pub fn parse_vertex(s: &str) -> Option<(u32, u32)> {
    let caps = VERTEX_RE.captures(s.trim())?;
    let letter = caps[1].as_bytes()[0].to_ascii_uppercase();
    let col = COLUMNS.iter().position(|&c| c == letter)? as u32;
    let row: u32 = caps[2].parse().ok()?;
    Some((row - 1, col))
}

/// Which edge row 0 of a [`Point`] sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrigin {
    /// SGF convention: row 0 is the top edge.
    #[default]
    Top,
    /// Rows already count from the bottom edge, as GTP does.
    Bottom,
}

impl RowOrigin {
    pub fn vertex(self, point: Point, size: BoardSize) -> Result<String, CoreError> {
        if !size.contains(point) {
            return Err(CoreError::Range {
                row: point.row,
                col: point.col,
            });
        }
        let row = match self {
            RowOrigin::Top => size.get() - 1 - point.row,
            RowOrigin::Bottom => point.row,
        };
        vertex(row, point.col)
    }

    /// Vertex for a move, `pass` when it has no point.
    pub fn move_vertex(self, mv: &Move, size: BoardSize) -> Result<String, CoreError> {
        match mv.point {
            Some(point) => self.vertex(point, size),
            None => Ok(PASS.to_string()),
        }
    }

    /// Map an engine vertex back to a [`Point`] in this orientation.
    pub fn point(self, vertex: &str, size: BoardSize) -> Option<Point> {
        let (row, col) = parse_vertex(vertex)?;
        if row >= size.get() || col >= size.get() {
            return None;
        }
        let row = match self {
            RowOrigin::Top => size.get() - 1 - row,
            RowOrigin::Bottom => row,
        };
        Some(Point::new(row, col))
    }
}

impl FromStr for RowOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(RowOrigin::Top),
            "bottom" => Ok(RowOrigin::Bottom),
            other => Err(format!("Unknown row origin: {other:?} (expected top or bottom)")),
        }
    }
}
