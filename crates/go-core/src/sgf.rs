//! SGF game record loading.
//!
//! Only what is needed to rebuild a position is kept: the board size, the
//! root setup stones and the moves of the main line. Variations are checked
//! for syntax and then skipped.

use crate::error::CoreError;
use crate::moves::{BoardSize, Color, Move, Point};

const DEFAULT_SIZE: u32 = 19;

/// Board size plus every stone to replay, in play order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub size: BoardSize,
    pub moves: Vec<Move>,
}

/// Parse an SGF string into a [`GameRecord`].
///
/// Black setup stones come first, then white setup stones, then one move per
/// main line node carrying `B` or `W`.
pub fn load_game_record(sgf: &str) -> Result<GameRecord, CoreError> {
    let mainline = parse_mainline(sgf)?;
    let root = &mainline[0];

    let size = match root.value("SZ") {
        None => DEFAULT_SIZE,
        Some(v) => v
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::Parse(format!("invalid board size {v:?}")))?,
    };
    let size = BoardSize::new(size)?;

    let mut moves: Vec<Move> = Vec::new();

    for (ident, color) in [("AB", Color::Black), ("AW", Color::White)] {
        for value in root.values(ident) {
            for point in expand_point_list(value, size)? {
                let stone = Move {
                    color,
                    point: Some(point),
                };
                if !moves.contains(&stone) {
                    moves.push(stone);
                }
            }
        }
    }

    for node in &mainline {
        let mv = if let Some(v) = node.value("B") {
            Move {
                color: Color::Black,
                point: decode_move(v, size)?,
            }
        } else if let Some(v) = node.value("W") {
            Move {
                color: Color::White,
                point: decode_move(v, size)?,
            }
        } else {
            continue;
        };
        moves.push(mv);
    }

    Ok(GameRecord { size, moves })
}

#[derive(Debug, Default)]
struct Node {
    props: Vec<(String, Vec<String>)>,
}

impl Node {
    fn values(&self, ident: &str) -> &[String] {
        self.props
            .iter()
            .find(|(id, _)| id == ident)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    fn value(&self, ident: &str) -> Option<&str> {
        self.values(ident).first().map(String::as_str)
    }

    fn add(&mut self, ident: String, values: Vec<String>) {
        match self.props.iter_mut().find(|(id, _)| *id == ident) {
            Some((_, existing)) => existing.extend(values),
            None => self.props.push((ident, values)),
        }
    }
}

/// Nodes of the main line of the first game tree. Never empty on success.
fn parse_mainline(sgf: &str) -> Result<Vec<Node>, CoreError> {
    let start = sgf
        .find('(')
        .ok_or_else(|| CoreError::Parse("no game tree found".into()))?;

    let mut parser = Parser {
        src: sgf.as_bytes(),
        pos: start,
    };
    let mut nodes = Vec::new();
    parser.game_tree(&mut nodes)?;
    Ok(nodes)
}

struct Variation {
    mainline: bool,
    has_child: bool,
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, msg: &str) -> CoreError {
        CoreError::Parse(format!("{msg} at byte {}", self.pos))
    }

    fn expect(&mut self, byte: u8) -> Result<(), CoreError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    /// `( node+ tree* )`. Nodes are collected only along first children.
    ///
    /// Open variations live on an explicit stack so nesting depth is bounded
    /// by the input size, not the thread stack.
    fn game_tree(&mut self, nodes: &mut Vec<Node>) -> Result<(), CoreError> {
        self.expect(b'(')?;
        self.sequence(true, nodes)?;
        let mut open = vec![Variation {
            mainline: true,
            has_child: false,
        }];

        while let Some(current) = open.last_mut() {
            self.skip_ws();
            match self.peek() {
                Some(b'(') => {
                    self.pos += 1;
                    let mainline = current.mainline && !current.has_child;
                    current.has_child = true;
                    self.sequence(mainline, nodes)?;
                    open.push(Variation {
                        mainline,
                        has_child: false,
                    });
                }
                Some(b')') => {
                    self.pos += 1;
                    open.pop();
                }
                _ => return Err(self.error("expected '(' or ')'")),
            }
        }
        Ok(())
    }

    /// `node+` right after an opening parenthesis.
    fn sequence(&mut self, collect: bool, nodes: &mut Vec<Node>) -> Result<(), CoreError> {
        self.skip_ws();
        if self.peek() != Some(b';') {
            return Err(self.error("expected node"));
        }

        while self.peek() == Some(b';') {
            self.pos += 1;
            let node = self.node()?;
            if collect {
                nodes.push(node);
            }
            self.skip_ws();
        }
        Ok(())
    }

    fn node(&mut self) -> Result<Node, CoreError> {
        let mut node = Node::default();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    let ident = self.ident()?;
                    let values = self.values()?;
                    node.add(ident, values);
                }
                _ => return Ok(node),
            }
        }
    }

    fn ident(&mut self) -> Result<String, CoreError> {
        let mut ident = String::new();
        while let Some(b) = self.peek().filter(u8::is_ascii_alphabetic) {
            // FF[3] long names such as AddBlack: lower case letters are dropped
            if b.is_ascii_uppercase() {
                ident.push(b as char);
            }
            self.pos += 1;
        }
        if ident.is_empty() {
            return Err(self.error("property identifier without upper case letters"));
        }
        Ok(ident)
    }

    fn values(&mut self) -> Result<Vec<String>, CoreError> {
        let mut values = Vec::new();
        self.skip_ws();
        while self.peek() == Some(b'[') {
            self.pos += 1;
            values.push(self.value()?);
            self.skip_ws();
        }
        if values.is_empty() {
            return Err(self.error("property without value"));
        }
        Ok(values)
    }

    fn value(&mut self) -> Result<String, CoreError> {
        let mut raw = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated property value")),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(String::from_utf8_lossy(&raw).into_owned());
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        None => return Err(self.error("unterminated property value")),
                        // escaped line break is a soft break and vanishes
                        Some(b'\n') | Some(b'\r') => self.pos += 1,
                        Some(b) => {
                            raw.push(b);
                            self.pos += 1;
                        }
                    }
                }
                Some(b) => {
                    raw.push(b);
                    self.pos += 1;
                }
            }
        }
    }
}

fn decode_point(value: &str, size: BoardSize) -> Result<Point, CoreError> {
    let bytes = value.trim().as_bytes();
    let [c, r] = bytes else {
        return Err(CoreError::Parse(format!("invalid point {value:?}")));
    };
    if !c.is_ascii_lowercase() || !r.is_ascii_lowercase() {
        return Err(CoreError::Parse(format!("invalid point {value:?}")));
    }

    let point = Point::new((r - b'a') as u32, (c - b'a') as u32);
    if !size.contains(point) {
        return Err(CoreError::Parse(format!(
            "point {value:?} is off the {size}x{size} board"
        )));
    }
    Ok(point)
}

/// `B[]`, and `B[tt]` on boards up to 19x19, are passes.
fn decode_move(value: &str, size: BoardSize) -> Result<Option<Point>, CoreError> {
    let value = value.trim();
    if value.is_empty() || (value == "tt" && size.get() <= 19) {
        return Ok(None);
    }
    decode_point(value, size).map(Some)
}

/// A single point or a compressed `aa:cc` rectangle.
fn expand_point_list(value: &str, size: BoardSize) -> Result<Vec<Point>, CoreError> {
    let Some((from, to)) = value.split_once(':') else {
        return Ok(vec![decode_point(value, size)?]);
    };

    let a = decode_point(from, size)?;
    let b = decode_point(to, size)?;
    let mut points = Vec::new();
    for row in a.row.min(b.row)..=a.row.max(b.row) {
        for col in a.col.min(b.col)..=a.col.max(b.col) {
            points.push(Point::new(row, col));
        }
    }
    Ok(points)
}
