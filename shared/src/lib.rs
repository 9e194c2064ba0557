//! Types shared by the game server and its clients: tokens, board positions,
//! the matching rule and the JSON messages exchanged over the websocket.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod rules;

pub use rules::{any_solution, combinations, find_solution, validate, SET_SIZE};

/// Number of face-up slots on the board.
pub const BOARD_SIZE: usize = 9;
/// Columns per board row; position ids are `"row,col"`.
pub const COLUMNS: usize = 3;
/// Rows a position id may name. Only the first three exist on the board.
pub const MAX_ROWS: usize = 4;
/// Size of the full token universe (3 shapes × 3 fills × 3 colors × 3 counts).
pub const UNIVERSE_SIZE: usize = 81;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Square,
    Circle,
    Triangle,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Square, Shape::Circle, Shape::Triangle];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    Solid,
    Transparent,
    Empty,
}

impl Fill {
    pub const ALL: [Fill; 3] = [Fill::Solid, Fill::Transparent, Fill::Empty];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Red,
    Blue,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Green, Color::Red, Color::Blue];
}

/// Valid symbol counts on a token.
pub const COUNTS: [u8; 3] = [1, 2, 3];

/// A board position written as `"row,col"`.
///
/// Ids are stable names for slots rather than geometry. Rows 0-3 parse, but
/// only ids whose [`index`](PositionId::index) is below [`BOARD_SIZE`] name a
/// slot that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionId {
    pub row: u8,
    pub col: u8,
}

impl PositionId {
    /// Position id of the slot at `index` in canonical (row-major) order.
    pub fn from_index(index: usize) -> Self {
        Self {
            row: (index / COLUMNS) as u8,
            col: (index % COLUMNS) as u8,
        }
    }

    /// Canonical slot index, row-major.
    pub fn index(&self) -> usize {
        self.row as usize * COLUMNS + self.col as usize
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("invalid position id {input:?}")]
pub struct PositionParseError {
    pub input: String,
}

impl FromStr for PositionId {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PositionParseError {
            input: s.to_string(),
        };

        let (row, col) = s.split_once(',').ok_or_else(invalid)?;
        let row: u8 = row.trim().parse().map_err(|_| invalid())?;
        let col: u8 = col.trim().parse().map_err(|_| invalid())?;

        if row as usize >= MAX_ROWS || col as usize >= COLUMNS {
            return Err(invalid());
        }
        Ok(Self { row, col })
    }
}

impl TryFrom<String> for PositionId {
    type Error = PositionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PositionId> for String {
    fn from(id: PositionId) -> Self {
        id.to_string()
    }
}

/// A single card. Attributes never change; `id` is set while the token is on
/// the board and cleared when it goes back to the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PositionId>,
    pub shape: Shape,
    pub fill: Fill,
    pub color: Color,
    pub count: u8,
}

impl Token {
    pub fn new(shape: Shape, fill: Fill, color: Color, count: u8) -> Self {
        Self {
            id: None,
            shape,
            fill,
            color,
            count,
        }
    }

    /// Every distinct token exactly once, in a fixed order.
    pub fn universe() -> Vec<Token> {
        let mut tokens = Vec::with_capacity(UNIVERSE_SIZE);
        for shape in Shape::ALL {
            for fill in Fill::ALL {
                for color in Color::ALL {
                    for count in COUNTS {
                        tokens.push(Token::new(shape, fill, color, count));
                    }
                }
            }
        }
        tokens
    }

    /// The same token placed at `id`.
    pub fn placed_at(self, id: PositionId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// The same token with its position cleared.
    pub fn lifted(self) -> Self {
        Self { id: None, ..self }
    }

    /// The attributes that identify a token, ignoring its position.
    pub fn face(&self) -> (Shape, Fill, Color, u8) {
        (self.shape, self.fill, self.color, self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Alive,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub handle: String,
    pub score: i64,
    /// Remote port of the player's connection, to tell same-handle players apart.
    pub address: u16,
}

impl Player {
    pub fn new(handle: impl Into<String>, address: u16) -> Self {
        Self {
            handle: handle.into(),
            score: 0,
            address,
        }
    }
}

/// First message on every connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identify {
    #[serde(alias = "name")]
    pub handle: String,
}

/// One entry of a submitted move: either a bare position id or a token object
/// carrying one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveEntry {
    Id(String),
    Token { id: String },
}

impl MoveEntry {
    pub fn position(&self) -> Result<PositionId, PositionParseError> {
        match self {
            MoveEntry::Id(id) | MoveEntry::Token { id } => id.parse(),
        }
    }
}

/// Messages a client sends after identifying.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Move(Vec<MoveEntry>),
    Chat { message: String },
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ServerMessage {
    Frame {
        status: Status,
        players: Vec<Player>,
        tokens: Vec<Option<Token>>,
        last_set: Option<Vec<Token>>,
    },
    Chat {
        handle: String,
        message: String,
    },
}
