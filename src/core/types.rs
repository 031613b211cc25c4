// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// External identifier of a day of recordings (the day-file number).
pub type DayId = u32;

/// Direction of movement at a fix, as labelled by the upstream collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
    /// No movement since the previous fix.
    #[serde(rename = "stat")]
    Stat,
}

impl Direction {
    pub const ALL: [Direction; 9] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
        Direction::Stat,
    ];
}

/// A single location fix handed to the preprocessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    /// `false` for points synthesized by route interpolation.
    #[serde(rename = "original", default = "default_original")]
    pub is_original: bool,
    #[serde(default)]
    pub direction: Option<Direction>,
}

fn default_original() -> bool {
    true
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            is_original: true,
            direction: None,
        }
    }

    pub fn interpolated(mut self) -> Self {
        self.is_original = false;
        self
    }

    pub fn heading(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// A discretized grid square.
///
/// Stores the truncated grid ticks (`coordinate * scale`, truncated toward
/// zero) so equality and hashing never touch floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub lat_ticks: i64,
    pub long_ticks: i64,
    pub scale: u32,
}

impl CellId {
    pub fn latitude(&self) -> f64 {
        self.lat_ticks as f64 / f64::from(self.scale)
    }

    pub fn longitude(&self) -> f64 {
        self.long_ticks as f64 / f64::from(self.scale)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LAT{}LON{}", self.latitude(), self.longitude())
    }
}

/// One kept fix after preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub cell: CellId,
    pub direction: Option<Direction>,
}

/// An entry of a [`DaySequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Visit(Step),
    /// End of a day or of a trip segment. Resets the Markov context.
    Boundary,
}

impl Token {
    pub fn step(&self) -> Option<&Step> {
        match self {
            Token::Visit(step) => Some(step),
            Token::Boundary => None,
        }
    }

    pub fn cell(&self) -> Option<CellId> {
        self.step().map(|s| s.cell)
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self, Token::Boundary)
    }
}

/// The cleaned label sequence of one day, always terminated by a boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySequence {
    tokens: Vec<Token>,
}

impl DaySequence {
    /// Builds a sequence from raw tokens, appending the trailing boundary when
    /// it is missing.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| !t.is_boundary()) {
            tokens.push(Token::Boundary);
        }
        Self { tokens }
    }

    /// Convenience constructor for direction-less days.
    pub fn from_cells(cells: impl IntoIterator<Item = CellId>) -> Self {
        let tokens = cells
            .into_iter()
            .map(|cell| Token::Visit(Step { cell, direction: None }))
            .collect();
        Self::from_tokens(tokens)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens, trailing boundary included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.tokens.iter().filter_map(Token::cell)
    }
}
