// File: src/core/context.rs
use crate::core::types::{CellId, Token};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Markov conditioning symbol: either the reserved start symbol or a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Context {
    /// Nothing visited yet in the current day or trip.
    Start,
    Cell(CellId),
}

impl From<CellId> for Context {
    fn from(cell: CellId) -> Self {
        Context::Cell(cell)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Start => f.write_str("$"),
            Context::Cell(cell) => write!(f, "{cell}"),
        }
    }
}

/// The last `width` visited cells, oldest first.
///
/// A boundary token clears the window, so every slot reads as
/// [`Context::Start`] until new cells are pushed.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    width: usize,
    history: VecDeque<CellId>,
}

impl ContextWindow {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            history: VecDeque::with_capacity(width),
        }
    }

    /// Feeds one token. O(1) amortized.
    pub fn push(&mut self, token: &Token) {
        match token.cell() {
            Some(cell) => self.push_cell(cell),
            None => self.history.clear(),
        }
    }

    pub fn push_cell(&mut self, cell: CellId) {
        if self.width == 0 {
            return;
        }
        if self.history.len() == self.width {
            self.history.pop_front();
        }
        self.history.push_back(cell);
    }

    /// Context `back` steps behind the most recent one (`0` is the most recent).
    pub fn get(&self, back: usize) -> Context {
        self.history
            .len()
            .checked_sub(back + 1)
            .and_then(|idx| self.history.get(idx))
            .map_or(Context::Start, |&cell| Context::Cell(cell))
    }

    /// The most recent context.
    pub fn last(&self) -> Context {
        self.get(0)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Step;

    fn visit(lat: i64) -> Token {
        let cell = CellId { lat_ticks: lat, long_ticks: 0, scale: 100 };
        Token::Visit(Step { cell, direction: None })
    }

    #[test]
    fn window_slides_and_resets_on_boundary() {
        let mut window = ContextWindow::new(2);
        assert_eq!(window.last(), Context::Start);

        for t in [visit(1), visit(2), visit(3)] {
            window.push(&t);
        }
        assert_eq!(window.last(), visit(3).cell().map(Context::Cell).unwrap());
        assert_eq!(window.get(1), visit(2).cell().map(Context::Cell).unwrap());
        assert_eq!(window.get(2), Context::Start);

        window.push(&Token::Boundary);
        assert_eq!(window.last(), Context::Start);
        assert_eq!(window.get(1), Context::Start);

        window.push(&visit(4));
        assert_eq!(window.last(), visit(4).cell().map(Context::Cell).unwrap());
        assert_eq!(window.get(1), Context::Start);
    }
}
