//! Frequency models behind one train / predict / reset contract.

pub mod backoff;
pub mod directional;

pub use backoff::{BackoffModel, BackoffQuery};
pub use directional::{DirectionalModel, DirectionalQuery};

use crate::core::types::{CellId, DaySequence, Token};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::trace;

/// Predicted next cell and its estimated probability.
///
/// `probability == 0.0` marks the fallback path; `cell` is `None` only when
/// the model was trained on nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub cell: Option<CellId>,
    pub probability: f64,
}

impl Prediction {
    pub fn fallback(cell: Option<CellId>) -> Self {
        Self {
            cell,
            probability: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.probability == 0.0
    }
}

/// Hits over evaluable positions of one held-out day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
}

impl Evaluation {
    /// `None` when the day had no evaluable position.
    pub fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }
}

/// A next-cell estimator trained from whole days.
///
/// Implementations must forget everything on [`reset`](Self::reset); the
/// harness resets before every fold.
pub trait LocationModel {
    type Query: Debug;

    /// Number of preceding tokens a query is built from.
    fn order(&self) -> usize;

    fn reset(&mut self);

    /// Accumulates counts from `days`. Context restarts at every boundary.
    fn train<'a, I>(&mut self, days: I)
    where
        I: IntoIterator<Item = &'a DaySequence>;

    fn predict(&self, query: &Self::Query) -> Prediction;

    /// Builds the query for the `order()` tokens in `window`. A boundary in
    /// the window reads as the start symbol.
    fn query(&self, window: &[Token]) -> Self::Query;

    /// Scores the model on one held-out day.
    ///
    /// Every window of `order()` tokens is used to predict the token after it,
    /// stopping before the trailing boundary, so a day of `len` tokens has
    /// `len - order() - 1` evaluable positions. A boundary target is a miss.
    fn evaluate(&self, day: &DaySequence) -> Evaluation {
        let tokens = day.tokens();
        let order = self.order();
        let total = tokens.len().saturating_sub(order + 1);
        let mut correct = 0;

        for i in 0..total {
            let query = self.query(&tokens[i..i + order]);
            let prediction = self.predict(&query);
            let actual = tokens[i + order].cell();
            let hit = actual.is_some() && prediction.cell == actual;
            if hit {
                correct += 1;
            }
            trace!(
                position = i,
                ?query,
                predicted = ?prediction.cell,
                ?actual,
                hit,
                "prediction"
            );
        }

        Evaluation { correct, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_is_undefined_without_positions() {
        assert_eq!(Evaluation::default().accuracy(), None);
        let eval = Evaluation { correct: 3, total: 4 };
        assert_eq!(eval.accuracy(), Some(0.75));
    }

    #[test]
    fn fallback_has_zero_probability() {
        let prediction = Prediction::fallback(None);
        assert!(prediction.is_fallback());
        assert_eq!(prediction.cell, None);
    }
}
