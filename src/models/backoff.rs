//! Second-order model with tiered back-off and no smoothing.
//!
//! Tier 1 scores each observed successor `c` of `prev` by
//! `trigram(prev2, prev, c) / bigram(prev, c)`. When every tier-1 score is
//! zero the model backs off to `bigram(prev, c) / unigram(prev)`, and when
//! that is zero too (unseen `prev`) it answers with the most visited cell at
//! probability zero. A zero denominator scores zero instead of dividing.

use crate::core::context::{Context, ContextWindow};
use crate::core::counts::{most_frequent, Adjacency, CountTable};
use crate::core::types::{CellId, DaySequence, Token};
use crate::models::{LocationModel, Prediction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffQuery {
    pub prev2: Context,
    pub prev: Context,
}

impl BackoffQuery {
    pub fn new(prev2: impl Into<Context>, prev: impl Into<Context>) -> Self {
        Self {
            prev2: prev2.into(),
            prev: prev.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackoffModel {
    /// Occurrences of each cell, plus one `Start` per day or trip.
    unigrams: CountTable<Context>,
    bigrams: CountTable<(Context, CellId)>,
    trigrams: CountTable<(Context, Context, CellId)>,
    /// Successors keyed by the immediate predecessor only.
    adjacency: Adjacency,
    most_frequent: Option<CellId>,
}

impl BackoffModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn most_frequent(&self) -> Option<CellId> {
        self.most_frequent
    }

    pub fn unigram_count(&self, context: Context) -> u64 {
        self.unigrams.get(&context)
    }

    pub fn bigram_count(&self, prev: Context, cell: CellId) -> u64 {
        self.bigrams.get(&(prev, cell))
    }

    pub fn trigram_count(&self, prev2: Context, prev: Context, cell: CellId) -> u64 {
        self.trigrams.get(&(prev2, prev, cell))
    }

    /// Picks the successor of `prev` with the highest score, first maximum
    /// winning. Returns `None` when no candidate scores above zero.
    fn best_by<F>(&self, prev: &Context, score: F) -> Option<Prediction>
    where
        F: Fn(CellId) -> f64,
    {
        let mut best: Option<Prediction> = None;
        for &candidate in self.adjacency.successors(prev) {
            let probability = score(candidate);
            if probability > best.map_or(0.0, |b| b.probability) {
                best = Some(Prediction {
                    cell: Some(candidate),
                    probability,
                });
            }
        }
        best
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl LocationModel for BackoffModel {
    type Query = BackoffQuery;

    fn order(&self) -> usize {
        2
    }

    fn reset(&mut self) {
        self.unigrams.clear();
        self.bigrams.clear();
        self.trigrams.clear();
        self.adjacency.clear();
        self.most_frequent = None;
    }

    fn train<'a, I>(&mut self, days: I)
    where
        I: IntoIterator<Item = &'a DaySequence>,
    {
        let mut window = ContextWindow::new(2);
        for token in days.into_iter().flat_map(DaySequence::tokens) {
            let Some(step) = token.step() else {
                window.reset();
                continue;
            };
            let (prev2, prev) = (window.get(1), window.get(0));
            if prev == Context::Start {
                self.unigrams.increment(Context::Start);
            }
            self.unigrams.increment(Context::Cell(step.cell));
            self.bigrams.increment((prev, step.cell));
            self.trigrams.increment((prev2, prev, step.cell));
            self.adjacency.insert(prev, step.cell);
            window.push_cell(step.cell);
        }

        self.most_frequent = most_frequent(self.unigrams.iter().filter_map(
            |(&context, count)| match context {
                Context::Cell(cell) => Some((cell, count)),
                Context::Start => None,
            },
        ));
    }

    fn predict(&self, query: &BackoffQuery) -> Prediction {
        let BackoffQuery { prev2, prev } = *query;

        let trigram_tier = self.best_by(&prev, |c| {
            ratio(self.trigram_count(prev2, prev, c), self.bigram_count(prev, c))
        });
        if let Some(prediction) = trigram_tier {
            return prediction;
        }

        let unigram = self.unigram_count(prev);
        let bigram_tier = self.best_by(&prev, |c| ratio(self.bigram_count(prev, c), unigram));
        bigram_tier.unwrap_or_else(|| Prediction::fallback(self.most_frequent))
    }

    fn query(&self, window: &[Token]) -> BackoffQuery {
        let mut context = ContextWindow::new(2);
        for token in window {
            context.push(token);
        }
        BackoffQuery {
            prev2: context.get(1),
            prev: context.get(0),
        }
    }
}
