//! First-order model conditioned on the current cell and direction of
//! movement, with add-one smoothing over the observed successors.

use crate::core::context::{Context, ContextWindow};
use crate::core::counts::{most_frequent, Adjacency, CountTable};
use crate::core::types::{CellId, DaySequence, Direction, Token};
use crate::models::{LocationModel, Prediction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionalQuery {
    pub context: Context,
    pub direction: Option<Direction>,
}

impl DirectionalQuery {
    pub fn new(cell: CellId, direction: Option<Direction>) -> Self {
        Self {
            context: Context::Cell(cell),
            direction,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionalModel {
    /// (cell, direction) occurrences.
    unigrams: CountTable<(Context, Option<Direction>)>,
    /// (context, cell, direction of the cell) transitions.
    bigrams: CountTable<(Context, CellId, Option<Direction>)>,
    adjacency: Adjacency,
    most_frequent: Option<CellId>,
}

impl DirectionalModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback cell: the `(cell, direction)` pair seen most often, ties to
    /// the smallest cell.
    pub fn most_frequent(&self) -> Option<CellId> {
        self.most_frequent
    }

    pub fn unigram_count(&self, context: Context, direction: Option<Direction>) -> u64 {
        self.unigrams.get(&(context, direction))
    }

    pub fn bigram_count(
        &self,
        context: Context,
        cell: CellId,
        direction: Option<Direction>,
    ) -> u64 {
        self.bigrams.get(&(context, cell, direction))
    }

    pub fn successors(&self, context: &Context) -> impl Iterator<Item = &CellId> {
        self.adjacency.successors(context)
    }
}

impl LocationModel for DirectionalModel {
    type Query = DirectionalQuery;

    fn order(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        self.unigrams.clear();
        self.bigrams.clear();
        self.adjacency.clear();
        self.most_frequent = None;
    }

    fn train<'a, I>(&mut self, days: I)
    where
        I: IntoIterator<Item = &'a DaySequence>,
    {
        let mut window = ContextWindow::new(1);
        for token in days.into_iter().flat_map(DaySequence::tokens) {
            let Some(step) = token.step() else {
                window.reset();
                continue;
            };
            let context = window.last();
            self.unigrams
                .increment((Context::Cell(step.cell), step.direction));
            self.bigrams.increment((context, step.cell, step.direction));
            self.adjacency.insert(context, step.cell);
            window.push_cell(step.cell);
        }

        self.most_frequent = most_frequent(self.unigrams.iter().filter_map(
            |(&(context, _), count)| match context {
                Context::Cell(cell) => Some((cell, count)),
                Context::Start => None,
            },
        ));
    }

    /// `P(c) = (bigram(ctx, c, dir) + 1) / (unigram(ctx, dir) + |succ(ctx)|)`
    /// over the observed successors of `ctx`; the first maximum wins.
    fn predict(&self, query: &DirectionalQuery) -> Prediction {
        let degree = self.adjacency.degree(&query.context);
        if degree == 0 {
            return Prediction::fallback(self.most_frequent);
        }

        let denominator =
            (self.unigram_count(query.context, query.direction) + degree as u64) as f64;
        let mut best = Prediction::fallback(self.most_frequent);
        for &candidate in self.adjacency.successors(&query.context) {
            let numerator = self.bigram_count(query.context, candidate, query.direction) + 1;
            let probability = numerator as f64 / denominator;
            if probability > best.probability {
                best = Prediction {
                    cell: Some(candidate),
                    probability,
                };
            }
        }
        best
    }

    fn query(&self, window: &[Token]) -> DirectionalQuery {
        match window.last().and_then(Token::step) {
            Some(step) => DirectionalQuery::new(step.cell, step.direction),
            None => DirectionalQuery {
                context: Context::Start,
                direction: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Step;

    fn cell(lat: i64) -> CellId {
        CellId { lat_ticks: lat, long_ticks: 0, scale: 100 }
    }

    fn day(steps: &[(i64, Option<Direction>)]) -> DaySequence {
        DaySequence::from_tokens(
            steps
                .iter()
                .map(|&(lat, direction)| Token::Visit(Step { cell: cell(lat), direction }))
                .collect(),
        )
    }

    #[test]
    fn counts_follow_day_boundaries() {
        let mut model = DirectionalModel::new();
        let days = [
            day(&[(1, None), (2, Some(Direction::N)), (3, Some(Direction::N))]),
            day(&[(2, None), (3, Some(Direction::N))]),
        ];
        model.train(&days);

        assert_eq!(model.bigram_count(Context::Start, cell(1), None), 1);
        assert_eq!(model.bigram_count(Context::Start, cell(2), None), 1);
        assert_eq!(
            model.bigram_count(Context::Cell(cell(2)), cell(3), Some(Direction::N)),
            2
        );
        // day 1 never flows into day 2
        assert_eq!(model.bigram_count(Context::Cell(cell(3)), cell(2), None), 0);
        assert_eq!(model.unigram_count(Context::Cell(cell(3)), Some(Direction::N)), 2);
        assert_eq!(model.most_frequent(), Some(cell(3)));
    }

    #[test]
    fn add_one_smoothing_over_observed_successors() {
        let mut model = DirectionalModel::new();
        let days = [
            day(&[(1, Some(Direction::E)), (2, Some(Direction::E))]),
            day(&[(1, Some(Direction::E)), (2, Some(Direction::E))]),
            day(&[(1, Some(Direction::E)), (3, Some(Direction::N))]),
        ];
        model.train(&days);

        let prediction = model.predict(&DirectionalQuery::new(cell(1), Some(Direction::E)));
        assert_eq!(prediction.cell, Some(cell(2)));
        // (bigram(1, 2, E) + 1) / (unigram(1, E) + |{2, 3}|) = (2 + 1) / (3 + 2)
        assert!((prediction.probability - 0.6).abs() < 1e-12);

        // unseen direction still yields a positive probability
        let prediction = model.predict(&DirectionalQuery::new(cell(1), Some(Direction::S)));
        assert!(prediction.probability > 0.0);
        assert!((prediction.probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unseen_context_falls_back() {
        let mut model = DirectionalModel::new();
        model.train(&[day(&[(1, None), (2, None), (2, None)])]);
        let prediction = model.predict(&DirectionalQuery::new(cell(9), None));
        assert_eq!(prediction, Prediction::fallback(Some(cell(2))));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut model = DirectionalModel::new();
        model.train(&[day(&[(1, None), (2, None)])]);
        model.reset();
        model.train(std::iter::empty());
        let prediction = model.predict(&DirectionalQuery::new(cell(1), None));
        assert_eq!(prediction, Prediction::fallback(None));
    }

    #[test]
    fn evaluates_adjacent_pairs() {
        let mut model = DirectionalModel::new();
        let training = day(&[(1, None), (2, None), (3, None), (4, None)]);
        model.train([&training]);

        // 4 fixes + boundary -> 3 evaluable positions; the pair ending at the
        // boundary is not scored
        let held_out = day(&[(1, None), (2, None), (3, None), (9, None)]);
        let eval = model.evaluate(&held_out);
        assert_eq!(eval.total, 3);
        assert_eq!(eval.correct, 2);
    }
}
