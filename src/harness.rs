//! Cross-validation over the days of a [`Dataset`].
//!
//! Every fold holds out one day. Leave-one-out trains on all other days;
//! sequential trains only on the days loaded before the held-out one, so its
//! first fold has nothing to learn from and never enters the aggregate.

use crate::config::HarnessConfig;
use crate::core::types::DayId;
use crate::dataset::Dataset;
use crate::error::{PredictionError, Result};
use crate::models::{Evaluation, LocationModel};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    LeaveOneOut,
    Sequential,
}

impl Strategy {
    /// One fold per index, testing that index.
    pub fn folds(&self, indices: &[usize]) -> Vec<Fold> {
        indices
            .iter()
            .enumerate()
            .map(|(i, &test)| {
                let train = match self {
                    Strategy::LeaveOneOut => indices[..i]
                        .iter()
                        .chain(&indices[i + 1..])
                        .copied()
                        .collect(),
                    Strategy::Sequential => indices[..i].to_vec(),
                };
                Fold {
                    index: i,
                    train,
                    test: vec![test],
                }
            })
            .collect()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LeaveOneOut => f.write_str("leave-one-out"),
            Strategy::Sequential => f.write_str("sequential"),
        }
    }
}

impl FromStr for Strategy {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "loo" | "leave-one-out" => Ok(Strategy::LeaveOneOut),
            "seq" | "sequential" => Ok(Strategy::Sequential),
            other => Err(PredictionError::invalid_config(format!(
                "unknown strategy '{other}'"
            ))),
        }
    }
}

/// One train/test split, in internal day indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    pub index: usize,
    pub train_days: Vec<DayId>,
    pub test_days: Vec<DayId>,
    pub evaluation: Evaluation,
    /// Whether the fold entered the mean and the best-fold search.
    pub counted: bool,
}

impl FoldReport {
    pub fn accuracy(&self) -> Option<f64> {
        self.evaluation.accuracy()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestFold {
    pub index: usize,
    pub accuracy: f64,
    pub train_days: Vec<DayId>,
    pub test_days: Vec<DayId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub strategy: Strategy,
    pub folds: Vec<FoldReport>,
    /// First fold reaching the maximum accuracy among counted folds.
    pub best: Option<BestFold>,
    /// Mean accuracy over counted folds.
    pub mean_accuracy: Option<f64>,
}

impl CrossValidationReport {
    pub fn max_accuracy(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.accuracy)
    }

    pub fn counted_folds(&self) -> usize {
        self.folds.iter().filter(|f| f.counted).count()
    }
}

pub struct CrossValidator {
    config: HarnessConfig,
}

impl CrossValidator {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs every fold of `strategy` and aggregates the results.
    ///
    /// Folds run one after another on `model`, each preceded by a reset. With
    /// `parallel` set, each fold instead runs on its own clone of `model` and
    /// `model` itself is left untouched.
    pub fn run<M>(
        &self,
        model: &mut M,
        dataset: &Dataset,
        strategy: Strategy,
    ) -> Result<CrossValidationReport>
    where
        M: LocationModel + Clone + Send + Sync,
    {
        if dataset.is_empty() {
            return Err(PredictionError::EmptyDataset);
        }

        let folds: Vec<Fold> = strategy
            .folds(&dataset.indices())
            .into_iter()
            .filter(|fold| self.config.evaluate_untrained_folds || !fold.train.is_empty())
            .collect();

        let evaluations: Vec<Evaluation> = if self.config.parallel {
            let prototype: &M = model;
            folds
                .par_iter()
                .map(|fold| evaluate_fold(&mut prototype.clone(), dataset, fold))
                .collect::<Result<Vec<_>>>()?
        } else {
            folds
                .iter()
                .map(|fold| evaluate_fold(&mut *model, dataset, fold))
                .collect::<Result<Vec<_>>>()?
        };

        let report = self.aggregate(dataset, strategy, &folds, evaluations);
        match (report.max_accuracy(), report.mean_accuracy) {
            (Some(max), Some(mean)) => info!(
                %strategy,
                folds = report.folds.len(),
                counted = report.counted_folds(),
                max_accuracy = max,
                mean_accuracy = mean,
                "cross-validation complete"
            ),
            _ => warn!(
                %strategy,
                folds = report.folds.len(),
                "cross-validation produced no countable fold"
            ),
        }
        Ok(report)
    }

    /// Resets `model` and trains it on every day of `dataset`.
    pub fn fit_all<M: LocationModel>(&self, model: &mut M, dataset: &Dataset) -> Result<()> {
        if dataset.is_empty() {
            return Err(PredictionError::EmptyDataset);
        }
        model.reset();
        model.train(dataset.select(&dataset.indices()));
        Ok(())
    }

    fn is_countable(&self, fold: &Fold, evaluation: &Evaluation) -> bool {
        if fold.train.is_empty() {
            return false;
        }
        if self.config.exclude_short_days {
            evaluation.total > self.config.min_evaluable_positions
        } else {
            evaluation.total > 0
        }
    }

    fn aggregate(
        &self,
        dataset: &Dataset,
        strategy: Strategy,
        folds: &[Fold],
        evaluations: Vec<Evaluation>,
    ) -> CrossValidationReport {
        let mut reports = Vec::with_capacity(folds.len());
        let mut best: Option<BestFold> = None;
        let mut sum = 0.0;
        let mut counted = 0usize;

        for (fold, evaluation) in folds.iter().zip(evaluations) {
            let is_counted = self.is_countable(fold, &evaluation);
            let report = FoldReport {
                index: fold.index,
                train_days: dataset.ids_of(&fold.train),
                test_days: dataset.ids_of(&fold.test),
                evaluation,
                counted: is_counted,
            };
            debug!(
                fold = fold.index,
                test_days = ?report.test_days,
                correct = evaluation.correct,
                total = evaluation.total,
                accuracy = ?evaluation.accuracy(),
                counted = is_counted,
                "fold evaluated"
            );

            if let Some(accuracy) = evaluation.accuracy().filter(|_| is_counted) {
                sum += accuracy;
                counted += 1;
                if best.as_ref().map_or(true, |b| accuracy > b.accuracy) {
                    best = Some(BestFold {
                        index: fold.index,
                        accuracy,
                        train_days: report.train_days.clone(),
                        test_days: report.test_days.clone(),
                    });
                }
            }
            reports.push(report);
        }

        CrossValidationReport {
            strategy,
            folds: reports,
            best,
            mean_accuracy: (counted > 0).then(|| sum / counted as f64),
        }
    }
}

/// Reset, train and test one fold. A panic inside the model is reported
/// with the fold index and held-out days.
fn evaluate_fold<M: LocationModel>(
    model: &mut M,
    dataset: &Dataset,
    fold: &Fold,
) -> Result<Evaluation> {
    catch_unwind(AssertUnwindSafe(|| {
        model.reset();
        model.train(dataset.select(&fold.train));
        dataset
            .select(&fold.test)
            .map(|day| model.evaluate(day))
            .fold(Evaluation::default(), |acc, e| Evaluation {
                correct: acc.correct + e.correct,
                total: acc.total + e.total,
            })
    }))
    .map_err(|payload| PredictionError::FoldFailed {
        fold: fold.index,
        test_days: dataset.ids_of(&fold.test),
        reason: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "model panicked".to_string()
    }
}
