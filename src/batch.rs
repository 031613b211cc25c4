//! Runs the harness over several independent datasets.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::harness::{CrossValidationReport, CrossValidator, Strategy};
use crate::models::LocationModel;
use tracing::info;

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub reports: Vec<CrossValidationReport>,
    /// Average of the per-dataset mean accuracies. Datasets without a mean
    /// are left out.
    pub average_accuracy: Option<f64>,
}

/// Cross-validates every `(dataset, strategy)` pair with `model`, in order.
pub fn run_batch<'a, M, I>(
    validator: &CrossValidator,
    model: &mut M,
    runs: I,
) -> Result<BatchReport>
where
    M: LocationModel + Clone + Send + Sync,
    I: IntoIterator<Item = (&'a Dataset, Strategy)>,
{
    let mut reports = Vec::new();
    for (dataset, strategy) in runs {
        reports.push(validator.run(model, dataset, strategy)?);
    }

    let means: Vec<f64> = reports.iter().filter_map(|r| r.mean_accuracy).collect();
    let average_accuracy =
        (!means.is_empty()).then(|| means.iter().sum::<f64>() / means.len() as f64);
    info!(
        runs = reports.len(),
        averaged = means.len(),
        average_accuracy = ?average_accuracy,
        "batch evaluation complete"
    );

    Ok(BatchReport {
        reports,
        average_accuracy,
    })
}
