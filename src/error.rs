//! Error types for location prediction.

use crate::core::types::DayId;
use thiserror::Error;

/// Main error type for preprocessing, training and evaluation.
#[derive(Error, Debug)]
pub enum PredictionError {
    /// A configuration record failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The harness was handed a dataset without days.
    #[error("Dataset contains no days")]
    EmptyDataset,

    /// A fix could not be discretized.
    #[error("Malformed fix at position {position}: {reason}")]
    MalformedFix { position: usize, reason: String },

    /// The same external day id was loaded twice.
    #[error("Day {0} is already part of the dataset")]
    DuplicateDay(DayId),

    /// Lookup of an external day id that was never loaded.
    #[error("Day {0} is not part of the dataset")]
    UnknownDay(DayId),

    /// A fold could not be evaluated.
    #[error("Fold {fold} (test days {test_days:?}) failed: {reason}")]
    FoldFailed {
        fold: usize,
        test_days: Vec<DayId>,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Day file parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for location prediction operations.
pub type Result<T> = std::result::Result<T, PredictionError>;

impl PredictionError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a malformed fix error.
    #[must_use]
    pub fn malformed_fix(position: usize, reason: impl Into<String>) -> Self {
        Self::MalformedFix {
            position,
            reason: reason.into(),
        }
    }
}
