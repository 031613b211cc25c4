//! Configuration records.
//!
//! Every component takes the record it needs at construction time; nothing is
//! read from process-wide state. All fields affect results, not just output.
//!
//! # Example
//!
//! ```
//! use markov_core::config::Config;
//!
//! let config = Config::from_toml_str(
//!     r#"
//!     [preprocess]
//!     grid_scale = 1000
//!     segment = true
//!
//!     [harness]
//!     exclude_short_days = false
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.preprocess.grid_scale, 1000);
//! assert_eq!(config.preprocess.segment_threshold_ms, 3_600_000);
//! ```

use crate::error::{PredictionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Controls how raw fixes become a [`DaySequence`](crate::core::types::DaySequence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Grid resolution: 100 truncates coordinates to two decimals.
    pub grid_scale: u32,
    /// Drop a fix whose cell equals the previously kept fix's cell.
    pub ignore_repetitions: bool,
    /// Restrict the repetition rule to interpolated fixes.
    pub ignore_added_only: bool,
    /// Split a day into trips at long gaps between kept fixes.
    pub segment: bool,
    /// Gap (ms) at or above which a trip boundary is inserted.
    pub segment_threshold_ms: u64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            grid_scale: 100,
            ignore_repetitions: true,
            ignore_added_only: false,
            segment: false,
            segment_threshold_ms: 60 * 60 * 1000,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_scale == 0 {
            return Err(PredictionError::invalid_config(
                "grid_scale must be a positive integer",
            ));
        }
        if self.segment_threshold_ms == 0 {
            return Err(PredictionError::invalid_config(
                "segment_threshold_ms must be positive",
            ));
        }
        Ok(())
    }
}

/// Controls fold evaluation and aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Days with this many evaluable positions or fewer are short.
    pub min_evaluable_positions: usize,
    /// Leave short days out of the mean and the best-fold search.
    pub exclude_short_days: bool,
    /// Evaluate and report folds with an empty training set.
    pub evaluate_untrained_folds: bool,
    /// Evaluate folds on the rayon thread pool.
    pub parallel: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            min_evaluable_positions: 5,
            exclude_short_days: true,
            evaluate_untrained_folds: true,
            parallel: false,
        }
    }
}

/// Top-level configuration, as read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub preprocess: PreprocessConfig,
    pub harness: HarnessConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.preprocess.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.preprocess.grid_scale, 100);
        assert!(config.preprocess.ignore_repetitions);
        assert!(!config.preprocess.ignore_added_only);
        assert!(!config.preprocess.segment);
        assert_eq!(config.preprocess.segment_threshold_ms, 3_600_000);
        assert_eq!(config.harness.min_evaluable_positions, 5);
        assert!(config.harness.exclude_short_days);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn rejects_zero_scale_and_threshold() {
        let err = Config::from_toml_str("[preprocess]\ngrid_scale = 0\n").unwrap_err();
        assert!(matches!(err, PredictionError::InvalidConfiguration(_)));

        let err =
            Config::from_toml_str("[preprocess]\nsegment_threshold_ms = 0\n").unwrap_err();
        assert!(matches!(err, PredictionError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_negative_scale_at_parse_time() {
        let err = Config::from_toml_str("[preprocess]\ngrid_scale = -100\n").unwrap_err();
        assert!(matches!(err, PredictionError::Config(_)));
    }
}
