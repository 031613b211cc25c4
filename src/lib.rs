// src/lib.rs
//! Next-location prediction over discretized GPS trajectories.
//!
//! Raw fixes are truncated onto a flat grid and cleaned into per-day label
//! sequences ([`preprocess`]). Two Markov frequency models ([`models`]) learn
//! from those days and are scored by leave-one-out or sequential
//! cross-validation ([`harness`], [`batch`]).

pub mod batch;
pub mod config;
pub mod core;
pub mod dataset;
pub mod error;
pub mod harness;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod preprocess;

pub use crate::config::{Config, HarnessConfig, PreprocessConfig};
pub use crate::core::types::{CellId, DayId, DaySequence, Direction, Fix};
pub use crate::dataset::Dataset;
pub use crate::error::{PredictionError, Result};
pub use crate::harness::{CrossValidationReport, CrossValidator, Strategy};
pub use crate::models::{BackoffModel, DirectionalModel, LocationModel, Prediction};
pub use crate::preprocess::TrajectoryPreprocessor;
