//! Shared configuration types.
//!
//! These are kept serializable so the chosen settings can travel inside the
//! persisted artifact and be reported back by `salary inspect`.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::forest::ForestParams;

/// What the feature transformer does with a categorical value it never saw
/// during fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategoryPolicy {
    /// Encode the field as an all-zero block.
    #[default]
    Ignore,
    /// Fail the call with `UnknownCategory`.
    Error,
}

/// Resolved settings for a `salary train` run.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    /// Fraction of rows held out for evaluation.
    pub test_fraction: f64,
    /// Seed for the train/test shuffle.
    pub split_seed: u64,
    pub forest: ForestParams,
    pub unknown_category: UnknownCategoryPolicy,
}
