//! Random forest hyperparameters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// How many feature columns a split may consider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Every column (plain bagging).
    All,
    /// `ceil(sqrt(n))`.
    Sqrt,
    /// `ceil(n / 3)`, the usual regression-forest choice.
    Third,
    /// A fraction of the columns, rounded up.
    Fraction(f64),
    /// A fixed count, capped at `n`.
    Fixed(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns (at least 1).
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => n.sqrt().ceil() as usize,
            MaxFeatures::Third => (n / 3.0).ceil() as usize,
            MaxFeatures::Fraction(f) => (n * f).ceil() as usize,
            MaxFeatures::Fixed(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(MaxFeatures::All),
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "third" => Ok(MaxFeatures::Third),
            other => {
                if let Ok(k) = other.parse::<usize>() {
                    return Ok(MaxFeatures::Fixed(k));
                }
                match other.parse::<f64>() {
                    Ok(f) if f > 0.0 && f <= 1.0 => Ok(MaxFeatures::Fraction(f)),
                    _ => Err(format!(
                        "invalid max-features '{s}': expected all, sqrt, third, a count, or a fraction in (0, 1]"
                    )),
                }
            }
        }
    }
}

impl std::fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxFeatures::All => f.write_str("all"),
            MaxFeatures::Sqrt => f.write_str("sqrt"),
            MaxFeatures::Third => f.write_str("third"),
            MaxFeatures::Fraction(v) => write!(f, "{v}"),
            MaxFeatures::Fixed(k) => write!(f, "{k}"),
        }
    }
}

/// Training parameters for `RandomForest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// Unlimited when `None`.
    pub max_depth: Option<usize>,
    /// A node with fewer rows becomes a leaf.
    pub min_samples_split: usize,
    /// Neither child of a split may have fewer rows.
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Grow each tree on a bootstrap resample (otherwise on every row).
    pub bootstrap: bool,
    pub seed: u64,
    /// Worker threads for tree growth. Never affects the fitted trees.
    #[serde(skip)]
    pub n_jobs: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Third,
            bootstrap: true,
            seed: 42,
            n_jobs: None,
        }
    }
}

impl ForestParams {
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(PipelineError::InvalidParams("n_trees must be >= 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(PipelineError::InvalidParams("min_samples_split must be >= 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(PipelineError::InvalidParams("min_samples_leaf must be >= 1".into()));
        }
        if self.max_depth == Some(0) {
            return Err(PipelineError::InvalidParams("max_depth must be >= 1".into()));
        }
        match self.max_features {
            MaxFeatures::Fixed(0) => {
                return Err(PipelineError::InvalidParams("max_features must be >= 1".into()));
            }
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(PipelineError::InvalidParams(format!(
                    "max_features fraction must be in (0, 1], got {f}"
                )));
            }
            _ => {}
        }
        if self.n_jobs == Some(0) {
            return Err(PipelineError::InvalidParams("n_jobs must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_features_resolution() {
        assert_eq!(MaxFeatures::All.resolve(9), 9);
        assert_eq!(MaxFeatures::Sqrt.resolve(9), 3);
        assert_eq!(MaxFeatures::Third.resolve(10), 4);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(5), 3);
        assert_eq!(MaxFeatures::Fixed(50).resolve(7), 7);
        assert_eq!(MaxFeatures::Third.resolve(1), 1);
    }

    #[test]
    fn max_features_parses_from_cli_text() {
        assert_eq!("sqrt".parse::<MaxFeatures>(), Ok(MaxFeatures::Sqrt));
        assert_eq!("ALL".parse::<MaxFeatures>(), Ok(MaxFeatures::All));
        assert_eq!("4".parse::<MaxFeatures>(), Ok(MaxFeatures::Fixed(4)));
        assert_eq!("0.25".parse::<MaxFeatures>(), Ok(MaxFeatures::Fraction(0.25)));
        assert!("1.5".parse::<MaxFeatures>().is_err());
        assert!("half".parse::<MaxFeatures>().is_err());
    }

    #[test]
    fn validate_rejects_degenerate_params() {
        assert!(ForestParams::default().validate().is_ok());
        assert!(ForestParams::default().with_n_trees(0).validate().is_err());
        assert!(ForestParams::default().with_min_samples_split(1).validate().is_err());
        assert!(ForestParams::default().with_min_samples_leaf(0).validate().is_err());
        assert!(ForestParams::default().with_max_depth(Some(0)).validate().is_err());
        assert!(ForestParams::default()
            .with_max_features(MaxFeatures::Fixed(0))
            .validate()
            .is_err());
    }
}
