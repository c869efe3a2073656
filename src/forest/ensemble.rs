//! Random forest regressor.
//!
//! Each tree is grown on its own bootstrap resample with its own RNG stream
//! derived from `(seed, tree_index)`. Trees are grown in parallel with rayon,
//! but because no RNG state is shared the fitted forest is identical for any
//! thread count.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::features::FeatureVector;
use crate::forest::params::ForestParams;
use crate::forest::tree::{GrowLimits, RegressionTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    /// Feature width seen at fit time (0 before fit).
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fit the forest to `x` / `y`, replacing any previous trees.
    pub fn fit(&mut self, x: &[FeatureVector], y: &[f64]) -> Result<()> {
        self.params.validate()?;
        if x.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != n_features) {
            return Err(PipelineError::DimensionMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        if let Some(row) = x.iter().position(|row| row.iter().any(|v| !v.is_finite())) {
            return Err(PipelineError::schema("features", format!("row {row} has a non-finite value")));
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::schema("target", format!("row {row} is not finite")));
        }

        let limits = GrowLimits {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.max_features.resolve(n_features),
        };
        debug!(
            rows = x.len(),
            n_features,
            n_trees = self.params.n_trees,
            max_features = limits.max_features,
            "growing forest"
        );

        let grow_all = || -> Vec<RegressionTree> {
            (0..self.params.n_trees)
                .into_par_iter()
                .map(|tree_idx| self.grow_tree(tree_idx, x, y, limits))
                .collect()
        };
        let trees = match self.params.n_jobs {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| PipelineError::InvalidParams(format!("thread pool: {e}")))?
                .install(grow_all),
            None => grow_all(),
        };

        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    fn grow_tree(&self, tree_idx: usize, x: &[FeatureVector], y: &[f64], limits: GrowLimits) -> RegressionTree {
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        rng.set_stream(tree_idx as u64);

        let n = x.len();
        let sample: Vec<usize> = if self.params.bootstrap {
            (0..n).map(|_| rng.gen_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        RegressionTree::grow(x, y, sample, limits, &mut rng)
    }

    /// Mean of the per-tree predictions for one row.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted);
        }
        if row.len() != self.n_features {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        // Summed in tree order so the result never depends on scheduling.
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    pub fn predict(&self, x: &[FeatureVector]) -> Result<Vec<f64>> {
        x.par_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Check a deserialized forest before it is trusted for inference.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {idx}: {e}"))?;
        }
        Ok(())
    }
}
