//! Labeled training data and the seeded train/test split.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::domain::record::Record;
use crate::domain::schema::TARGET_KEY;
use crate::error::{PipelineError, Result};

/// Records paired with their salary targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    targets: Vec<f64>,
}

impl Dataset {
    pub fn new(records: Vec<Record>, targets: Vec<f64>) -> Result<Self> {
        if records.len() != targets.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: records.len(),
                actual: targets.len(),
            });
        }
        if let Some(bad) = targets.iter().find(|y| !y.is_finite()) {
            return Err(PipelineError::schema(TARGET_KEY, format!("must be finite, got {bad}")));
        }
        Ok(Self { records, targets })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Shuffle with `seed` and hold out `ceil(test_fraction * n)` rows.
    ///
    /// Returns `(train, test)`. A fraction of `0.0` keeps every row for training.
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(PipelineError::InvalidParams(format!(
                "test fraction must be in [0, 1), got {test_fraction}"
            )));
        }

        let n = self.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let n_test = ((n as f64) * test_fraction).ceil() as usize;
        let n_test = n_test.min(n.saturating_sub(1));
        let (test_idx, train_idx) = order.split_at(n_test);

        Ok((self.subset(train_idx), self.subset(test_idx)))
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }
}
