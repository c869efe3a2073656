//! Reporting utilities: regression metrics, residuals, and rankings.
//!
//! Terminal formatting lives in `format` so the math here stays testable.

use serde::Serialize;

use crate::domain::Record;
use crate::error::{PipelineError, Result};

pub mod format;

pub use format::*;

/// Hold-out quality of a fitted pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub n: usize,
    /// Coefficient of determination. `None` when the targets are constant.
    pub r2: Option<f64>,
    pub mae: f64,
    pub rmse: f64,
}

impl RegressionMetrics {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if actual.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if actual.len() != predicted.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: actual.len(),
                actual: predicted.len(),
            });
        }

        let n = actual.len() as f64;
        let mean = actual.iter().sum::<f64>() / n;
        let mut sse = 0.0;
        let mut sst = 0.0;
        let mut abs = 0.0;
        for (y, p) in actual.iter().zip(predicted) {
            let r = y - p;
            sse += r * r;
            abs += r.abs();
            sst += (y - mean).powi(2);
        }

        Ok(Self {
            n: actual.len(),
            r2: (sst > 0.0).then(|| 1.0 - sse / sst),
            mae: abs / n,
            rmse: (sse / n).sqrt(),
        })
    }
}

/// One scored row.
#[derive(Debug, Clone, PartialEq)]
pub struct Residual {
    pub record: Record,
    pub actual: f64,
    pub predicted: f64,
    /// `actual - predicted`; positive means the model under-predicted.
    pub residual: f64,
}

/// Largest misses on each side (top-N each).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rankings {
    pub under: Vec<Residual>,
    pub over: Vec<Residual>,
}

pub fn compute_residuals(records: &[Record], actual: &[f64], predicted: &[f64]) -> Result<Vec<Residual>> {
    if records.len() != actual.len() || actual.len() != predicted.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: records.len(),
            actual: actual.len().min(predicted.len()),
        });
    }
    Ok(records
        .iter()
        .zip(actual.iter().zip(predicted))
        .map(|(record, (&actual, &predicted))| Residual {
            record: record.clone(),
            actual,
            predicted,
            residual: actual - predicted,
        })
        .collect())
}

/// Rank the rows the model under- and over-predicted the most.
pub fn rank_errors(residuals: &[Residual], top_n: usize) -> Rankings {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.total_cmp(&a.residual));
    let under = sorted
        .iter()
        .take(top_n)
        .filter(|r| r.residual > 0.0)
        .cloned()
        .collect();

    sorted.reverse();
    let over = sorted
        .iter()
        .take(top_n)
        .filter(|r| r.residual < 0.0)
        .cloned()
        .collect();

    Rankings { under, over }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_on_known_inputs() {
        let m = RegressionMetrics::compute(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 4.0, 2.0]).unwrap();
        assert_eq!(m.n, 4);
        assert!((m.mae - 0.75).abs() < 1e-12);
        assert!((m.rmse - (5.0f64 / 4.0).sqrt()).abs() < 1e-12);
        // sst = 5, sse = 5
        assert!(m.r2.unwrap().abs() < 1e-12);

        let perfect = RegressionMetrics::compute(&[10.0, 20.0], &[10.0, 20.0]).unwrap();
        assert_eq!(perfect.r2, Some(1.0));
        assert_eq!(perfect.rmse, 0.0);
    }

    #[test]
    fn r2_is_undefined_for_constant_targets() {
        let m = RegressionMetrics::compute(&[5.0, 5.0], &[4.0, 6.0]).unwrap();
        assert_eq!(m.r2, None);
        assert_eq!(m.mae, 1.0);
    }

    #[test]
    fn metrics_reject_bad_shapes() {
        assert_eq!(RegressionMetrics::compute(&[], &[]), Err(PipelineError::EmptyDataset));
        assert!(matches!(
            RegressionMetrics::compute(&[1.0], &[1.0, 2.0]),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn rankings_split_by_sign() {
        let record = Record::new(30.0, "Male", "PhD", "Engineer", 5.0).unwrap();
        let records = vec![record; 4];
        let residuals =
            compute_residuals(&records, &[100.0, 100.0, 100.0, 100.0], &[70.0, 90.0, 100.0, 150.0]).unwrap();
        let rankings = rank_errors(&residuals, 2);

        let under: Vec<f64> = rankings.under.iter().map(|r| r.residual).collect();
        let over: Vec<f64> = rankings.over.iter().map(|r| r.residual).collect();
        assert_eq!(under, vec![30.0, 10.0]);
        assert_eq!(over, vec![-50.0]);
    }
}
