//! The trained pipeline: one feature transformer and the forest fitted on its
//! output, always used and persisted together.
//!
//! - `TrainedPipeline::fit` runs transformer fit → transform → forest fit
//! - `predict_one` runs transform → predict for a single record
//! - `artifact` handles the on-disk binary envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Dataset, Field, Record, TARGET_KEY, UnknownCategoryPolicy};
use crate::error::{PipelineError, Result};
use crate::features::FeatureTransformer;
use crate::forest::{ForestParams, RandomForest};

pub mod artifact;

pub use artifact::*;

/// Settings that shape a pipeline fit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub forest: ForestParams,
    pub unknown_category: UnknownCategoryPolicy,
}

/// Facts recorded when the pipeline was fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingInfo {
    pub crate_version: String,
    pub trained_at: DateTime<Utc>,
    pub n_rows: usize,
    pub target_min: f64,
    pub target_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    transformer: FeatureTransformer,
    forest: RandomForest,
    info: TrainingInfo,
}

impl TrainedPipeline {
    /// Fit the transformer on `records`, then the forest on the encoded rows.
    pub fn fit(config: &PipelineConfig, records: &[Record], targets: &[f64]) -> Result<Self> {
        if records.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if records.len() != targets.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: records.len(),
                actual: targets.len(),
            });
        }
        if let Some(bad) = targets.iter().find(|y| !y.is_finite()) {
            return Err(PipelineError::schema(TARGET_KEY, format!("must be finite, got {bad}")));
        }

        let mut transformer = FeatureTransformer::new(config.unknown_category);
        transformer.fit(records)?;
        let x = transformer.transform_batch(records)?;

        let mut forest = RandomForest::new(config.forest.clone());
        forest.fit(&x, targets)?;

        let info = TrainingInfo {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Utc::now(),
            n_rows: records.len(),
            target_min: targets.iter().copied().fold(f64::INFINITY, f64::min),
            target_max: targets.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        info!(
            rows = info.n_rows,
            width = transformer.width(),
            job_titles = transformer.vocabulary(Field::JobTitle).map_or(0, |v| v.len()),
            trees = forest.n_trees(),
            "pipeline fitted"
        );

        Ok(Self {
            transformer,
            forest,
            info,
        })
    }

    pub fn fit_dataset(config: &PipelineConfig, data: &Dataset) -> Result<Self> {
        Self::fit(config, data.records(), data.targets())
    }

    pub fn predict_one(&self, record: &Record) -> Result<f64> {
        let row = self.transformer.transform(record)?;
        let value = self.forest.predict_row(&row)?;
        debug!(job_title = record.job_title(), value, "predicted");
        Ok(value)
    }

    pub fn predict(&self, records: &[Record]) -> Result<Vec<f64>> {
        let x = self.transformer.transform_batch(records)?;
        self.forest.predict(&x)
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn info(&self) -> &TrainingInfo {
        &self.info
    }

    /// Check that the parts agree with each other (used after loading).
    fn check_consistency(&self) -> std::result::Result<(), String> {
        if !self.transformer.is_fitted() {
            return Err("feature transformer is not fitted".into());
        }
        self.forest.validate()?;
        if self.transformer.width() != self.forest.n_features() {
            return Err(format!(
                "transformer width {} does not match forest width {}",
                self.transformer.width(),
                self.forest.n_features()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::MaxFeatures;

    fn two_people() -> (Vec<Record>, Vec<f64>) {
        (
            vec![
                Record::new(25.0, "Male", "Bachelor's", "Engineer", 2.0).unwrap(),
                Record::new(40.0, "Female", "PhD", "Scientist", 15.0).unwrap(),
            ],
            vec![60000.0, 150000.0],
        )
    }

    #[test]
    fn prediction_is_bounded_by_training_targets() {
        let (records, targets) = two_people();
        let pipeline = TrainedPipeline::fit(&PipelineConfig::default(), &records, &targets).unwrap();
        let value = pipeline.predict_one(&records[0]).unwrap();
        assert!((60000.0..=150000.0).contains(&value), "got {value}");
        assert_eq!(pipeline.info().n_rows, 2);
        assert_eq!(pipeline.info().target_min, 60000.0);
        assert_eq!(pipeline.info().target_max, 150000.0);
    }

    #[test]
    fn unknown_job_title_follows_policy() {
        let (records, targets) = two_people();
        let astronaut = Record::new(25.0, "Male", "Bachelor's", "Astronaut", 2.0).unwrap();

        let lenient = TrainedPipeline::fit(&PipelineConfig::default(), &records, &targets).unwrap();
        let value = lenient.predict_one(&astronaut).unwrap();
        assert!((60000.0..=150000.0).contains(&value));

        let strict = PipelineConfig {
            unknown_category: UnknownCategoryPolicy::Error,
            ..PipelineConfig::default()
        };
        let strict = TrainedPipeline::fit(&strict, &records, &targets).unwrap();
        assert_eq!(
            strict.predict_one(&astronaut),
            Err(PipelineError::UnknownCategory {
                field: "job_title".into(),
                value: "Astronaut".into(),
            })
        );
    }

    #[test]
    fn fit_validates_inputs() {
        let (records, targets) = two_people();
        let config = PipelineConfig::default();
        assert_eq!(
            TrainedPipeline::fit(&config, &[], &[]),
            Err(PipelineError::EmptyDataset)
        );
        assert_eq!(
            TrainedPipeline::fit(&config, &records, &targets[..1]),
            Err(PipelineError::DimensionMismatch { expected: 2, actual: 1 })
        );
        assert!(matches!(
            TrainedPipeline::fit(&config, &records, &[1.0, f64::NAN]),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn fit_rejects_a_non_finite_record() {
        let mut records = vec![
            Record::new(25.0, "Male", "Bachelor's", "Engineer", 2.0).unwrap(),
            Record::new(40.0, "Female", "PhD", "Scientist", 15.0).unwrap(),
            Record::new(31.0, "Male", "Master's", "Engineer", 6.0).unwrap(),
        ];
        let nan_age = Record {
            age: f64::NAN,
            ..records[0].clone()
        };
        records.push(nan_age);
        let targets = [60000.0, 150000.0, 90000.0, 70000.0];
        let config = PipelineConfig {
            forest: ForestParams::default()
                .with_n_trees(1)
                .with_bootstrap(false)
                .with_max_features(MaxFeatures::All),
            ..PipelineConfig::default()
        };

        assert!(matches!(
            TrainedPipeline::fit(&config, &records, &targets),
            Err(PipelineError::Schema { field, .. }) if field == "age"
        ));
    }

    #[test]
    fn predict_rejects_records_built_around_validation() {
        let (records, targets) = two_people();
        let pipeline = TrainedPipeline::fit(&PipelineConfig::default(), &records, &targets).unwrap();

        let infinite = Record {
            age: f64::INFINITY,
            ..records[0].clone()
        };
        assert!(matches!(
            pipeline.predict_one(&infinite),
            Err(PipelineError::Schema { field, .. }) if field == "age"
        ));

        let blank = Record {
            gender: String::new(),
            ..records[0].clone()
        };
        assert!(matches!(
            pipeline.predict_one(&blank),
            Err(PipelineError::Schema { field, .. }) if field == "gender"
        ));
        assert!(pipeline.predict(&[records[1].clone(), blank]).is_err());
    }

    #[test]
    fn same_seed_gives_identical_predictions() {
        let records: Vec<Record> = (0..30)
            .map(|i| {
                let title = ["Engineer", "Analyst", "Manager"][i % 3];
                let edu = ["Bachelor's", "Master's", "PhD"][i % 3];
                Record::new(22.0 + i as f64, if i % 2 == 0 { "Male" } else { "Female" }, edu, title, i as f64 / 2.0)
                    .unwrap()
            })
            .collect();
        let targets: Vec<f64> = (0..30).map(|i| 40000.0 + 2500.0 * i as f64).collect();
        let config = PipelineConfig {
            forest: ForestParams::default().with_n_trees(25).with_seed(123),
            ..PipelineConfig::default()
        };

        let a = TrainedPipeline::fit(&config, &records[..24], &targets[..24]).unwrap();
        let b = TrainedPipeline::fit(&config, &records[..24], &targets[..24]).unwrap();
        assert_eq!(a.forest(), b.forest());
        assert_eq!(a.predict(&records[24..]).unwrap(), b.predict(&records[24..]).unwrap());
    }
}
