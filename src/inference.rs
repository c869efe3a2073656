//! Single-record inference entry point.
//!
//! A `Predictor` is handed an already-loaded pipeline by whoever starts the
//! process (CLI, HTTP layer, UI) and can be cloned freely across threads.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{RawRecord, Record};
use crate::error::Result;
use crate::pipeline::TrainedPipeline;

/// Response shape returned to serving layers: `{"prediction": 123456.7}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub salary: f64,
}

#[derive(Debug, Clone)]
pub struct Predictor {
    pipeline: Arc<TrainedPipeline>,
}

impl Predictor {
    pub fn new(pipeline: Arc<TrainedPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Arc::new(TrainedPipeline::load(path)?)))
    }

    pub fn pipeline(&self) -> &TrainedPipeline {
        &self.pipeline
    }

    /// Validate a raw payload against the schema and predict.
    pub fn predict(&self, raw: &RawRecord) -> Result<Prediction> {
        let record = Record::from_raw(raw)?;
        self.predict_record(&record)
    }

    pub fn predict_record(&self, record: &Record) -> Result<Prediction> {
        Ok(Prediction {
            salary: self.pipeline.predict_one(record)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::forest::ForestParams;
    use crate::pipeline::PipelineConfig;

    fn predictor() -> Predictor {
        let records = vec![
            Record::new(25.0, "Male", "Bachelor's", "Engineer", 2.0).unwrap(),
            Record::new(40.0, "Female", "PhD", "Scientist", 15.0).unwrap(),
            Record::new(33.0, "Female", "Master's", "Analyst", 8.0).unwrap(),
        ];
        let config = PipelineConfig {
            forest: ForestParams::default().with_n_trees(16),
            ..PipelineConfig::default()
        };
        let pipeline = TrainedPipeline::fit(&config, &records, &[60000.0, 150000.0, 90000.0]).unwrap();
        Predictor::new(Arc::new(pipeline))
    }

    #[test]
    fn raw_payload_order_does_not_matter() {
        let predictor = predictor();
        let a = RawRecord::new()
            .with("age", 25.0)
            .with("gender", "Male")
            .with("education_level", "Bachelor's")
            .with("job_title", "Engineer")
            .with("years_of_experience", 2.0);
        let b = RawRecord::new()
            .with("years_of_experience", 2.0)
            .with("job_title", "Engineer")
            .with("education", "Bachelor's")
            .with("Gender", "Male")
            .with("Age", "25");
        assert_eq!(predictor.predict(&a).unwrap(), predictor.predict(&b).unwrap());
    }

    #[test]
    fn missing_field_is_a_schema_error() {
        let raw = RawRecord::new().with("age", 25.0).with("gender", "Male");
        assert!(matches!(
            predictor().predict(&raw),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn prediction_serializes_like_the_serving_response() {
        let json = serde_json::to_string(&Prediction { salary: 61000.5 }).unwrap();
        assert_eq!(json, r#"{"prediction":61000.5}"#);
    }

    #[test]
    fn concurrent_callers_share_one_pipeline() {
        let predictor = predictor();
        let record = Record::new(30.0, "Male", "Master's", "Engineer", 5.0).unwrap();
        let expected = predictor.predict_record(&record).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let predictor = predictor.clone();
                let record = record.clone();
                std::thread::spawn(move || predictor.predict_record(&record).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
