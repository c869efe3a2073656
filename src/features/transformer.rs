//! Stateful record → feature vector encoder.
//!
//! Column layout, fixed at fit time:
//!
//! ```text
//! [ age, years_of_experience | gender one-hot | education_level one-hot | job_title one-hot ]
//! ```
//!
//! Numeric fields pass through unchanged. Each categorical field gets a block
//! as wide as its vocabulary. The layout is derived from `Field::NUMERIC` and
//! `Field::CATEGORICAL`, never from the order a caller supplied values in.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{Field, FieldValue, Record, UnknownCategoryPolicy};
use crate::error::{PipelineError, Result};
use crate::features::{FeatureVector, Vocabulary};

/// One-hot block for a single categorical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalBlock {
    pub field: Field,
    pub vocabulary: Vocabulary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    policy: UnknownCategoryPolicy,
    /// `None` until `fit` has run.
    blocks: Option<Vec<CategoricalBlock>>,
}

impl FeatureTransformer {
    pub fn new(policy: UnknownCategoryPolicy) -> Self {
        Self { policy, blocks: None }
    }

    pub fn policy(&self) -> UnknownCategoryPolicy {
        self.policy
    }

    pub fn is_fitted(&self) -> bool {
        self.blocks.is_some()
    }

    /// Learn one vocabulary per categorical field from `records`.
    ///
    /// Refitting replaces any previously learned vocabularies.
    pub fn fit(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        for record in records {
            record.validate()?;
        }

        let blocks = Field::CATEGORICAL
            .into_iter()
            .map(|field| {
                let mut vocabulary = Vocabulary::new();
                for record in records {
                    if let FieldValue::Categorical(value) = record.value(field) {
                        vocabulary.observe(value);
                    }
                }
                CategoricalBlock { field, vocabulary }
            })
            .collect();

        self.blocks = Some(blocks);
        Ok(())
    }

    /// Encode one record. Pure in (fitted state, record).
    pub fn transform(&self, record: &Record) -> Result<FeatureVector> {
        let blocks = self.blocks.as_ref().ok_or(PipelineError::NotFitted)?;
        record.validate()?;

        let mut out = Vec::with_capacity(self.width());
        for field in Field::NUMERIC {
            if let FieldValue::Numeric(v) = record.value(field) {
                out.push(v);
            }
        }

        for block in blocks {
            let offset = out.len();
            out.resize(offset + block.vocabulary.len(), 0.0);

            let FieldValue::Categorical(value) = record.value(block.field) else {
                continue;
            };
            match block.vocabulary.index_of(value) {
                Some(idx) => out[offset + idx] = 1.0,
                None => match self.policy {
                    UnknownCategoryPolicy::Ignore => {
                        trace!(field = %block.field, value, "unknown category encoded as zeros");
                    }
                    UnknownCategoryPolicy::Error => {
                        return Err(PipelineError::UnknownCategory {
                            field: block.field.key().to_string(),
                            value: value.to_string(),
                        });
                    }
                },
            }
        }

        Ok(out)
    }

    pub fn transform_batch(&self, records: &[Record]) -> Result<Vec<FeatureVector>> {
        records.iter().map(|r| self.transform(r)).collect()
    }

    /// Total encoded width (0 before fit).
    pub fn width(&self) -> usize {
        let categorical: usize = self
            .blocks
            .iter()
            .flatten()
            .map(|b| b.vocabulary.len())
            .sum();
        match self.blocks {
            Some(_) => Field::NUMERIC.len() + categorical,
            None => 0,
        }
    }

    /// Column names in encoded order, e.g. `gender=Female`.
    pub fn feature_names(&self) -> Vec<String> {
        let Some(blocks) = &self.blocks else {
            return Vec::new();
        };
        let mut names: Vec<String> = Field::NUMERIC.iter().map(|f| f.key().to_string()).collect();
        for block in blocks {
            names.extend(
                block
                    .vocabulary
                    .values()
                    .iter()
                    .map(|value| format!("{}={value}", block.field.key())),
            );
        }
        names
    }

    pub fn vocabulary(&self, field: Field) -> Option<&Vocabulary> {
        self.blocks
            .as_ref()?
            .iter()
            .find(|b| b.field == field)
            .map(|b| &b.vocabulary)
    }

    pub fn blocks(&self) -> &[CategoricalBlock] {
        self.blocks.as_deref().unwrap_or(&[])
    }
}
