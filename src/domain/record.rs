//! Typed salary records and the raw, unordered form they arrive in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::schema::{Field, FieldKind};
use crate::error::{PipelineError, Result};

/// One employee observation (inputs only; the target travels separately).
///
/// Only constructed through `Record::new`, `Record::from_raw`, or
/// deserialization, all of which validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct Record {
    pub(crate) age: f64,
    pub(crate) gender: String,
    pub(crate) education_level: String,
    pub(crate) job_title: String,
    pub(crate) years_of_experience: f64,
}

/// Unchecked wire shape of a `Record`.
#[derive(Deserialize)]
struct RecordFields {
    age: f64,
    gender: String,
    education_level: String,
    job_title: String,
    years_of_experience: f64,
}

impl TryFrom<RecordFields> for Record {
    type Error = PipelineError;

    fn try_from(f: RecordFields) -> Result<Self> {
        Record::new(f.age, f.gender, f.education_level, f.job_title, f.years_of_experience)
    }
}

/// Borrowed view of a single field's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Numeric(f64),
    Categorical(&'a str),
}

impl Record {
    /// Build a validated record.
    ///
    /// Numeric values must be finite and non-negative; categorical values are
    /// trimmed and must be non-empty.
    pub fn new(
        age: f64,
        gender: impl AsRef<str>,
        education_level: impl AsRef<str>,
        job_title: impl AsRef<str>,
        years_of_experience: f64,
    ) -> Result<Self> {
        Ok(Self {
            age: check_numeric(Field::Age, age)?,
            gender: check_category(Field::Gender, gender.as_ref())?,
            education_level: check_category(Field::EducationLevel, education_level.as_ref())?,
            job_title: check_category(Field::JobTitle, job_title.as_ref())?,
            years_of_experience: check_numeric(Field::YearsOfExperience, years_of_experience)?,
        })
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn education_level(&self) -> &str {
        &self.education_level
    }

    pub fn job_title(&self) -> &str {
        &self.job_title
    }

    pub fn years_of_experience(&self) -> f64 {
        self.years_of_experience
    }

    /// Re-check the value rules of `Record::new`.
    pub fn validate(&self) -> Result<()> {
        for field in Field::ALL {
            match self.value(field) {
                FieldValue::Numeric(v) => {
                    check_numeric(field, v)?;
                }
                FieldValue::Categorical(s) => {
                    if s.trim().is_empty() {
                        return Err(PipelineError::schema(field.key(), "must not be empty"));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Age => FieldValue::Numeric(self.age),
            Field::YearsOfExperience => FieldValue::Numeric(self.years_of_experience),
            Field::Gender => FieldValue::Categorical(&self.gender),
            Field::EducationLevel => FieldValue::Categorical(&self.education_level),
            Field::JobTitle => FieldValue::Categorical(&self.job_title),
        }
    }

    /// Resolve a raw record against the schema.
    ///
    /// Keys may appear in any order and under any accepted name for a field.
    /// Keys that match no field are ignored.
    pub fn from_raw(raw: &RawRecord) -> Result<Self> {
        let mut resolved: HashMap<Field, &RawValue> = HashMap::with_capacity(Field::ALL.len());
        for (name, value) in &raw.0 {
            let Some(field) = Field::from_name(name) else {
                continue;
            };
            if resolved.insert(field, value).is_some() {
                return Err(PipelineError::schema(field.key(), "supplied more than once"));
            }
        }

        let numeric = |field: Field| -> Result<f64> {
            let value = resolved
                .get(&field)
                .ok_or_else(|| PipelineError::schema(field.key(), "missing"))?;
            let v = match value {
                RawValue::Number(v) => *v,
                RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                    PipelineError::schema(field.key(), format!("expected a number, got '{s}'"))
                })?,
            };
            check_numeric(field, v)
        };
        let category = |field: Field| -> Result<String> {
            let value = resolved
                .get(&field)
                .ok_or_else(|| PipelineError::schema(field.key(), "missing"))?;
            match value {
                RawValue::Text(s) => check_category(field, s),
                RawValue::Number(v) => Err(PipelineError::schema(
                    field.key(),
                    format!("expected text, got number {v}"),
                )),
            }
        };

        Ok(Self {
            age: numeric(Field::Age)?,
            gender: category(Field::Gender)?,
            education_level: category(Field::EducationLevel)?,
            job_title: category(Field::JobTitle)?,
            years_of_experience: numeric(Field::YearsOfExperience)?,
        })
    }
}

fn check_numeric(field: Field, value: f64) -> Result<f64> {
    debug_assert_eq!(field.kind(), FieldKind::Numeric);
    if !value.is_finite() {
        return Err(PipelineError::schema(field.key(), "must be finite"));
    }
    if value < 0.0 {
        return Err(PipelineError::schema(field.key(), format!("must be >= 0, got {value}")));
    }
    Ok(value)
}

fn check_category(field: Field, value: &str) -> Result<String> {
    debug_assert_eq!(field.kind(), FieldKind::Categorical);
    let value = value.trim();
    if value.is_empty() {
        return Err(PipelineError::schema(field.key(), "must not be empty"));
    }
    Ok(value.to_string())
}

/// A scalar as it arrives from a payload or form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

/// An unordered name → value map, e.g. a decoded JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub HashMap<String, RawValue>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engineer_pairs() -> Vec<(&'static str, RawValue)> {
        vec![
            ("age", RawValue::Number(25.0)),
            ("gender", RawValue::from("Male")),
            ("education_level", RawValue::from("Bachelor's")),
            ("job_title", RawValue::from("Engineer")),
            ("years_of_experience", RawValue::Number(2.0)),
        ]
    }

    #[test]
    fn from_raw_ignores_key_order() {
        let forward: RawRecord = engineer_pairs().into_iter().collect();
        let reversed: RawRecord = engineer_pairs().into_iter().rev().collect();
        let a = Record::from_raw(&forward).unwrap();
        let b = Record::from_raw(&reversed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Record::new(25.0, "Male", "Bachelor's", "Engineer", 2.0).unwrap());
    }

    #[test]
    fn from_raw_accepts_headers_aliases_and_numeric_text() {
        let raw = RawRecord::new()
            .with("Age", "40")
            .with("Gender", " Female ")
            .with("education", "PhD")
            .with("Job Title", "Scientist")
            .with("experience", "15");
        let record = Record::from_raw(&raw).unwrap();
        assert_eq!(record.age, 40.0);
        assert_eq!(record.gender, "Female");
        assert_eq!(record.education_level, "PhD");
        assert_eq!(record.years_of_experience, 15.0);
    }

    #[test]
    fn from_raw_reports_missing_and_malformed_fields() {
        let mut pairs = engineer_pairs();
        pairs.retain(|(k, _)| *k != "job_title");
        let raw: RawRecord = pairs.into_iter().collect();
        assert_eq!(
            Record::from_raw(&raw),
            Err(PipelineError::schema("job_title", "missing"))
        );

        let raw = RawRecord::new()
            .with("age", "twenty")
            .with("gender", "Male")
            .with("education_level", "PhD")
            .with("job_title", "Engineer")
            .with("years_of_experience", 1.0);
        assert!(matches!(
            Record::from_raw(&raw),
            Err(PipelineError::Schema { field, .. }) if field == "age"
        ));
    }

    #[test]
    fn from_raw_rejects_duplicate_names_for_one_field() {
        let raw: RawRecord = engineer_pairs()
            .into_iter()
            .chain([("education", RawValue::from("PhD"))])
            .collect();
        assert!(matches!(
            Record::from_raw(&raw),
            Err(PipelineError::Schema { field, .. }) if field == "education_level"
        ));
    }

    #[test]
    fn new_validates_values() {
        assert!(Record::new(-1.0, "Male", "PhD", "Engineer", 1.0).is_err());
        assert!(Record::new(30.0, "Male", "PhD", "Engineer", f64::NAN).is_err());
        assert!(Record::new(30.0, "  ", "PhD", "Engineer", 1.0).is_err());
    }

    #[test]
    fn deserializing_a_record_validates_it() {
        let ok: Record = serde_json::from_str(
            r#"{"age":30,"gender":"Male","education_level":"PhD","job_title":"Engineer","years_of_experience":4}"#,
        )
        .unwrap();
        assert_eq!(ok, Record::new(30.0, "Male", "PhD", "Engineer", 4.0).unwrap());

        let negative = r#"{"age":-5,"gender":"Male","education_level":"PhD","job_title":"Engineer","years_of_experience":1}"#;
        assert!(serde_json::from_str::<Record>(negative).is_err());
        let blank = r#"{"age":30,"gender":"","education_level":"PhD","job_title":"Engineer","years_of_experience":1}"#;
        assert!(serde_json::from_str::<Record>(blank).is_err());
    }

    #[test]
    fn validate_catches_values_set_behind_new() {
        let valid = Record::new(30.0, "Male", "PhD", "Engineer", 4.0).unwrap();
        assert_eq!(valid.validate(), Ok(()));

        let nan = Record { age: f64::NAN, ..valid.clone() };
        assert!(matches!(nan.validate(), Err(PipelineError::Schema { field, .. }) if field == "age"));
        let blank = Record { job_title: " ".into(), ..valid };
        assert!(matches!(blank.validate(), Err(PipelineError::Schema { field, .. }) if field == "job_title"));
    }

    #[test]
    fn raw_record_decodes_from_json() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"job_title":"Engineer","age":25,"gender":"Male","education":"Bachelor's","years_of_experience":"2"}"#,
        )
        .unwrap();
        let record = Record::from_raw(&raw).unwrap();
        assert_eq!(record.years_of_experience, 2.0);
        assert_eq!(record.education_level, "Bachelor's");
    }
}
