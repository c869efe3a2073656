//! The single schema shared by dataset ingest, fitting, and inference.
//!
//! Every place that needs to know a field's name, its dataset column header, or
//! whether it is numeric or categorical asks `Field`. Nothing else in the crate
//! spells out field names.

use serde::{Deserialize, Serialize};

/// Dataset column holding the regression target.
pub const TARGET_COLUMN: &str = "Salary";

/// Canonical key for the target (used in name matching).
pub const TARGET_KEY: &str = "salary";

/// Semantic type of an input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Passed through unchanged.
    Numeric,
    /// One-hot encoded against a fitted vocabulary.
    Categorical,
}

/// An input field of a salary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Gender,
    EducationLevel,
    JobTitle,
    YearsOfExperience,
}

impl Field {
    /// All input fields, in dataset column order.
    pub const ALL: [Field; 5] = [
        Field::Age,
        Field::Gender,
        Field::EducationLevel,
        Field::JobTitle,
        Field::YearsOfExperience,
    ];

    /// Numeric fields, in feature column order.
    pub const NUMERIC: [Field; 2] = [Field::Age, Field::YearsOfExperience];

    /// Categorical fields, in feature block order.
    pub const CATEGORICAL: [Field; 3] = [Field::Gender, Field::EducationLevel, Field::JobTitle];

    /// Canonical snake_case key (inference payloads, feature names).
    pub fn key(self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Gender => "gender",
            Field::EducationLevel => "education_level",
            Field::JobTitle => "job_title",
            Field::YearsOfExperience => "years_of_experience",
        }
    }

    /// Header used by the training dataset.
    pub fn column(self) -> &'static str {
        match self {
            Field::Age => "Age",
            Field::Gender => "Gender",
            Field::EducationLevel => "Education Level",
            Field::JobTitle => "Job Title",
            Field::YearsOfExperience => "Years of Experience",
        }
    }

    /// Short names accepted from form-style payloads.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::EducationLevel => &["education"],
            Field::YearsOfExperience => &["experience"],
            Field::Age | Field::Gender | Field::JobTitle => &[],
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Age | Field::YearsOfExperience => FieldKind::Numeric,
            Field::Gender | Field::EducationLevel | Field::JobTitle => FieldKind::Categorical,
        }
    }

    /// Whether `name` refers to this field (key, column header, or alias).
    pub fn matches(self, name: &str) -> bool {
        let name = normalize_name(name);
        name == self.key()
            || name == normalize_name(self.column())
            || self.aliases().iter().any(|alias| name == *alias)
    }

    /// Resolve an arbitrary header/key to a field.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.matches(name))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Whether `name` refers to the target column.
pub fn is_target(name: &str) -> bool {
    normalize_name(name) == TARGET_KEY
}

/// Normalize a field name for matching.
///
/// Case-insensitive; spaces, dashes, and underscores are equivalent. A leading
/// UTF-8 BOM (common in spreadsheet exports) is dropped.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_and_keys_resolve_to_fields() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.key()), Some(field));
            assert_eq!(Field::from_name(field.column()), Some(field));
        }
        assert_eq!(Field::from_name("\u{feff}AGE "), Some(Field::Age));
        assert_eq!(Field::from_name("education"), Some(Field::EducationLevel));
        assert_eq!(Field::from_name("experience"), Some(Field::YearsOfExperience));
        assert_eq!(Field::from_name("job-title"), Some(Field::JobTitle));
        assert_eq!(Field::from_name("salary"), None);
    }

    #[test]
    fn numeric_and_categorical_partition_all_fields() {
        for field in Field::ALL {
            let numeric = Field::NUMERIC.contains(&field);
            let categorical = Field::CATEGORICAL.contains(&field);
            assert!(numeric ^ categorical);
            assert_eq!(numeric, field.kind() == FieldKind::Numeric);
        }
    }

    #[test]
    fn target_matching() {
        assert!(is_target("Salary"));
        assert!(is_target(" salary"));
        assert!(!is_target("Age"));
    }
}
