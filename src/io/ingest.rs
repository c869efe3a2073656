//! CSV ingest for the salary dataset.
//!
//! Turns a CSV with the schema's columns plus `Salary` into a clean
//! `Dataset`.
//!
//! - Missing required columns fail up front (schema error, exit code 2)
//! - Bad rows are skipped and reported, never silently coerced
//! - No fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{Dataset, Field, RawRecord, RawValue, Record, TARGET_COLUMN, TARGET_KEY, is_target};
use crate::error::{AppError, PipelineError, Result};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Ingest output: valid rows + what was dropped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone)]
struct HeaderMap {
    /// Column index per field, in schema order.
    fields: Vec<(Field, usize)>,
    target: usize,
}

/// Open `path` and ingest it.
pub fn load_dataset(path: &Path) -> std::result::Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_dataset(file)?;
    debug!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_used = data.rows_used,
        "dataset loaded"
    );
    Ok(data)
}

/// Ingest CSV from any reader.
pub fn read_dataset<R: Read>(reader: R) -> Result<IngestedData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::schema("header", format!("failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers)?;

    let mut records = Vec::new();
    let mut targets = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|row| parse_row(&row, &header_map));
        match parsed {
            Ok((record, target)) => {
                records.push(record);
                targets.push(target);
            }
            Err(message) => {
                warn!(line, %message, "skipping row");
                row_errors.push(RowError { line, message });
            }
        }
    }

    let rows_used = records.len();
    if rows_used == 0 {
        return Err(PipelineError::EmptyDataset);
    }
    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), rows_read, "some rows were skipped");
    }

    Ok(IngestedData {
        dataset: Dataset::new(records, targets)?,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> Result<HeaderMap> {
    let mut found = HashMap::with_capacity(Field::ALL.len());
    let mut target = None;

    for (idx, name) in headers.iter().enumerate() {
        if is_target(name) {
            if target.replace(idx).is_some() {
                return Err(PipelineError::schema(TARGET_KEY, "column appears more than once"));
            }
        } else if let Some(field) = Field::from_name(name) {
            if found.insert(field, idx).is_some() {
                return Err(PipelineError::schema(field.key(), "column appears more than once"));
            }
        }
    }

    if let Some(missing) = Field::ALL.into_iter().find(|f| !found.contains_key(f)) {
        return Err(PipelineError::schema(
            missing.key(),
            format!("missing required column `{}`", missing.column()),
        ));
    }
    let target = target.ok_or_else(|| {
        PipelineError::schema(TARGET_KEY, format!("missing required column `{TARGET_COLUMN}`"))
    })?;

    let fields = Field::ALL
        .into_iter()
        .filter_map(|field| found.get(&field).map(|&idx| (field, idx)))
        .collect();
    Ok(HeaderMap { fields, target })
}

fn parse_row(row: &StringRecord, header_map: &HeaderMap) -> std::result::Result<(Record, f64), String> {
    let mut raw = RawRecord::new();
    for &(field, idx) in &header_map.fields {
        let value = get_required(row, idx, field.column())?;
        raw.insert(field.key(), RawValue::Text(value.to_string()));
    }
    let record = Record::from_raw(&raw).map_err(|e| e.to_string())?;

    let salary = get_required(row, header_map.target, TARGET_COLUMN)?;
    let target = salary
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| format!("Invalid `{TARGET_COLUMN}` value '{salary}': expected a positive number"))?;

    Ok((record, target))
}

fn get_required<'a>(row: &'a StringRecord, idx: usize, name: &str) -> std::result::Result<&'a str, String> {
    row.get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}
