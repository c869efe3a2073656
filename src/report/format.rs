//! Terminal output for the CLI commands.
//!
//! Kept in one place so the workflow code stays free of presentation and
//! output changes stay localized.

use std::path::Path;

use crate::app::training::{EvaluationRun, TrainingRun};
use crate::domain::{Field, TrainConfig};
use crate::io::ingest::IngestedData;
use crate::pipeline::TrainedPipeline;
use crate::report::{Rankings, RegressionMetrics, Residual};

/// Row errors shown inline before the summary is truncated.
const MAX_ROW_ERRORS_SHOWN: usize = 10;

pub fn format_training_summary(run: &TrainingRun, config: &TrainConfig) -> String {
    let mut out = String::new();

    out.push_str("=== salary - model training ===\n");
    out.push_str(&format!("Data: {}\n", config.data_path.display()));
    out.push_str(&format_ingest(&run.ingest));
    out.push_str(&format!(
        "Split: {} train / {} hold-out (fraction={}, seed={})\n",
        run.train_rows, run.test_rows, config.test_fraction, config.split_seed
    ));

    let params = run.pipeline.forest().params();
    out.push_str("\nForest:\n");
    out.push_str(&format!("- trees: {}\n", params.n_trees));
    out.push_str(&format!(
        "- max depth: {}\n",
        params.max_depth.map_or_else(|| "unlimited".to_string(), |d| d.to_string())
    ));
    out.push_str(&format!(
        "- min samples split/leaf: {}/{}\n",
        params.min_samples_split, params.min_samples_leaf
    ));
    out.push_str(&format!("- max features: {}\n", params.max_features));
    out.push_str(&format!("- seed: {}\n", params.seed));
    out.push_str(&format!("- feature width: {}\n", run.pipeline.transformer().width()));

    out.push('\n');
    match &run.metrics {
        Some(metrics) => out.push_str(&format_metrics("Hold-out metrics", metrics)),
        None => out.push_str("Hold-out metrics: (nothing held out)\n"),
    }

    out.push_str(&format!("\nSaved: {}\n", config.model_path.display()));
    out
}

pub fn format_evaluation(run: &EvaluationRun, data_path: &Path) -> String {
    let mut out = String::new();

    out.push_str("=== salary - model evaluation ===\n");
    out.push_str(&format!("Data: {}\n", data_path.display()));
    out.push_str(&format_ingest(&run.ingest));
    out.push('\n');
    out.push_str(&format_metrics("Metrics", &run.metrics));
    out.push('\n');
    out.push_str(&format_rankings(&run.rankings));
    out
}

/// Artifact metadata plus vocabulary sizes.
pub fn format_inspect(pipeline: &TrainedPipeline, path: &Path) -> String {
    let meta = pipeline.metadata();
    let mut out = String::new();

    out.push_str(&format!("Artifact: {}\n", path.display()));
    out.push_str(&format!("Built by: salary-predictor {}\n", meta.crate_version));
    out.push_str(&format!("Trained at: {}\n", meta.trained_at.to_rfc3339()));
    out.push_str(&format!("Training rows: {}\n", meta.n_rows));
    out.push_str(&format!(
        "Target range: {:.2} .. {:.2}\n",
        pipeline.info().target_min,
        pipeline.info().target_max
    ));
    out.push_str(&format!(
        "Trees: {} (max features: {}, seed: {})\n",
        pipeline.forest().n_trees(),
        meta.forest.max_features,
        meta.forest.seed
    ));
    out.push_str(&format!("Unknown categories: {:?}\n", pipeline.transformer().policy()));
    out.push_str(&format!("Feature width: {}\n", meta.feature_names.len()));

    out.push_str("\nVocabularies:\n");
    for field in Field::CATEGORICAL {
        let size = pipeline.transformer().vocabulary(field).map_or(0, |v| v.len());
        out.push_str(&format!("- {:<20} {size}\n", field.key()));
    }
    out
}

fn format_ingest(ingest: &IngestedData) -> String {
    let mut out = format!(
        "Rows: {} read, {} used, {} skipped\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    );
    for err in ingest.row_errors.iter().take(MAX_ROW_ERRORS_SHOWN) {
        out.push_str(&format!("  skipped {err}\n"));
    }
    if ingest.row_errors.len() > MAX_ROW_ERRORS_SHOWN {
        out.push_str(&format!(
            "  ... and {} more\n",
            ingest.row_errors.len() - MAX_ROW_ERRORS_SHOWN
        ));
    }
    out
}

fn format_metrics(title: &str, metrics: &RegressionMetrics) -> String {
    let r2 = metrics.r2.map_or_else(|| "n/a".to_string(), |r2| format!("{r2:.4}"));
    format!(
        "{title} (n={}):\n- R2  : {r2}\n- MAE : {:.2}\n- RMSE: {:.2}\n",
        metrics.n, metrics.mae, metrics.rmse
    )
}

/// Format the largest misses on each side.
pub fn format_rankings(rankings: &Rankings) -> String {
    let mut out = String::new();

    out.push_str("Most under-predicted:\n");
    out.push_str(&format_table(&rankings.under));
    out.push('\n');

    out.push_str("Most over-predicted:\n");
    out.push_str(&format_table(&rankings.over));

    out
}

fn format_table(rows: &[Residual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<28} {:<12} {:>5} {:>12} {:>12} {:>12}",
            "job title", "education", "yoe", "actual", "predicted", "residual"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<28} {:-<12} {:->5} {:->12} {:->12} {:->12}\n",
        "", "", "", "", "", ""
    ));

    for r in rows {
        out.push_str(
            format!(
                "{:<28} {:<12} {:>5.1} {:>12.2} {:>12.2} {:>12.2}",
                truncate(r.record.job_title(), 28),
                truncate(r.record.education_level(), 12),
                r.record.years_of_experience(),
                r.actual,
                r.predicted,
                r.residual,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::report::{compute_residuals, rank_errors};

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("Engineer", 10), "Engineer");
        assert_eq!(truncate("Senior Software Engineer", 10), "Senior So.");
    }

    #[test]
    fn metrics_block_handles_undefined_r2() {
        let metrics = RegressionMetrics {
            n: 3,
            r2: None,
            mae: 1.5,
            rmse: 2.0,
        };
        let text = format_metrics("Metrics", &metrics);
        assert!(text.contains("R2  : n/a"));
        assert!(text.contains("MAE : 1.50"));
    }

    #[test]
    fn rankings_table_lists_rows() {
        let records = vec![
            Record::new(30.0, "Male", "PhD", "Engineer", 5.0).unwrap(),
            Record::new(45.0, "Female", "Master's", "Director", 20.0).unwrap(),
        ];
        let residuals = compute_residuals(&records, &[100.0, 200.0], &[90.0, 250.0]).unwrap();
        let text = format_rankings(&rank_errors(&residuals, 5));
        let under = text.find("Engineer").unwrap();
        let over = text.find("Director").unwrap();
        assert!(text.find("Most over-predicted").unwrap() > under);
        assert!(over > under);
    }
}
