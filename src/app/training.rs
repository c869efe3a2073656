//! Shared train/evaluate workflow used by the CLI commands.
//!
//! ingest -> seeded split -> fit -> hold-out metrics -> save
//!
//! Commands only deal with presentation (printing).

use std::path::Path;

use tracing::info;

use crate::domain::TrainConfig;
use crate::error::AppError;
use crate::io::ingest::{IngestedData, load_dataset};
use crate::pipeline::{PipelineConfig, TrainedPipeline};
use crate::report::{Rankings, RegressionMetrics, compute_residuals, rank_errors};

/// All computed outputs of a single `salary train` run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub ingest: IngestedData,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Hold-out metrics; `None` when nothing was held out.
    pub metrics: Option<RegressionMetrics>,
    pub pipeline: TrainedPipeline,
}

/// Outputs of `salary evaluate`.
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    pub ingest: IngestedData,
    pub metrics: RegressionMetrics,
    pub rankings: Rankings,
}

/// Fit a pipeline on `config.data_path` and save it to `config.model_path`.
pub fn run_training(config: &TrainConfig) -> Result<TrainingRun, AppError> {
    let ingest = load_dataset(&config.data_path)?;
    let (train, test) = ingest.dataset.split(config.test_fraction, config.split_seed)?;
    info!(
        rows = ingest.rows_used,
        skipped = ingest.row_errors.len(),
        train = train.len(),
        test = test.len(),
        seed = config.split_seed,
        "dataset split"
    );

    let pipeline_config = PipelineConfig {
        forest: config.forest.clone(),
        unknown_category: config.unknown_category,
    };
    let pipeline = TrainedPipeline::fit_dataset(&pipeline_config, &train)?;

    let metrics = if test.is_empty() {
        None
    } else {
        let predicted = pipeline.predict(test.records())?;
        let metrics = RegressionMetrics::compute(test.targets(), &predicted)?;
        info!(
            n = metrics.n,
            r2 = metrics.r2,
            mae = metrics.mae,
            rmse = metrics.rmse,
            "hold-out evaluation"
        );
        Some(metrics)
    };

    pipeline.save(&config.model_path)?;

    Ok(TrainingRun {
        train_rows: train.len(),
        test_rows: test.len(),
        ingest,
        metrics,
        pipeline,
    })
}

/// Score a saved pipeline against every valid row of `data_path`.
pub fn run_evaluation(data_path: &Path, pipeline: &TrainedPipeline, top_n: usize) -> Result<EvaluationRun, AppError> {
    let ingest = load_dataset(data_path)?;
    let records = ingest.dataset.records();
    let actual = ingest.dataset.targets();

    let predicted = pipeline.predict(records)?;
    let metrics = RegressionMetrics::compute(actual, &predicted)?;
    let residuals = compute_residuals(records, actual, &predicted)?;
    let rankings = rank_errors(&residuals, top_n);

    Ok(EvaluationRun {
        ingest,
        metrics,
        rankings,
    })
}
