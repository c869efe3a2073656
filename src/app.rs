//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - runs training / prediction / evaluation
//! - prints reports

use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command, EvaluateArgs, ModelArgs, PredictArgs, TrainArgs};
use crate::domain::{Field, RawRecord, TrainConfig};
use crate::error::AppError;
use crate::forest::ForestParams;
use crate::inference::Predictor;
use crate::pipeline::TrainedPipeline;

pub mod training;

/// Entry point for the `salary` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; a malformed one is not.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(AppError::new(2, format!("Failed to load .env: {err}")));
        }
    }

    let cli = Cli::parse();
    crate::logging::init(cli.log_format)?;

    match cli.command {
        Command::Train(args) => handle_train(args),
        Command::Predict(args) => handle_predict(args),
        Command::Evaluate(args) => handle_evaluate(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(&args);
    let run = training::run_training(&config)?;
    println!("{}", crate::report::format_training_summary(&run, &config));
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let raw = raw_record_from_args(&args)?;
    let predictor = Predictor::from_path(&args.model.model)?;
    let prediction = predictor.predict(&raw)?;

    let json = serde_json::to_string(&prediction)
        .map_err(|e| AppError::new(4, format!("Failed to encode prediction: {e}")))?;
    println!("{json}");
    Ok(())
}

fn handle_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let pipeline = load_model(&args.model)?;
    let run = training::run_evaluation(&args.data, &pipeline, args.top)?;
    println!("{}", crate::report::format_evaluation(&run, &args.data));
    Ok(())
}

fn handle_inspect(args: ModelArgs) -> Result<(), AppError> {
    let pipeline = load_model(&args)?;
    println!("{}", crate::report::format_inspect(&pipeline, &args.model));
    Ok(())
}

fn load_model(args: &ModelArgs) -> Result<TrainedPipeline, AppError> {
    Ok(TrainedPipeline::load(&args.model)?)
}

pub fn train_config_from_args(args: &TrainArgs) -> TrainConfig {
    let forest = ForestParams::default()
        .with_n_trees(args.trees)
        .with_max_depth(args.max_depth)
        .with_min_samples_split(args.min_samples_split)
        .with_min_samples_leaf(args.min_samples_leaf)
        .with_max_features(args.max_features)
        .with_bootstrap(!args.no_bootstrap)
        .with_seed(args.seed)
        .with_n_jobs(args.jobs);

    TrainConfig {
        data_path: args.data.clone(),
        model_path: args.model.model.clone(),
        test_fraction: args.test_fraction,
        split_seed: args.seed,
        forest,
        unknown_category: args.unknown_category,
    }
}

/// Build the raw payload from either `--json` or the per-field flags.
///
/// Missing fields are left out here; schema resolution reports them.
fn raw_record_from_args(args: &PredictArgs) -> Result<RawRecord, AppError> {
    if let Some(json) = &args.json {
        let raw: RawRecord = serde_json::from_str(json)
            .map_err(|e| AppError::new(2, format!("Invalid --json record: {e}")))?;
        debug!(fields = raw.len(), "record from --json");
        return Ok(raw);
    }

    let mut raw = RawRecord::new();
    if let Some(age) = args.age {
        raw.insert(Field::Age.key(), age);
    }
    if let Some(gender) = &args.gender {
        raw.insert(Field::Gender.key(), gender.as_str());
    }
    if let Some(education) = &args.education_level {
        raw.insert(Field::EducationLevel.key(), education.as_str());
    }
    if let Some(title) = &args.job_title {
        raw.insert(Field::JobTitle.key(), title.as_str());
    }
    if let Some(years) = args.years_of_experience {
        raw.insert(Field::YearsOfExperience.key(), years);
    }
    Ok(raw)
}
