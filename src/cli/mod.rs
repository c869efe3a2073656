//! Command-line parsing for the salary predictor.
//!
//! Argument parsing and command dispatch stay separate from the
//! encoding/regression code. Defaults that operators commonly pin (model path,
//! seed, tree count) can also come from the environment or a `.env` file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::UnknownCategoryPolicy;
use crate::forest::MaxFeatures;
use crate::logging::LogFormat;

pub const DEFAULT_MODEL_PATH: &str = "salary_model.bin";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "salary", version, about = "Salary prediction from demographic and job attributes")]
pub struct Cli {
    /// Log output format (logs go to stderr; verbosity via RUST_LOG).
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the encoder and forest on a CSV, report hold-out metrics, and save the artifact.
    Train(TrainArgs),
    /// Predict the salary for one record and print `{"prediction": ...}`.
    Predict(PredictArgs),
    /// Score a saved model against a labeled CSV.
    Evaluate(EvaluateArgs),
    /// Print metadata of a saved model.
    Inspect(ModelArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Path of the model artifact.
    #[arg(short = 'm', long, env = "SALARY_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Training CSV (Age, Gender, Education Level, Job Title, Years of Experience, Salary).
    #[arg(short = 'd', long)]
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Number of trees in the forest.
    #[arg(short = 'n', long, env = "SALARY_TREES", default_value_t = 100)]
    pub trees: usize,

    /// Seed for the train/test split and the forest.
    #[arg(long, env = "SALARY_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows held out for evaluation, in [0, 1).
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Maximum tree depth (unlimited when omitted).
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Minimum rows a node needs before it may split.
    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    /// Minimum rows on each side of a split.
    #[arg(long, default_value_t = 1)]
    pub min_samples_leaf: usize,

    /// Columns considered per split: all, sqrt, third, a count, or a fraction in (0, 1].
    #[arg(long, default_value_t = MaxFeatures::Third)]
    pub max_features: MaxFeatures,

    /// Grow every tree on the full training set instead of a bootstrap resample.
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Worker threads for tree growing (rayon default when omitted).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// What to do with categories unseen during training.
    #[arg(long, value_enum, default_value_t = UnknownCategoryPolicy::Ignore)]
    pub unknown_category: UnknownCategoryPolicy,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// The whole record as a JSON object, e.g. '{"age": 30, "gender": "Male", ...}'.
    #[arg(
        long,
        conflicts_with_all = ["age", "gender", "education_level", "job_title", "years_of_experience"]
    )]
    pub json: Option<String>,

    #[arg(long)]
    pub age: Option<f64>,

    #[arg(long)]
    pub gender: Option<String>,

    #[arg(long)]
    pub education_level: Option<String>,

    #[arg(long)]
    pub job_title: Option<String>,

    #[arg(long)]
    pub years_of_experience: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    /// Labeled CSV in the training layout.
    #[arg(short = 'd', long)]
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Show the top-N under- and over-predicted rows.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn train_defaults() {
        let cli = Cli::try_parse_from(["salary", "train", "--data", "salaries.csv"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.test_fraction, 0.2);
        assert_eq!(args.min_samples_split, 2);
        assert_eq!(args.max_features, MaxFeatures::Third);
        assert_eq!(args.unknown_category, UnknownCategoryPolicy::Ignore);
        assert!(!args.no_bootstrap);
    }

    #[test]
    fn train_parses_forest_flags() {
        let cli = Cli::try_parse_from([
            "salary",
            "--log-format",
            "json",
            "train",
            "-d",
            "s.csv",
            "--trees",
            "10",
            "--max-features",
            "sqrt",
            "--max-depth",
            "6",
            "--unknown-category",
            "error",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.trees, 10);
        assert_eq!(args.max_features, MaxFeatures::Sqrt);
        assert_eq!(args.max_depth, Some(6));
        assert_eq!(args.unknown_category, UnknownCategoryPolicy::Error);
    }

    #[test]
    fn predict_json_conflicts_with_field_flags() {
        assert!(Cli::try_parse_from(["salary", "predict", "--json", "{}", "--age", "30"]).is_err());

        let cli = Cli::try_parse_from([
            "salary",
            "predict",
            "--age",
            "30",
            "--gender",
            "Female",
            "--education-level",
            "PhD",
            "--job-title",
            "Data Scientist",
            "--years-of-experience",
            "6",
        ])
        .unwrap();
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.job_title.as_deref(), Some("Data Scientist"));
        assert_eq!(args.years_of_experience, Some(6.0));
    }

    #[test]
    fn bad_max_features_is_rejected() {
        assert!(Cli::try_parse_from(["salary", "train", "-d", "s.csv", "--max-features", "1.5"]).is_err());
    }
}
