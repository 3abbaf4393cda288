//! Fraud Detection - Training CLI
//!
//! `fraud-train train|experiments|optimize|info`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use fraud_core::logic::config::DEFAULT_CONFIG_PATH;
use fraud_core::logic::data::{dataset_info, load_raw_data, split_features_target};
use fraud_core::logic::optimize::{run_optimization, SearchSpace, StudyConfig};
use fraud_core::logic::pipeline::{prepare, run_experiments, run_training, TrainingSettings};
use fraud_core::{ExperimentTracker, JsonlTracker, NoopTracker, ProjectConfig};

#[derive(Parser, Debug)]
#[command(name = "fraud-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train, compare and tune the fraud detection model", long_about = None)]
struct Cli {
    /// Project config (TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the dataset path from the config
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Disable experiment tracking
    #[arg(long, global = true)]
    no_track: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the training pipeline with one preset
    Train(TrainArgs),
    /// Train baseline, variation_1 and variation_2 and compare them
    Experiments,
    /// Random search over hyperparameters with cross-validated F1
    Optimize(OptimizeArgs),
    /// Print dataset statistics
    Info,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Hyperparameter preset from `[models.<name>]`
    #[arg(long, default_value = "baseline")]
    preset: String,

    /// Minimum test F1 for saving the model
    #[arg(long)]
    threshold: Option<f64>,
}

#[derive(Args, Debug)]
struct OptimizeArgs {
    #[arg(long, default_value_t = fraud_core::constants::DEFAULT_N_TRIALS)]
    n_trials: usize,

    #[arg(long, default_value_t = fraud_core::constants::DEFAULT_CV_FOLDS)]
    cv_folds: usize,

    /// Seed for candidate sampling
    #[arg(long, default_value_t = fraud_core::constants::DEFAULT_RANDOM_STATE)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ProjectConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    if let Some(data) = &cli.data {
        config.data.raw_path = data.clone();
    }

    log::info!("fraud-train v{}", fraud_core::constants::CORE_VERSION);

    match &cli.command {
        Commands::Info => run_info(&config),
        Commands::Train(args) => {
            let tracker = open_tracker(&config, cli.no_track)?;
            run_train(&config, args, tracker.as_ref())
        }
        Commands::Experiments => {
            let tracker = open_tracker(&config, cli.no_track)?;
            run_compare(&config, tracker.as_ref())
        }
        Commands::Optimize(args) => {
            let tracker = open_tracker(&config, cli.no_track)?;
            run_optimize(&config, args, tracker.as_ref())
        }
    }
}

fn open_tracker(config: &ProjectConfig, disabled: bool) -> Result<Box<dyn ExperimentTracker>> {
    if disabled {
        return Ok(Box::new(NoopTracker));
    }
    let tracker = JsonlTracker::open(&config.tracking.dir, &config.tracking.experiment)
        .context("failed to open experiment tracker")?;
    Ok(Box::new(tracker))
}

fn run_train(config: &ProjectConfig, args: &TrainArgs, tracker: &dyn ExperimentTracker) -> Result<()> {
    let mut settings = TrainingSettings::from_config(config, &args.preset)?;
    if let Some(threshold) = args.threshold {
        settings.save_threshold = threshold;
    }

    let report = run_training(&settings, tracker, &args.preset).context("training failed")?;

    println!("{}", "=".repeat(60));
    println!("MODEL EVALUATION ({})", args.preset);
    println!("{}", "=".repeat(60));
    for (name, value) in report.metrics.to_map() {
        println!("{:<12} {:.4}", name, value);
    }
    println!("\nTop features:");
    for (name, value) in report.feature_importance.iter().take(10) {
        println!("  {:<8} {:.4}", name, value);
    }
    println!("\n{}", report.outcome);
    Ok(())
}

fn run_compare(config: &ProjectConfig, tracker: &dyn ExperimentTracker) -> Result<()> {
    let summary = run_experiments(config, tracker).context("experiments failed")?;

    println!("{}", "=".repeat(60));
    println!("EXPERIMENT SUMMARY");
    println!("{}", "=".repeat(60));
    for r in &summary.results {
        println!("{:<12} F1 {:.4}  {}", r.preset, r.metrics.f1_score, r.outcome);
    }
    println!("\nBest model: {}", summary.best);
    Ok(())
}

fn run_optimize(config: &ProjectConfig, args: &OptimizeArgs, tracker: &dyn ExperimentTracker) -> Result<()> {
    let settings = TrainingSettings::from_config(config, "baseline")?;

    let raw = load_raw_data(&settings.data_path)?;
    let (x, y) = split_features_target(&raw, &settings.target_column, &config.drop_columns())?;
    let prepared = prepare(&x, &y, &settings)?;

    let study = StudyConfig::default()
        .with_n_trials(args.n_trials)
        .with_cv_folds(args.cv_folds)
        .with_seed(args.seed);
    let result = run_optimization(&prepared, SearchSpace::default(), study, &settings, tracker)
        .context("optimization failed")?;

    println!("{}", "=".repeat(60));
    println!("OPTIMIZATION RESULTS");
    println!("{}", "=".repeat(60));
    println!("Trials: {}", result.trials.len());
    println!("Best CV F1: {:.4}", result.best_cv_f1);
    println!("Best params: {}", serde_json::to_string(&result.best_params)?);
    println!("Test F1: {:.4}", result.test_metrics.f1_score);
    println!("{}", result.outcome);
    Ok(())
}

fn run_info(config: &ProjectConfig) -> Result<()> {
    let raw = load_raw_data(&config.data.raw_path)
        .with_context(|| format!("failed to read {}", config.data.raw_path.display()))?;
    let info = dataset_info(&raw, &config.data.target_column);
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
