//! edu2job Trainer CLI
//!
//! Offline trainer producing a publishable artifact bundle from a CSV of
//! labeled student profiles.

use anyhow::{Context, Result};
use clap::Parser;
use edu2job_trainer::{fit::TrainConfig, publish_bundle, Dataset};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "edu2job-train")]
#[command(author = "Edu2Job Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Career-prediction model trainer", long_about = None)]
struct Args {
    /// Input CSV dataset path
    #[arg(short, long)]
    input: PathBuf,

    /// Artifact directory the fitted bundle is published into
    #[arg(short, long, default_value = "artifacts")]
    output: PathBuf,

    /// Boosting rounds (one tree per class per round)
    #[arg(long, default_value = "40")]
    rounds: usize,

    /// Maximum tree depth
    #[arg(long, default_value = "4")]
    max_depth: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value = "2")]
    min_samples_leaf: usize,

    /// Learning rate
    #[arg(long, default_value = "0.1")]
    learning_rate: f64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("edu2job trainer v{}", env!("CARGO_PKG_VERSION"));

    info!("Loading dataset from: {}", args.input.display());
    let dataset = Dataset::from_csv(&args.input).context("Failed to load dataset")?;
    info!("Loaded {} usable rows", dataset.len());

    let config = TrainConfig {
        rounds: args.rounds,
        max_depth: args.max_depth,
        min_samples_leaf: args.min_samples_leaf,
        learning_rate: args.learning_rate,
    };
    info!("Training configuration:");
    info!("  Rounds: {}", config.rounds);
    info!("  Max depth: {}", config.max_depth);
    info!("  Min samples per leaf: {}", config.min_samples_leaf);
    info!("  Learning rate: {}", config.learning_rate);

    info!("Starting training...");
    let (bundle, report) = edu2job_trainer::fit::fit(&dataset, &config)?;

    info!("Training complete!");
    info!("  Samples: {}", report.samples);
    info!("  Job roles: {}", report.classes);
    info!("  Features: {}", report.features);
    info!(
        "  Training accuracy: {:.1}%",
        report.training_accuracy * 100.0
    );
    info!("  Fingerprint: {}", bundle.fingerprint());

    let fingerprint =
        publish_bundle(&bundle, &args.output).context("Failed to publish artifacts")?;
    info!(
        "Published bundle {} to {}",
        fingerprint,
        args.output.display()
    );

    Ok(())
}
