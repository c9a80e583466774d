//! Herb classification CLI - operator tooling
//!
//! One-off predictions, model/label drift diagnostics, and database
//! seeding for the herb classification service.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use ndarray::Array4;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use herb_classification::{ClassifierConfig, HerbClassifier, LabelTable};
use herb_storage::{HerbStore, PostgresConfig, PostgresHerbStore};

#[derive(Parser)]
#[command(
    name = "herb-classify",
    version,
    about = "Herb image classification service tooling",
    after_help = "EXAMPLES:\n  \
                  # Classify a single image\n  \
                  herb-classify predict leaf.jpg\n\n  \
                  # Classify against a specific artifact\n  \
                  herb-classify predict --model models/herb_classifier.onnx leaf.jpg\n\n  \
                  # Check the artifact's class count against the label table\n  \
                  herb-classify diagnose\n\n  \
                  # Seed the PostgreSQL knowledge base (idempotent)\n  \
                  herb-classify seed"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single image and print the prediction as JSON
    Predict {
        /// Path to the image file
        image: PathBuf,

        /// Override the model artifact path
        #[arg(long)]
        model: Option<PathBuf>,

        /// Comma-separated label override (defaults to the configured table)
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,
    },

    /// Probe the artifact and report class-count drift against the label table
    Diagnose {
        /// Override the model artifact path
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Seed the PostgreSQL herb knowledge base (no-op when already seeded)
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Predict { image, model, labels } => predict(image, model, labels),
        Commands::Diagnose { model } => diagnose(model),
        Commands::Seed => seed().await,
    }
}

fn build_config(model: Option<PathBuf>, labels: Option<Vec<String>>) -> ClassifierConfig {
    let mut config = ClassifierConfig::default();
    if let Some(model) = model {
        config.model_path = model;
    }
    if let Some(labels) = labels {
        config.labels = LabelTable::new(labels);
    }
    config
}

fn predict(image: PathBuf, model: Option<PathBuf>, labels: Option<Vec<String>>) -> Result<()> {
    let classifier = HerbClassifier::new(build_config(model, labels))
        .context("Failed to load the model artifact")?;

    let prediction = classifier
        .predict(&image)
        .with_context(|| format!("Prediction failed for {}", image.display()))?;

    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

/// Probe the artifact with a zero tensor and compare its output width with
/// the configured label table: the drift that produces `Unknown (Class N)`
/// labels in production.
fn diagnose(model: Option<PathBuf>) -> Result<()> {
    let config = build_config(model, None);
    let model_path = config.model_path.clone();

    let classifier = HerbClassifier::new(config).context("Failed to load the model artifact")?;

    let profile = classifier.profile();
    let probe = Array4::<f32>::zeros((
        1,
        profile.input_height as usize,
        profile.input_width as usize,
        3,
    ));
    let scores = classifier
        .infer(&probe)
        .context("Probe inference failed; the artifact may not match the configured input shape")?;

    let class_count = scores.len();
    let label_count = classifier.labels().len();

    let report = serde_json::json!({
        "model": model_path.display().to_string(),
        "input_shape": profile.input_shape(),
        "model_classes": class_count,
        "configured_labels": label_count,
        "in_sync": class_count == label_count,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if class_count > label_count {
        println!(
            "WARNING: indices {}..{} have no configured label and will resolve to Unknown (Class N)",
            label_count,
            class_count - 1
        );
    } else if class_count < label_count {
        println!(
            "WARNING: labels {}..{} can never be predicted by this artifact",
            class_count,
            label_count - 1
        );
    }

    Ok(())
}

async fn seed() -> Result<()> {
    let store = PostgresHerbStore::new(PostgresConfig::default())
        .await
        .context("Failed to connect to PostgreSQL")?;

    let report = store.seed().await.context("Seeding failed")?;
    if report.herbs == 0 {
        println!("Knowledge base already seeded, nothing to do");
    } else {
        println!("Seeded {} herbs and {} symptom rules", report.herbs, report.rules);
    }
    Ok(())
}
