//! vocaltone: speech emotion and satisfaction analysis

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use vocaltone_cli::{
    analyze_batch, run_training, AppConfig, EmotionPipeline, EmotionReport, TrainingJob,
};
use vocaltone_model::{Emotion, SatisfactionTable};
use vocaltone_train::TrainerConfig;

#[derive(Parser, Debug)]
#[command(
    name = "vocaltone",
    version,
    about = "Classify the emotion in a speech recording and score satisfaction"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one recording
    Predict {
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Include acoustic descriptors
        #[arg(long)]
        descriptors: bool,
    },
    /// Analyze several recordings concurrently (JSON output)
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        descriptors: bool,
    },
    /// Train a model on a SAVEE-layout corpus
    Train {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List supported emotions and their base satisfaction
    Emotions,
    /// Show the active configuration
    Config,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Predict {
            file,
            json,
            descriptors,
        } => predict(&config, file, json, descriptors || config.include_descriptors).await,
        Commands::Batch { files, descriptors } => {
            batch(&config, files, descriptors || config.include_descriptors).await
        }
        Commands::Train {
            data_dir,
            output,
            epochs,
            seed,
        } => train(&config, data_dir, output, epochs, seed).await,
        Commands::Emotions => {
            list_emotions();
            Ok(())
        }
        Commands::Config => show_config(&config),
    }
}

async fn predict(config: &AppConfig, file: PathBuf, json: bool, descriptors: bool) -> Result<()> {
    let pipeline = EmotionPipeline::from_config(config)?;
    let report = tokio::task::spawn_blocking(move || pipeline.analyze_file(&file, descriptors))
        .await
        .context("Analysis task failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &EmotionReport) {
    println!("Emotion:       {}", report.emotion);
    println!("Confidence:    {:.2}%", report.confidence * 100.0);
    println!("Satisfaction:  {:.2} / 10", report.satisfaction_score);
    println!();
    let mut ranked: Vec<_> = report.probabilities.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1));
    for (name, p) in ranked {
        println!("  {:<10} {:>6.2}%", name, p * 100.0);
    }
    if let Some(d) = &report.descriptors {
        println!();
        println!("  zcr {:.4}, centroid {:.1} Hz, rolloff {:.1} Hz, chroma {:.3}, rms {:.4}",
                 d.zcr, d.spectral_centroid, d.spectral_rolloff, d.chroma, d.rms);
    }
}

async fn batch(config: &AppConfig, files: Vec<PathBuf>, descriptors: bool) -> Result<()> {
    let pipeline = Arc::new(EmotionPipeline::from_config(config)?);
    let report = analyze_batch(pipeline, files, config.max_batch_size, descriptors).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn train(
    config: &AppConfig,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    epochs: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let section = &config.training;
    let job = TrainingJob {
        data_dir: data_dir.unwrap_or_else(|| section.data_dir.clone()),
        output_dir: output.unwrap_or_else(|| section.output_dir.clone()),
        trainer: TrainerConfig::default()
            .epochs(epochs.unwrap_or(section.epochs))
            .batch_size(section.batch_size)
            .seed(seed.unwrap_or(section.seed)),
    };

    let stop = Arc::new(AtomicBool::new(false));
    let signal_flag = Arc::clone(&stop);
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Received shutdown signal, finishing current batch");
            signal_flag.store(true, Ordering::Relaxed);
        }
    });

    info!("🚀 Training on {}", job.data_dir.display());
    let worker_job = job.clone();
    let outcome = tokio::task::spawn_blocking(move || run_training(&worker_job, stop))
        .await
        .context("Training task failed")??;
    watcher.abort();

    if outcome.interrupted {
        warn!("Training was interrupted; saved weights are the best reached so far");
    }
    println!("Epochs:         {}", outcome.history.len());
    println!(
        "Split:          {} train / {} validation / {} test",
        outcome.split_sizes.train, outcome.split_sizes.validation, outcome.split_sizes.test
    );
    println!("Test accuracy:  {:.2}%", outcome.test_report.accuracy * 100.0);
    println!("Test loss:      {:.4}", outcome.test_report.loss);
    println!("Model:          {}", job.model_path().display());
    println!("Labels:         {}", job.labels_path().display());
    if job.model_path() != config.model_path {
        println!(
            "\nSet model_path and labels_path in {} to use this model.",
            config.config_path.display()
        );
    }
    Ok(())
}

fn list_emotions() {
    let table = SatisfactionTable::standard();
    for emotion in Emotion::ALL {
        println!("{:<10} {:>4.1}", emotion.name(), table.base(emotion));
    }
}

fn show_config(config: &AppConfig) -> Result<()> {
    println!("# {}", config.config_path.display());
    print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
    Ok(())
}
