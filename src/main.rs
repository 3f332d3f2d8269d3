use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::info;

use categorize::{
    bank, init_logger, pipeline, BuiltinModel, FeatureExtractor, ModelManager, PipelineConfig,
    RuntimeConfig,
};

/// Trainable image categorization tool: learns a binary classifier from the
/// images in --positives and copies the matching images from --target_data
/// into --save_to.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing positive images to train on
    #[arg(long)]
    positives: PathBuf,

    /// Directory containing hard-negative images to train on
    #[arg(long)]
    negatives: Option<PathBuf>,

    /// Path to dir containing uncategorized data
    #[arg(long = "target_data")]
    target_data: PathBuf,

    /// Path to save categorized data
    #[arg(long = "save_to")]
    save_to: PathBuf,

    /// Precomputed negative feature bank (.npy)
    #[arg(long, default_value = bank::DEFAULT_BANK_PATH)]
    negative_bank: PathBuf,

    /// Seed for negative sampling and the train/test shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Use a local ONNX backbone instead of the managed download
    #[arg(long)]
    model: Option<PathBuf>,

    /// Force a fresh download of the managed backbone
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let model = BuiltinModel::ResNet50;

    let model_path = match &args.model {
        Some(path) => path.clone(),
        None => {
            let manager = ModelManager::new_default()?;
            if args.fresh {
                info!("Fresh download requested - removing any existing model files...");
                manager.remove_download(model)?;
            }
            manager.ensure_downloaded(model).await?
        }
    };

    let extractor = FeatureExtractor::from_file(
        &model_path,
        model.characteristics(),
        &RuntimeConfig::default(),
    )?;

    let config = PipelineConfig {
        positives: args.positives,
        negatives: args.negatives,
        target_data: args.target_data,
        save_to: args.save_to,
        bank_path: args.negative_bank,
        seed: args.seed,
    };

    let report = pipeline::run(&extractor, &config)?;
    println!("Accuracy score: {:.6}", report.accuracy);
    println!(
        "Copied {} of {} target images to {}",
        report.copied,
        report.targets,
        config.save_to.display()
    );
    println!("Done!");
    Ok(())
}
