//! End-to-end pipeline driver.
//!
//! Fixed single-shot sequence: scan the target directory, load the negative
//! bank, extract features for positives (and hard negatives if supplied),
//! build the balanced dataset, fit and evaluate the classifier, then
//! categorize the target corpus into the output directory. Any stage failure
//! aborts the run.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use ndarray::Array2;

use crate::bank;
use crate::categorizer;
use crate::dataset;
use crate::error::CategorizeError;
use crate::extractor::ImageEmbedding;
use crate::svm::{self, LinearSvc, SvmConfig};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory of positive training images
    pub positives: PathBuf,
    /// Optional directory of hard-negative training images; a missing
    /// directory degrades to "no hard negatives"
    pub negatives: Option<PathBuf>,
    /// Directory of uncategorized images to sort
    pub target_data: PathBuf,
    /// Output directory for predicted-positive images
    pub save_to: PathBuf,
    /// Path to the precomputed negative feature bank
    pub bank_path: PathBuf,
    /// Deterministic seed for sampling and shuffling; `None` uses entropy
    pub seed: Option<u64>,
}

/// What a run produced, for logging and tests.
#[derive(Debug)]
pub struct PipelineReport {
    pub accuracy: f32,
    pub positives: usize,
    pub negatives: usize,
    pub train_examples: usize,
    pub test_examples: usize,
    pub targets: usize,
    pub copied: usize,
}

/// Lists the `*.jpg` files directly inside `dir`, sorted by file name.
/// Non-recursive; the extension match is case-sensitive, so `photo.JPG` is
/// skipped.
pub fn list_jpgs(dir: &Path) -> Result<Vec<PathBuf>, CategorizeError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "jpg") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Runs the whole pipeline with the given embedding backend.
///
/// # Errors
/// - `EmptyTargetDir` if the target directory holds no `*.jpg` files
/// - `Validation` if the positives directory holds no `*.jpg` files
/// - forwards every downstream stage error
pub fn run<E: ImageEmbedding + ?Sized>(
    extractor: &E,
    config: &PipelineConfig,
) -> Result<PipelineReport, CategorizeError> {
    let target_paths = list_jpgs(&config.target_data)?;
    if target_paths.is_empty() {
        return Err(CategorizeError::EmptyTargetDir(config.target_data.clone()));
    }

    let bank = bank::load(&config.bank_path, extractor.embedding_dim())?;

    let positive_paths = list_jpgs(&config.positives)?;
    if positive_paths.is_empty() {
        return Err(CategorizeError::Validation(format!(
            "no *.jpg files found in positives directory {}",
            config.positives.display()
        )));
    }
    info!("Processing positive images...");
    let positive_features = extractor.embed_all(&positive_paths)?;

    let hard_negative_features = extract_hard_negatives(extractor, config.negatives.as_deref())?;

    let split = dataset::build(
        positive_features.view(),
        bank.view(),
        hard_negative_features.as_ref().map(Array2::view),
        config.seed,
    )?;
    let train_examples = split.train_y.len();
    let test_examples = split.test_y.len();

    info!("Training");
    let mut classifier = LinearSvc::new(SvmConfig {
        seed: config.seed,
        ..SvmConfig::default()
    });
    classifier.fit(split.train_x.view(), &split.train_y)?;
    let predictions = classifier.predict(split.test_x.view())?;
    let accuracy = svm::accuracy(&predictions, &split.test_y);
    info!("Training finished. Accuracy score: {accuracy:.6}");

    info!("Categorizing target images");
    let copied = categorizer::categorize(extractor, &classifier, &target_paths, &config.save_to)?;

    Ok(PipelineReport {
        accuracy,
        positives: positive_paths.len(),
        negatives: train_examples + test_examples - positive_paths.len(),
        train_examples,
        test_examples,
        targets: target_paths.len(),
        copied: copied.len(),
    })
}

/// A supplied-but-missing negatives directory and a directory with no `*.jpg`
/// files both degrade gracefully to "no hard negatives".
fn extract_hard_negatives<E: ImageEmbedding + ?Sized>(
    extractor: &E,
    negatives: Option<&Path>,
) -> Result<Option<Array2<f32>>, CategorizeError> {
    let Some(dir) = negatives else {
        return Ok(None);
    };
    if !dir.exists() {
        warn!(
            "Negatives directory {} does not exist, continuing without hard negatives",
            dir.display()
        );
        return Ok(None);
    }

    let paths = list_jpgs(dir)?;
    if paths.is_empty() {
        warn!(
            "Negatives directory {} contains no *.jpg files, continuing without hard negatives",
            dir.display()
        );
        return Ok(None);
    }

    info!("Processing negative images...");
    Ok(Some(extractor.embed_all(&paths)?))
}
