//! Batch categorization: predict over the whole target corpus and copy the
//! predicted-positive files into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use log::info;

use crate::error::CategorizeError;
use crate::extractor::ImageEmbedding;
use crate::svm::LinearSvc;

/// Runs the fitted classifier over `paths` and copies every predicted-positive
/// file into `save_to` by basename, creating the directory if needed. Returns
/// the destination paths written, in the original input order.
///
/// An existing destination file with the same basename is overwritten; the
/// copy is deliberately a plain one.
pub fn categorize<E: ImageEmbedding + ?Sized>(
    extractor: &E,
    classifier: &LinearSvc,
    paths: &[PathBuf],
    save_to: &Path,
) -> Result<Vec<PathBuf>, CategorizeError> {
    let features = extractor.embed_all(paths)?;
    let predictions = classifier.predict(features.view())?;

    let selected: Vec<&PathBuf> = paths
        .iter()
        .zip(&predictions)
        .filter(|&(_, &prediction)| prediction == 1)
        .map(|(path, _)| path)
        .collect();

    fs::create_dir_all(save_to)?;
    info!(
        "Copying {} of {} images to {}",
        selected.len(),
        paths.len(),
        save_to.display()
    );

    let progress = ProgressBar::new(selected.len() as u64);
    let mut copied = Vec::with_capacity(selected.len());
    for source in selected {
        let name = source.file_name().ok_or_else(|| {
            CategorizeError::Validation(format!("path has no file name: {}", source.display()))
        })?;
        let destination = save_to.join(name);
        fs::copy(source, &destination)?;
        copied.push(destination);
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(copied)
}
