//! Trainable image categorization: learn a binary image classifier from a
//! handful of positive examples and sort an uncategorized directory with it.
//!
//! The pipeline embeds images with a pretrained ONNX backbone (ResNet-50 with
//! its classification head removed), balances the positives against hard
//! negatives and a sampled bank of generic negatives, fits a linear SVM,
//! reports held-out accuracy, and copies every predicted-positive file from
//! the target directory into the output directory.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use categorize::{pipeline, BuiltinModel, FeatureExtractor, PipelineConfig, RuntimeConfig};
//! use std::path::Path;
//!
//! let extractor = FeatureExtractor::from_file(
//!     Path::new("resnet50.onnx"),
//!     BuiltinModel::ResNet50.characteristics(),
//!     &RuntimeConfig::default(),
//! )?;
//!
//! let report = pipeline::run(&extractor, &PipelineConfig {
//!     positives: "train/cats".into(),
//!     negatives: None,
//!     target_data: "unsorted".into(),
//!     save_to: "sorted/cats".into(),
//!     bank_path: categorize::bank::DEFAULT_BANK_PATH.into(),
//!     seed: None,
//! })?;
//!
//! println!("held-out accuracy: {:.3}", report.accuracy);
//! # Ok(())
//! # }
//! ```
//!
//! Everything downstream of feature extraction is generic over the
//! [`ImageEmbedding`] trait, so the classifier and pipeline can be exercised
//! without ONNX in tests.

pub mod bank;
pub mod categorizer;
pub mod dataset;
pub mod error;
pub mod extractor;
pub mod model_manager;
pub mod models;
pub mod pipeline;
pub mod runtime;
pub mod svm;

pub use error::CategorizeError;
pub use extractor::{FeatureExtractor, ImageEmbedding, BATCH_SIZE};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, InputNormalization, ModelCharacteristics, ModelInfo};
pub use pipeline::{PipelineConfig, PipelineReport};
pub use runtime::{create_session_builder, OptLevel, RuntimeConfig};
pub use svm::{LinearSvc, SvmConfig};

pub fn init_logger() {
    env_logger::init();
}
