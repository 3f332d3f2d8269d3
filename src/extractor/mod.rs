//! Deep feature extraction for images.
//!
//! The [`ImageEmbedding`] trait is the seam between the pipeline and the
//! backbone: everything downstream of extraction only sees feature matrices,
//! so tests can substitute a stub and the real [`FeatureExtractor`] can wrap
//! whatever ONNX export is configured.

mod preprocess;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use log::info;
use ndarray::{s, Array2, ArrayViewD, Axis};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::CategorizeError;
use crate::models::ModelCharacteristics;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Images fed through the backbone per inference call. Bounds peak memory
/// when sweeping large corpora.
pub const BATCH_SIZE: usize = 16;

/// Maps batches of image paths to fixed-length feature vectors.
///
/// Implementations must return one feature row per input path, in input
/// order, with row length equal to `embedding_dim()`.
pub trait ImageEmbedding {
    fn embedding_dim(&self) -> usize;

    /// Embeds a single batch of images.
    fn embed_batch(&self, paths: &[PathBuf]) -> Result<Array2<f32>, CategorizeError>;

    /// Embeds an arbitrary number of images in batches of [`BATCH_SIZE`],
    /// reporting progress, and concatenates the per-batch outputs in input
    /// order.
    ///
    /// # Errors
    /// - `Validation` if `paths` is empty
    /// - `ShapeMismatch` if a batch comes back with the wrong shape
    /// - forwards all errors from `embed_batch`
    fn embed_all(&self, paths: &[PathBuf]) -> Result<Array2<f32>, CategorizeError> {
        if paths.is_empty() {
            return Err(CategorizeError::Validation("no images to embed".into()));
        }

        let mut features = Array2::<f32>::zeros((paths.len(), self.embedding_dim()));
        let progress = ProgressBar::new(paths.len() as u64);
        let mut row = 0;
        for chunk in paths.chunks(BATCH_SIZE) {
            let batch = self.embed_batch(chunk)?;
            if batch.nrows() != chunk.len() {
                return Err(CategorizeError::Validation(format!(
                    "embedded {} rows for a batch of {} images",
                    batch.nrows(),
                    chunk.len()
                )));
            }
            if batch.ncols() != self.embedding_dim() {
                return Err(CategorizeError::ShapeMismatch {
                    expected: self.embedding_dim(),
                    actual: batch.ncols(),
                });
            }
            features.slice_mut(s![row..row + chunk.len(), ..]).assign(&batch);
            row += chunk.len();
            progress.inc(chunk.len() as u64);
        }
        progress.finish_and_clear();
        Ok(features)
    }
}

/// Wraps an ONNX backbone session and turns decoded images into feature
/// vectors.
pub struct FeatureExtractor {
    session: Session,
    characteristics: ModelCharacteristics,
}

impl FeatureExtractor {
    /// Loads the backbone from an ONNX file and validates its structure.
    pub fn from_file(
        model_path: &Path,
        characteristics: ModelCharacteristics,
        config: &RuntimeConfig,
    ) -> Result<Self, CategorizeError> {
        if !model_path.exists() {
            return Err(CategorizeError::Model(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let session = create_session_builder(config)
            .map_err(|e| CategorizeError::Model(format!("failed to configure session: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| CategorizeError::Model(format!("failed to load backbone: {e}")))?;

        Self::validate_model(&session)?;
        info!("Backbone loaded from {}", model_path.display());

        Ok(Self {
            session,
            characteristics,
        })
    }

    /// The backbone must take a single image tensor and produce at least one
    /// output to flatten into feature vectors.
    fn validate_model(session: &Session) -> Result<(), CategorizeError> {
        if session.inputs.len() != 1 {
            return Err(CategorizeError::Model(format!(
                "backbone must have exactly 1 image input, found {}",
                session.inputs.len()
            )));
        }
        if session.outputs.is_empty() {
            return Err(CategorizeError::Model(
                "backbone must have at least 1 output for features".to_string(),
            ));
        }
        Ok(())
    }
}

impl ImageEmbedding for FeatureExtractor {
    fn embedding_dim(&self) -> usize {
        self.characteristics.embedding_dim
    }

    fn embed_batch(&self, paths: &[PathBuf]) -> Result<Array2<f32>, CategorizeError> {
        let batch = preprocess::batch_tensor(
            paths,
            self.characteristics.input_size,
            &self.characteristics.normalization,
        )?;
        let batch_dyn = batch.into_dyn();
        let input = batch_dyn.as_standard_layout();

        let input_name = self.session.inputs[0].name.clone();
        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| CategorizeError::Model(format!("failed to create input tensor: {e}")))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| CategorizeError::Model(format!("failed to run backbone: {e}")))?;
        let output = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| CategorizeError::Model(format!("failed to extract output tensor: {e}")))?;

        flatten_features(output, paths.len(), self.characteristics.embedding_dim)
    }
}

/// Collapses a backbone output into one feature row per image: `[n, 2048]`
/// and `[n, 2048, 1, 1]` both flatten to an `[n, 2048]` matrix.
///
/// # Errors
/// - `Model` if the output has no batch axis or its batch axis disagrees
///   with the number of input images
/// - `ShapeMismatch` if a sample does not flatten to `dim` values
fn flatten_features(
    output: ArrayViewD<f32>,
    n: usize,
    dim: usize,
) -> Result<Array2<f32>, CategorizeError> {
    if output.ndim() < 2 || output.shape()[0] != n {
        return Err(CategorizeError::Model(format!(
            "backbone output shape {:?} does not match a batch of {n} images",
            output.shape()
        )));
    }

    let mut features = Array2::<f32>::zeros((n, dim));
    for i in 0..n {
        let sample = output.index_axis(Axis(0), i);
        if sample.len() != dim {
            return Err(CategorizeError::ShapeMismatch {
                expected: dim,
                actual: sample.len(),
            });
        }
        for (j, value) in sample.iter().enumerate() {
            features[[i, j]] = *value;
        }
    }
    Ok(features)
}
