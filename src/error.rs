use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents the different types of errors that can occur in the
/// categorization pipeline. All of them abort the run; none are retried.
#[derive(Debug, Error)]
pub enum CategorizeError {
    /// Malformed or empty inputs supplied by the caller
    #[error("Validation error: {0}")]
    Validation(String),
    /// An image file could not be read or decoded
    #[error("Failed to decode image {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
    /// The negative bank cannot supply enough samples for the 2:1 balance
    #[error("Not enough negative samples: need {needed} from the bank, which holds {available}")]
    InsufficientNegatives { needed: usize, available: usize },
    /// Feature dimensionality disagrees somewhere in the pipeline
    #[error("Feature dimensionality mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// The target directory holds no `*.jpg` files; mapped to exit code 1
    #[error("No data found to categorize in path: {}", .0.display())]
    EmptyTargetDir(PathBuf),
    /// Error loading or running the ONNX backbone
    #[error("Model error: {0}")]
    Model(String),
    /// The negative feature bank could not be loaded
    #[error("Negative feature bank {}: {reason}", .path.display())]
    Bank { path: PathBuf, reason: String },
    /// Filesystem failures (directory scans, output copies)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
