//! Loading of the precomputed negative feature bank.
//!
//! The bank is a `.npy` file holding an f32 matrix of generic negative
//! feature vectors, one row per vector. It is produced offline and treated as
//! read-only reference data for the whole run.

use std::path::Path;

use log::info;
use ndarray::Array2;
use ndarray_npy::read_npy;

use crate::error::CategorizeError;

/// Row count of the bank shipped alongside the tool.
pub const DEFAULT_BANK_SIZE: usize = 1000;

/// Relative path the bank is loaded from when no override is given.
pub const DEFAULT_BANK_PATH: &str = "data/neg_f_1000.npy";

/// Loads the bank and checks it against the extractor's dimensionality.
pub fn load(path: &Path, expected_dim: usize) -> Result<Array2<f32>, CategorizeError> {
    let bank: Array2<f32> = read_npy(path).map_err(|e| CategorizeError::Bank {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if bank.nrows() == 0 {
        return Err(CategorizeError::Bank {
            path: path.to_path_buf(),
            reason: "bank holds no vectors".to_string(),
        });
    }
    if bank.ncols() != expected_dim {
        return Err(CategorizeError::ShapeMismatch {
            expected: expected_dim,
            actual: bank.ncols(),
        });
    }

    info!(
        "Loaded negative feature bank: {} vectors of dimension {}",
        bank.nrows(),
        bank.ncols()
    );
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::write_npy;
    use tempfile::TempDir;

    #[test]
    fn test_bank_of_shipped_size_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bank.npy");
        write_npy(&path, &Array2::<f32>::zeros((DEFAULT_BANK_SIZE, 8))).unwrap();

        let loaded = load(&path, 8).unwrap();
        assert_eq!(loaded.nrows(), DEFAULT_BANK_SIZE);
    }

    #[test]
    fn test_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bank.npy");
        let bank = Array2::<f32>::ones((5, 8));
        write_npy(&path, &bank).unwrap();

        let loaded = load(&path, 8).unwrap();
        assert_eq!(loaded, bank);
    }

    #[test]
    fn test_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bank.npy");
        write_npy(&path, &Array2::<f32>::zeros((5, 4))).unwrap();

        let err = load(&path, 8).unwrap_err();
        assert!(matches!(
            err,
            CategorizeError::ShapeMismatch {
                expected: 8,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.npy"), 8).unwrap_err();
        assert!(matches!(err, CategorizeError::Bank { .. }));
    }

    #[test]
    fn test_empty_bank() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bank.npy");
        write_npy(&path, &Array2::<f32>::zeros((0, 8))).unwrap();

        let err = load(&path, 8).unwrap_err();
        assert!(matches!(err, CategorizeError::Bank { .. }));
    }
}
