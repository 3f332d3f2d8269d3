//! Linear support-vector classifier.
//!
//! Trained with stochastic subgradient descent on the L2-regularized hinge
//! loss (the Pegasos schedule), which is enough for the small, high-dimensional
//! datasets this tool sees. One fixed configuration, no hyperparameter search.

use log::{debug, warn};
use ndarray::{Array1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::CategorizeError;

#[derive(Debug, Clone)]
pub struct SvmConfig {
    /// Inverse regularization strength, as in the usual C-SVM
    /// parameterization.
    pub c: f32,
    /// Passes over the training set. Training always runs the full budget;
    /// leftover margin violations are logged, not fatal.
    pub epochs: usize,
    /// Seed for the per-epoch example shuffle.
    pub seed: Option<u64>,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epochs: 64,
            seed: None,
        }
    }
}

/// A fitted linear decision boundary over feature space.
#[derive(Debug)]
pub struct LinearSvc {
    config: SvmConfig,
    weights: Option<Array1<f32>>,
    bias: f32,
}

impl LinearSvc {
    pub fn new(config: SvmConfig) -> Self {
        Self {
            config,
            weights: None,
            bias: 0.0,
        }
    }

    /// Fits the boundary on {0,1}-labeled examples.
    ///
    /// # Errors
    /// - `Validation` on an empty training set or a label/row count mismatch
    pub fn fit(&mut self, x: ArrayView2<f32>, y: &[u8]) -> Result<(), CategorizeError> {
        let n = x.nrows();
        if n == 0 {
            return Err(CategorizeError::Validation(
                "cannot fit a classifier on an empty training set".into(),
            ));
        }
        if y.len() != n {
            return Err(CategorizeError::Validation(format!(
                "{} feature rows but {} labels",
                n,
                y.len()
            )));
        }

        // Hinge loss wants ±1 targets.
        let targets: Vec<f32> = y.iter().map(|&label| if label == 1 { 1.0 } else { -1.0 }).collect();
        let lambda = 1.0 / (self.config.c * n as f32);

        let mut weights = Array1::<f32>::zeros(x.ncols());
        let mut bias = 0.0f32;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..n).collect();

        let mut t: usize = 0;
        let mut final_epoch_violations = 0usize;
        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);
            final_epoch_violations = 0;
            for &i in &order {
                t += 1;
                let eta = 1.0 / (lambda * t as f32);
                let row = x.row(i);
                let margin = targets[i] * (row.dot(&weights) + bias);

                weights *= 1.0 - eta * lambda;
                if margin < 1.0 {
                    weights.scaled_add(eta * targets[i], &row);
                    bias += eta * targets[i];
                    final_epoch_violations += 1;
                }
            }
            debug!("epoch {}: {} margin violations", epoch + 1, final_epoch_violations);
        }

        if final_epoch_violations > 0 {
            warn!(
                "{final_epoch_violations} margin violations remained in the final epoch; keeping the current boundary"
            );
        }

        self.weights = Some(weights);
        self.bias = bias;
        Ok(())
    }

    /// Signed distance of each row from the boundary.
    ///
    /// # Errors
    /// - `Validation` if the classifier has not been fitted
    /// - `ShapeMismatch` if the input dimensionality disagrees with training
    pub fn decision_function(&self, x: ArrayView2<f32>) -> Result<Array1<f32>, CategorizeError> {
        let weights = self.weights.as_ref().ok_or_else(|| {
            CategorizeError::Validation("classifier has not been fitted".into())
        })?;
        if x.ncols() != weights.len() {
            return Err(CategorizeError::ShapeMismatch {
                expected: weights.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(weights) + self.bias)
    }

    /// Predicts {0,1} labels for each row.
    pub fn predict(&self, x: ArrayView2<f32>) -> Result<Vec<u8>, CategorizeError> {
        Ok(self
            .decision_function(x)?
            .iter()
            .map(|&score| u8::from(score > 0.0))
            .collect())
    }
}

/// Fraction of predictions that match the true labels, in [0, 1].
pub fn accuracy(predicted: &[u8], truth: &[u8]) -> f32 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    hits as f32 / truth.len() as f32
}
