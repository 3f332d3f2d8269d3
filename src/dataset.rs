//! Balanced dataset assembly and train/test splitting.
//!
//! Positives are labeled 1 and negatives 0. The negative pool starts with any
//! hard negatives the user supplied and is topped up with a uniform
//! without-replacement sample from the generic bank until it holds at least
//! twice as many examples as the positive set.

use log::info;
use ndarray::{s, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::CategorizeError;

/// Fraction of examples held out for evaluation.
const TEST_FRACTION: f64 = 0.1;

/// Negative examples per positive example.
const NEGATIVE_RATIO: usize = 2;

#[derive(Debug)]
pub struct TrainTestSplit {
    pub train_x: Array2<f32>,
    pub test_x: Array2<f32>,
    pub train_y: Vec<u8>,
    pub test_y: Vec<u8>,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Builds the balanced, shuffled training set.
///
/// # Errors
/// - `Validation` if there are no positive examples
/// - `ShapeMismatch` if the bank or hard negatives disagree with the
///   positives' dimensionality
/// - `InsufficientNegatives` if the bank cannot supply the required top-up
pub fn build(
    positives: ArrayView2<f32>,
    bank: ArrayView2<f32>,
    hard_negatives: Option<ArrayView2<f32>>,
    seed: Option<u64>,
) -> Result<TrainTestSplit, CategorizeError> {
    let n_pos = positives.nrows();
    if n_pos == 0 {
        return Err(CategorizeError::Validation(
            "at least one positive example is required".into(),
        ));
    }

    let dim = positives.ncols();
    if bank.ncols() != dim {
        return Err(CategorizeError::ShapeMismatch {
            expected: dim,
            actual: bank.ncols(),
        });
    }
    if let Some(hard) = hard_negatives {
        if hard.ncols() != dim {
            return Err(CategorizeError::ShapeMismatch {
                expected: dim,
                actual: hard.ncols(),
            });
        }
    }

    let mut rng = make_rng(seed);

    let target_neg = NEGATIVE_RATIO * n_pos;
    let n_hard = hard_negatives.map_or(0, |h| h.nrows());
    let n_from_bank = target_neg.saturating_sub(n_hard);
    if n_from_bank > bank.nrows() {
        return Err(CategorizeError::InsufficientNegatives {
            needed: n_from_bank,
            available: bank.nrows(),
        });
    }

    let n_neg = n_hard + n_from_bank;
    let mut x = Array2::<f32>::zeros((n_pos + n_neg, dim));
    x.slice_mut(s![..n_pos, ..]).assign(&positives);
    if let Some(hard) = hard_negatives {
        x.slice_mut(s![n_pos..n_pos + n_hard, ..]).assign(&hard);
    }
    if n_from_bank > 0 {
        let picks = index::sample(&mut rng, bank.nrows(), n_from_bank);
        for (slot, bank_row) in picks.iter().enumerate() {
            x.slice_mut(s![n_pos + n_hard + slot, ..])
                .assign(&bank.row(bank_row));
        }
    }

    let mut y = vec![1u8; n_pos];
    y.extend(std::iter::repeat(0u8).take(n_neg));

    info!("Number of positive examples: {n_pos}");
    info!("Number of negative examples: {n_neg}");

    Ok(split(x, y, &mut rng))
}

/// Shuffles a joint index permutation and partitions it, so each example
/// lands in exactly one side with its label attached.
fn split(x: Array2<f32>, y: Vec<u8>, rng: &mut StdRng) -> TrainTestSplit {
    let n = x.nrows();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let n_test = ((n as f64) * TEST_FRACTION).ceil() as usize;
    let (test_idx, train_idx) = order.split_at(n_test);

    TrainTestSplit {
        train_x: x.select(Axis(0), train_idx),
        test_x: x.select(Axis(0), test_idx),
        train_y: train_idx.iter().map(|&i| y[i]).collect(),
        test_y: test_idx.iter().map(|&i| y[i]).collect(),
    }
}
