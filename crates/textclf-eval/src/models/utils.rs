//! Helpers shared by the classifier implementations.
use std::fmt::Display;

use linfa::{Dataset, DatasetBase};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Per-class sample weighting.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// Weight each class by `n_samples / (n_classes * class_count)`.
    Balanced,
}

/// Check the shapes handed to `fit`.
pub fn check_fit_input(name: &str, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(EvalError::LengthMismatch {
            features: x.nrows(),
            labels: y.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(EvalError::InvalidInput(format!("{} cannot be fit on zero rows", name)));
    }
    if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
        return Err(EvalError::InvalidInput(format!(
            "{}: label {} outside 0..{}",
            name, bad, n_classes
        )));
    }
    Ok(())
}

/// Check that `predict` gets as many columns as `fit` saw.
pub fn check_n_features(name: &str, expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(EvalError::InvalidInput(format!(
            "{} fit on {} features, got {}",
            name,
            expected,
            x.ncols()
        )));
    }
    Ok(())
}

pub fn class_counts(y: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &c in y {
        counts[c] += 1;
    }
    counts
}

/// Wrap a linfa error with the name of the model that raised it.
pub fn model_error(name: &str, err: impl Display) -> EvalError {
    EvalError::Model(format!("{}: {}", name, err))
}

/// Build a linfa dataset with class indices as targets.
pub fn to_dataset(x: &Array2<f64>, y: &[usize]) -> DatasetBase<Array2<f64>, Array1<usize>> {
    Dataset::new(x.clone(), Array1::from_vec(y.to_vec()))
}

/// Sample weights for `y` under `weighting` (all ones when `None`).
pub fn sample_weights(y: &[usize], n_classes: usize, weighting: Option<ClassWeight>) -> Array1<f32> {
    match weighting {
        None => Array1::ones(y.len()),
        Some(ClassWeight::Balanced) => {
            let counts = class_counts(y, n_classes);
            let present = counts.iter().filter(|&&c| c > 0).count().max(1) as f32;
            let n = y.len() as f32;
            y.iter()
                .map(|&c| n / (present * counts[c] as f32))
                .collect()
        }
    }
}

/// Balance classes for learners that take no sample weights: every row is
/// repeated `round(largest_count / class_count)` times.
pub fn oversample_balanced(x: &Array2<f64>, y: &[usize], n_classes: usize) -> (Array2<f64>, Vec<usize>) {
    let counts = class_counts(y, n_classes);
    let largest = counts.iter().copied().max().unwrap_or(0) as f64;

    let mut rows = Vec::with_capacity(y.len());
    for (i, &c) in y.iter().enumerate() {
        let repeat = (largest / counts[c] as f64).round().max(1.0) as usize;
        rows.extend(std::iter::repeat(i).take(repeat));
    }
    let labels = rows.iter().map(|&i| y[i]).collect();
    (x.select(Axis(0), &rows), labels)
}

/// Most voted class; the lowest class index wins on ties.
pub fn majority_vote(votes: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in votes.iter().enumerate() {
        if count > votes[best] {
            best = class;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_weights() {
        let y = [0, 0, 0, 1];
        let w = sample_weights(&y, 2, Some(ClassWeight::Balanced));
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-6);
        assert!((w[3] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_oversample_balanced() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let (xb, yb) = oversample_balanced(&x, &[0, 0, 0, 1], 2);
        assert_eq!(yb, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(xb.column(0).to_vec(), vec![0.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_majority_vote_first_on_ties() {
        assert_eq!(majority_vote(&[1, 3, 3]), 1);
        assert_eq!(majority_vote(&[0, 0]), 0);
    }

    #[test]
    fn test_check_fit_input_rejects_label_out_of_range() {
        let x = Array2::<f64>::zeros((2, 1));
        assert!(check_fit_input("m", &x, &[0, 2], 2).is_err());
        assert!(check_fit_input("m", &x, &[0], 2).is_err());
        assert!(check_fit_input("m", &x, &[0, 1], 2).is_ok());
    }
}
