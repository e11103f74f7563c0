//! Stratified k-fold splitting and cross-validated prediction/scoring.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::data_handling::Dataset;
use crate::error::{EvalError, Result};
use crate::metrics::{ConfusionMatrix, Metric};
use crate::pipeline::FeaturePipeline;

/// Train and test row indices of one fold.
pub type Fold = (Vec<usize>, Vec<usize>);

/// K-fold splitter that keeps each fold's class proportions close to the
/// whole dataset's.
///
/// Rows are assigned to test folds class by class: sorting the labels and
/// dealing them round-robin over the folds fixes how many members of each
/// class land in each fold. Without `shuffle`, a class's members fill the
/// folds in row order; with it, the fold assignment within each class is
/// shuffled from `seed`.
#[derive(Debug, Clone, PartialEq)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle: false,
            seed: 0,
        }
    }
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, shuffle: bool, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle,
            seed,
        }
    }

    /// Split rows labelled `y` (class indices below `n_classes`) into
    /// `n_splits` (train, test) pairs, in fold order.
    pub fn split(&self, y: &[usize], n_classes: usize) -> Result<Vec<Fold>> {
        let k = self.n_splits;
        if k < 2 {
            return Err(EvalError::Fold(format!(
                "n_splits must be at least 2, got {}",
                k
            )));
        }
        if k > y.len() {
            return Err(EvalError::Fold(format!(
                "Cannot have n_splits={} greater than the number of samples {}",
                k,
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(EvalError::Fold(format!("label {} outside 0..{}", bad, n_classes)));
        }

        // classes re-encoded by first appearance
        let mut order = vec![usize::MAX; n_classes];
        let mut n_seen = 0;
        for &c in y {
            if order[c] == usize::MAX {
                order[c] = n_seen;
                n_seen += 1;
            }
        }
        let encoded: Vec<usize> = y.iter().map(|&c| order[c]).collect();

        let mut counts = vec![0usize; n_seen];
        for &c in &encoded {
            counts[c] += 1;
        }
        let largest = counts.iter().copied().max().unwrap_or(0);
        let smallest = counts.iter().copied().min().unwrap_or(0);
        if k > largest {
            return Err(EvalError::Fold(format!(
                "n_splits={} cannot be greater than the number of members in each class",
                k
            )));
        }
        if k > smallest {
            log::warn!(
                "The least populated class has only {} members, which is less than n_splits={}",
                smallest,
                k
            );
        }

        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        // allocation[fold][class]
        let mut allocation = vec![vec![0usize; n_seen]; k];
        for (i, &c) in sorted.iter().enumerate() {
            allocation[i % k][c] += 1;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut test_fold = vec![0usize; y.len()];
        for class in 0..n_seen {
            let mut folds_for_class: Vec<usize> = (0..k)
                .flat_map(|fold| std::iter::repeat(fold).take(allocation[fold][class]))
                .collect();
            if self.shuffle {
                folds_for_class.shuffle(&mut rng);
            }
            let members = encoded.iter().enumerate().filter(|(_, &c)| c == class).map(|(i, _)| i);
            for (row, fold) in members.zip(folds_for_class) {
                test_fold[row] = fold;
            }
        }

        Ok((0..k)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&row| test_fold[row] == fold);
                (train, test)
            })
            .collect())
    }
}

/// Out-of-fold predictions plus per-fold scores from one pass over the folds.
#[derive(Debug, Clone)]
pub struct CrossValidated {
    /// Prediction for every row, made by the model that did not see it.
    pub predictions: Vec<usize>,
    /// For each requested metric, one score per fold (fold order).
    pub fold_scores: Vec<(Metric, Vec<f64>)>,
}

impl CrossValidated {
    pub fn scores(&self, metric: Metric) -> Option<&[f64]> {
        self.fold_scores
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, s)| s.as_slice())
    }
}

/// Fit a fresh copy of `pipeline` per fold, predict the held-out rows and
/// score them. Folds run in parallel; the first failure aborts the call.
pub fn cross_val_predict_and_score(
    pipeline: &FeaturePipeline,
    data: &Dataset,
    y: &[usize],
    n_classes: usize,
    folds: &[Fold],
    metrics: &[Metric],
) -> Result<CrossValidated> {
    if data.len() != y.len() {
        return Err(EvalError::LengthMismatch {
            features: data.len(),
            labels: y.len(),
        });
    }

    let per_fold: Vec<(Vec<usize>, Vec<f64>)> = folds
        .par_iter()
        .map(|(train, test)| {
            let y_train: Vec<usize> = train.iter().map(|&i| y[i]).collect();
            let y_test: Vec<usize> = test.iter().map(|&i| y[i]).collect();

            let mut model = pipeline.fresh();
            model.fit(&data.select_rows(train), &y_train, n_classes)?;
            let predicted = model.predict(&data.select_rows(test))?;

            let cm = ConfusionMatrix::new(&y_test, &predicted, n_classes)?;
            let scores = metrics.iter().map(|&m| cm.score(m)).collect();
            Ok((predicted, scores))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut predictions = vec![0usize; y.len()];
    let mut fold_scores: Vec<(Metric, Vec<f64>)> =
        metrics.iter().map(|&m| (m, Vec::with_capacity(folds.len()))).collect();
    for ((_, test), (predicted, scores)) in folds.iter().zip(per_fold) {
        for (&row, &p) in test.iter().zip(predicted.iter()) {
            predictions[row] = p;
        }
        for ((_, bucket), score) in fold_scores.iter_mut().zip(scores) {
            bucket.push(score);
        }
    }

    Ok(CrossValidated {
        predictions,
        fold_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratified_fold_sizes() {
        // 6 of class 0, 4 of class 1
        let y = vec![0, 0, 0, 0, 0, 0, 1, 1, 1, 1];
        let folds = StratifiedKFold::new(2, false, 0).split(&y, 2).unwrap();
        assert_eq!(folds.len(), 2);
        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 10);
            assert_eq!(test.iter().filter(|&&i| y[i] == 0).count(), 3);
            assert_eq!(test.iter().filter(|&&i| y[i] == 1).count(), 2);
        }
        assert_eq!(folds[0].1, vec![0, 1, 2, 6, 7]);
    }

    #[test]
    fn test_every_row_tested_once() {
        let y: Vec<usize> = (0..23).map(|i| i % 3).collect();
        let folds = StratifiedKFold::new(5, true, 7).split(&y, 3).unwrap();
        let mut seen = vec![0; y.len()];
        for (_, test) in &folds {
            for &i in test {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let y: Vec<usize> = (0..20).map(|i| i % 2).collect();
        let a = StratifiedKFold::new(4, true, 3).split(&y, 2).unwrap();
        let b = StratifiedKFold::new(4, true, 3).split(&y, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_splits() {
        let y = vec![0, 0, 1, 1];
        assert!(StratifiedKFold::new(3, false, 0).split(&y, 2).is_err());
        assert!(StratifiedKFold::new(1, false, 0).split(&y, 2).is_err());
    }
}
