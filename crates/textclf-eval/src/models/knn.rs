use linfa_nn::distance::L2Dist;
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{check_fit_input, check_n_features, majority_vote, model_error};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KnnParams {
    pub n_neighbors: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

/// k-nearest-neighbours vote under euclidean distance, searched with a
/// `linfa-nn` index. Ties in the vote go to the lowest class index.
pub struct KNearestNeighbors {
    params: KnnParams,
    train: Option<(Array2<f64>, Vec<usize>)>,
    n_classes: usize,
}

impl KNearestNeighbors {
    pub fn new(params: KnnParams) -> Self {
        KNearestNeighbors {
            params,
            train: None,
            n_classes: 0,
        }
    }
}

impl Classifier for KNearestNeighbors {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        if self.params.n_neighbors == 0 {
            return Err(EvalError::InvalidInput("n_neighbors must be at least 1".to_string()));
        }
        self.train = Some((x.clone(), y.to_vec()));
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let Some((train_x, train_y)) = &self.train else {
            return Err(EvalError::NotFitted(self.name().to_string()));
        };
        check_n_features(self.name(), train_x.ncols(), x)?;
        let k = self.params.n_neighbors.min(train_y.len());

        // the index borrows the training rows
        let index = CommonNearestNeighbour::LinearSearch
            .from_batch(train_x, L2Dist)
            .map_err(|e| model_error(self.name(), e))?;

        let mut predictions = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let neighbours = index
                .k_nearest(row, k)
                .map_err(|e| model_error(self.name(), e))?;
            let mut votes = vec![0usize; self.n_classes];
            for (_, i) in neighbours {
                votes[train_y[i]] += 1;
            }
            predictions.push(majority_vote(&votes));
        }
        Ok(predictions)
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(KNearestNeighbors::new(self.params.clone()))
    }

    fn name(&self) -> &str {
        "KNearestNeighbors"
    }
}
