//! Decision trees and bagged forests on top of `linfa-trees`.
use linfa::traits::{Fit, Predict};
use linfa_trees::{DecisionTree, DecisionTreeParams, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{
    check_fit_input, check_n_features, majority_vote, model_error, sample_weights, to_dataset,
    ClassWeight,
};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TreeParams {
    /// `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    pub class_weight: Option<ClassWeight>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            class_weight: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub class_weight: Option<ClassWeight>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            class_weight: None,
        }
    }
}

fn tree_params(max_depth: Option<usize>) -> DecisionTreeParams<f64, usize> {
    DecisionTree::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(max_depth)
}

fn fit_tree(
    name: &str,
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
    max_depth: Option<usize>,
    class_weight: Option<ClassWeight>,
) -> Result<DecisionTree<f64, usize>> {
    let dataset = to_dataset(x, y).with_weights(sample_weights(y, n_classes, class_weight));
    tree_params(max_depth)
        .fit(&dataset)
        .map_err(|e| model_error(name, e))
}

/// Single CART tree with Gini splits.
pub struct DecisionTreeClassifier {
    params: TreeParams,
    tree: Option<DecisionTree<f64, usize>>,
    n_features: usize,
}

impl DecisionTreeClassifier {
    pub fn new(params: TreeParams) -> Self {
        DecisionTreeClassifier {
            params,
            tree: None,
            n_features: 0,
        }
    }
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        let tree = fit_tree(
            self.name(),
            x,
            y,
            n_classes,
            self.params.max_depth,
            self.params.class_weight,
        )?;
        self.tree = Some(tree);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let Some(tree) = &self.tree else {
            return Err(EvalError::NotFitted(self.name().to_string()));
        };
        check_n_features(self.name(), self.n_features, x)?;
        let predicted: Array1<usize> = tree.predict(x);
        Ok(predicted.to_vec())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(DecisionTreeClassifier::new(self.params.clone()))
    }

    fn name(&self) -> &str {
        "DecisionTree"
    }
}

/// Bagged decision trees: each tree sees a bootstrap sample of the training
/// rows drawn from a generator seeded with `random_state`, and the forest
/// predicts by majority vote (ties to the lowest class).
pub struct RandomForest {
    params: ForestParams,
    random_state: u64,
    trees: Vec<DecisionTree<f64, usize>>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    pub fn new(params: ForestParams, random_state: u64) -> Self {
        RandomForest {
            params,
            random_state,
            trees: Vec::new(),
            n_classes: 0,
            n_features: 0,
        }
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        if self.params.n_estimators == 0 {
            return Err(EvalError::InvalidInput("n_estimators must be at least 1".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let n = y.len();
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        for _ in 0..self.params.n_estimators {
            let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let xb = x.select(Axis(0), &rows);
            let yb: Vec<usize> = rows.iter().map(|&i| y[i]).collect();
            trees.push(fit_tree(
                self.name(),
                &xb,
                &yb,
                n_classes,
                self.params.max_depth,
                self.params.class_weight,
            )?);
        }

        self.trees = trees;
        self.n_classes = n_classes;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        if self.trees.is_empty() {
            return Err(EvalError::NotFitted(self.name().to_string()));
        }
        check_n_features(self.name(), self.n_features, x)?;

        let mut votes = vec![vec![0usize; self.n_classes]; x.nrows()];
        for tree in &self.trees {
            let predicted: Array1<usize> = tree.predict(x);
            for (row_votes, &class) in votes.iter_mut().zip(predicted.iter()) {
                row_votes[class] += 1;
            }
        }
        Ok(votes.iter().map(|v| majority_vote(v)).collect())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(RandomForest::new(self.params.clone(), self.random_state))
    }

    fn name(&self) -> &str {
        "RandomForest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps() -> (Array2<f64>, Vec<usize>) {
        let x = Array2::from_shape_vec(
            (9, 1),
            vec![0.0, 0.5, 1.0, 4.0, 4.5, 5.0, 8.0, 8.5, 9.0],
        )
        .unwrap();
        (x, vec![0, 0, 0, 1, 1, 1, 2, 2, 2])
    }

    #[test]
    fn test_decision_tree_fits_training_rows() {
        let (x, y) = steps();
        let mut model = DecisionTreeClassifier::new(TreeParams::default());
        model.fit(&x, &y, 3).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_decision_tree_balanced_weights() {
        let x = Array2::from_shape_vec((5, 1), vec![0.0, 0.1, 0.2, 0.3, 5.0]).unwrap();
        let y = vec![0, 0, 0, 0, 1];
        let mut model = DecisionTreeClassifier::new(TreeParams {
            class_weight: Some(ClassWeight::Balanced),
            ..TreeParams::default()
        });
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_random_forest_separates_steps() {
        let (x, y) = steps();
        let mut model = RandomForest::new(
            ForestParams {
                n_estimators: 25,
                ..ForestParams::default()
            },
            42,
        );
        model.fit(&x, &y, 3).unwrap();
        let query = Array2::from_shape_vec((3, 1), vec![0.2, 4.6, 8.8]).unwrap();
        assert_eq!(model.predict(&query).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_random_forest_is_deterministic() {
        let (x, y) = steps();
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };
        let mut a = RandomForest::new(params.clone(), 7);
        let mut b = RandomForest::new(params, 7);
        a.fit(&x, &y, 3).unwrap();
        b.fit(&x, &y, 3).unwrap();
        let query = Array2::from_shape_vec((4, 1), vec![2.0, 2.5, 6.5, 7.0]).unwrap();
        assert_eq!(a.predict(&query).unwrap(), b.predict(&query).unwrap());
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let model = RandomForest::new(ForestParams::default(), 0);
        assert!(model.predict(&Array2::zeros((1, 1))).is_err());
    }
}
