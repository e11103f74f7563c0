use linfa::traits::{Fit, Predict};
use linfa_bayes::MultinomialNb;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{check_fit_input, check_n_features, model_error, to_dataset};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NaiveBayesParams {
    /// Additive (Laplace/Lidstone) smoothing.
    pub alpha: f64,
}

impl Default for NaiveBayesParams {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// Multinomial naive Bayes over count-like features (`linfa-bayes`).
///
/// Features must be non-negative, which is why this model is fed unscaled
/// numeric columns.
pub struct MultinomialNaiveBayes {
    params: NaiveBayesParams,
    model: Option<MultinomialNb<f64, usize>>,
    n_features: usize,
}

impl MultinomialNaiveBayes {
    pub fn new(params: NaiveBayesParams) -> Self {
        MultinomialNaiveBayes {
            params,
            model: None,
            n_features: 0,
        }
    }
}

impl Classifier for MultinomialNaiveBayes {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        if x.iter().any(|&v| v < 0.0) {
            return Err(EvalError::NegativeFeatures(self.name().to_string()));
        }

        let model = MultinomialNb::<f64, usize>::params()
            .alpha(self.params.alpha)
            .fit(&to_dataset(x, y))
            .map_err(|e| model_error(self.name(), e))?;

        self.model = Some(model);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let Some(model) = &self.model else {
            return Err(EvalError::NotFitted(self.name().to_string()));
        };
        check_n_features(self.name(), self.n_features, x)?;
        let predicted: Array1<usize> = model.predict(x);
        Ok(predicted.to_vec())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(MultinomialNaiveBayes::new(self.params.clone()))
    }

    fn name(&self) -> &str {
        "MultinomialNaiveBayes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_bayes_word_counts() {
        // columns: "ball", "goal", "vote", "law"
        let x = Array2::from_shape_vec(
            (4, 4),
            vec![
                3.0, 2.0, 0.0, 0.0, //
                2.0, 3.0, 0.0, 1.0, //
                0.0, 0.0, 3.0, 2.0, //
                0.0, 1.0, 2.0, 3.0,
            ],
        )
        .unwrap();
        let y = vec![0, 0, 1, 1];
        let mut model = MultinomialNaiveBayes::new(NaiveBayesParams::default());
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_negative_features_rejected() {
        let x = Array2::from_shape_vec((2, 1), vec![-1.0, 1.0]).unwrap();
        let mut model = MultinomialNaiveBayes::new(NaiveBayesParams::default());
        let err = model.fit(&x, &[0, 1], 2).unwrap_err();
        assert!(matches!(err, EvalError::NegativeFeatures(_)));
    }
}
