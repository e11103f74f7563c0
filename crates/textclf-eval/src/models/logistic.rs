use linfa::traits::{Fit, Predict};
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{
    check_fit_input, check_n_features, model_error, oversample_balanced, to_dataset, ClassWeight,
};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LogisticParams {
    /// Inverse L2 regularization strength.
    #[serde(alias = "C")]
    pub c: f64,
    pub max_iter: usize,
    /// Gradient norm at which the solver stops.
    pub tol: f64,
    pub class_weight: Option<ClassWeight>,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
            class_weight: None,
        }
    }
}

/// Multinomial logistic regression backed by `linfa-logistic`.
///
/// `linfa-logistic` takes no sample weights, so balanced class weights are
/// applied by repeating rows of the smaller classes.
pub struct LogisticRegression {
    params: LogisticParams,
    model: Option<MultiFittedLogisticRegression<f64, usize>>,
    n_features: usize,
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        LogisticRegression {
            params,
            model: None,
            n_features: 0,
        }
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        if self.params.c <= 0.0 {
            return Err(EvalError::InvalidInput(format!("C must be positive, got {}", self.params.c)));
        }

        let dataset = match self.params.class_weight {
            Some(ClassWeight::Balanced) => {
                let (xb, yb) = oversample_balanced(x, y, n_classes);
                to_dataset(&xb, &yb)
            }
            None => to_dataset(x, y),
        };

        let model = MultiLogisticRegression::default()
            .alpha(1.0 / self.params.c)
            .max_iterations(self.params.max_iter as u64)
            .gradient_tolerance(self.params.tol)
            .fit(&dataset)
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
        Box::new(LogisticRegression::new(self.params.clone()))
    }

    fn name(&self) -> &str {
        "LogisticRegression"
    }
}
