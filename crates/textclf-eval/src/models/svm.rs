use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{check_fit_input, check_n_features, class_counts, model_error, ClassWeight};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LinearSvcParams {
    #[serde(alias = "C")]
    pub c: f64,
    /// Stopping tolerance of the SMO solver.
    pub eps: f64,
    pub class_weight: Option<ClassWeight>,
}

impl Default for LinearSvcParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            eps: 1e-3,
            class_weight: None,
        }
    }
}

/// Linear-kernel SVM from `linfa-svm`, one-vs-rest over the classes seen
/// in training.
///
/// Each binary machine outputs a probability-like score (`Pr`). A two-class
/// problem fits one machine for class 1 and thresholds it at 0.5; otherwise
/// the class with the highest score wins.
pub struct LinearSvc {
    params: LinearSvcParams,
    /// (class, machine) per one-vs-rest model.
    machines: Vec<(usize, Svm<f64, Pr>)>,
    binary: bool,
    n_features: usize,
}

impl LinearSvc {
    pub fn new(params: LinearSvcParams) -> Self {
        LinearSvc {
            params,
            machines: Vec::new(),
            binary: false,
            n_features: 0,
        }
    }

    fn machine_params(&self, n_pos: usize, n_neg: usize) -> SvmParams<f64, Pr> {
        let c = self.params.c;
        let (c_pos, c_neg) = match self.params.class_weight {
            Some(ClassWeight::Balanced) => {
                let n = (n_pos + n_neg) as f64;
                (c * n / (2.0 * n_pos as f64), c * n / (2.0 * n_neg as f64))
            }
            None => (c, c),
        };
        Svm::<f64, Pr>::params()
            .eps(self.params.eps)
            .pos_neg_weights(c_pos, c_neg)
            .linear_kernel()
    }

    fn scores(machine: &Svm<f64, Pr>, x: &Array2<f64>) -> Array1<f32> {
        let probs: Array1<Pr> = machine.predict(x);
        probs.mapv(|p| *p)
    }
}

impl Classifier for LinearSvc {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        let counts = class_counts(y, n_classes);
        let present: Vec<usize> = (0..n_classes).filter(|&c| counts[c] > 0).collect();
        if present.len() < 2 {
            return Err(EvalError::InvalidInput(format!(
                "{} needs at least two classes in training data",
                self.name()
            )));
        }

        self.binary = n_classes == 2;
        let targets: Vec<usize> = if self.binary { vec![1] } else { present };

        let mut machines = Vec::with_capacity(targets.len());
        for class in targets {
            let labels: Array1<bool> = y.iter().map(|&c| c == class).collect();
            let n_pos = counts[class];
            let dataset = Dataset::new(x.clone(), labels);
            let machine = self
                .machine_params(n_pos, y.len() - n_pos)
                .fit(&dataset)
                .map_err(|e| model_error(self.name(), e))?;
            machines.push((class, machine));
        }

        self.machines = machines;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        if self.machines.is_empty() {
            return Err(EvalError::NotFitted(self.name().to_string()));
        }
        check_n_features(self.name(), self.n_features, x)?;

        if self.binary {
            let scores = Self::scores(&self.machines[0].1, x);
            return Ok(scores.iter().map(|&s| usize::from(s > 0.5)).collect());
        }

        let mut best = vec![(0usize, f32::NEG_INFINITY); x.nrows()];
        for (class, machine) in &self.machines {
            for (slot, &s) in best.iter_mut().zip(Self::scores(machine, x).iter()) {
                if s > slot.1 {
                    *slot = (*class, s);
                }
            }
        }
        Ok(best.into_iter().map(|(class, _)| class).collect())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(LinearSvc::new(self.params.clone()))
    }

    fn name(&self) -> &str {
        "LinearSvc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Array2<f64>, Vec<usize>) {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                2.0, 2.0, 1.5, 2.5, 2.5, 1.5, 3.0, 3.0, //
                -2.0, -2.0, -1.5, -2.5, -2.5, -1.5, -3.0, -3.0,
            ],
        )
        .unwrap();
        (x, vec![1, 1, 1, 1, 0, 0, 0, 0])
    }

    #[test]
    fn test_linear_svc_separable() {
        let (x, y) = blobs();
        let mut model = LinearSvc::new(LinearSvcParams::default());
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_linear_svc_balanced_separable() {
        let (x, y) = blobs();
        let mut model = LinearSvc::new(LinearSvcParams {
            class_weight: Some(ClassWeight::Balanced),
            ..LinearSvcParams::default()
        });
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_linear_svc_rejects_single_class() {
        let x = Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap();
        let mut model = LinearSvc::new(LinearSvcParams::default());
        assert!(model.fit(&x, &[1, 1], 2).is_err());
    }

    #[test]
    fn test_linear_svc_feature_mismatch() {
        let (x, y) = blobs();
        let mut model = LinearSvc::new(LinearSvcParams::default());
        model.fit(&x, &y, 2).unwrap();
        assert!(model.predict(&Array2::zeros((1, 3))).is_err());
    }
}
