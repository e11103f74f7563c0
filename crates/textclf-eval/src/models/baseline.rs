use ndarray::Array2;

use crate::error::{EvalError, Result};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{check_fit_input, class_counts};

/// Predicts the most frequent training class for every row (lowest class
/// index on ties). Useful as a floor when comparing models.
#[derive(Debug, Clone, Default)]
pub struct MajorityClass {
    majority: Option<usize>,
}

impl MajorityClass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for MajorityClass {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        let counts = class_counts(y, n_classes);
        let mut best = 0;
        for (class, &count) in counts.iter().enumerate() {
            if count > counts[best] {
                best = class;
            }
        }
        self.majority = Some(best);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        match self.majority {
            Some(class) => Ok(vec![class; x.nrows()]),
            None => Err(EvalError::NotFitted(self.name().to_string())),
        }
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(MajorityClass::new())
    }

    fn name(&self) -> &str {
        "MajorityClass"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_ties_go_low() {
        let x = Array2::<f64>::zeros((4, 1));
        let mut model = MajorityClass::new();
        model.fit(&x, &[1, 0, 1, 0], 2).unwrap();
        assert_eq!(model.predict(&x).unwrap(), vec![0; 4]);

        model.fit(&x, &[1, 1, 1, 0], 2).unwrap();
        assert_eq!(model.predict(&x).unwrap(), vec![1; 4]);
    }
}
