use ndarray::Array2;

use crate::error::Result;

/// Contract between the evaluation pipeline and a classifier.
///
/// Labels are class indices in `0..n_classes`. A classifier is constructed
/// unfitted; the pipeline calls [`Classifier::fresh`] to get a new unfitted
/// copy for every cross-validation fold.
pub trait Classifier: Send + Sync {
    /// Fit the model on rows of `x` with labels `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()>;

    /// Predict a class index per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>>;

    /// An unfitted copy carrying the same hyper-parameters.
    fn fresh(&self) -> Box<dyn Classifier>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
