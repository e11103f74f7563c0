//! One feature pipeline per (classifier, vectorizer) pair.
//!
//! `augment -> vectorize text -> scale numeric -> [text | numeric] -> classify`
use ndarray::{concatenate, Array2, Axis};

use crate::data_handling::Dataset;
use crate::error::{EvalError, Result};
use crate::features::{FeatureAugmenter, TextVectorizer};
use crate::models::Classifier;
use crate::preprocessing::{fit_scaler, transform_all, Scaler};

pub struct FeaturePipeline {
    augmenter: Option<Box<dyn FeatureAugmenter>>,
    vectorizer: Box<dyn TextVectorizer>,
    classifier: Box<dyn Classifier>,
    scale_numeric: bool,
    scaler: Option<Scaler>,
    n_classes: usize,
}

impl FeaturePipeline {
    pub fn new(
        augmenter: Option<Box<dyn FeatureAugmenter>>,
        vectorizer: Box<dyn TextVectorizer>,
        classifier: Box<dyn Classifier>,
        scale_numeric: bool,
    ) -> Self {
        FeaturePipeline {
            augmenter,
            vectorizer,
            classifier,
            scale_numeric,
            scaler: None,
            n_classes: 0,
        }
    }

    /// Unfitted copy of every stage.
    pub fn fresh(&self) -> FeaturePipeline {
        FeaturePipeline::new(
            self.augmenter.as_ref().map(|a| a.fresh()),
            self.vectorizer.fresh(),
            self.classifier.fresh(),
            self.scale_numeric,
        )
    }

    pub fn scales_numeric(&self) -> bool {
        self.scale_numeric
    }

    /// Fit every stage on `data`, with `y` the class index of each row.
    pub fn fit(&mut self, data: &Dataset, y: &[usize], n_classes: usize) -> Result<()> {
        if data.len() != y.len() {
            return Err(EvalError::LengthMismatch {
                features: data.len(),
                labels: y.len(),
            });
        }
        let augmented = match self.augmenter.as_mut() {
            Some(augmenter) => {
                augmenter.fit(data)?;
                augmenter.transform(data)?
            }
            None => data.clone(),
        };

        let text = self.vectorizer.fit_transform(augmented.text())?;
        let numeric = if self.scale_numeric {
            let scaler = fit_scaler(augmented.numeric())?;
            let scaled = transform_all(augmented.numeric(), &scaler)?;
            self.scaler = Some(scaler);
            scaled
        } else {
            augmented.numeric().clone()
        };

        let x = hstack(&text, &numeric)?;
        log::trace!("Fitting {} on {:?} features", self.classifier.name(), x.dim());
        self.classifier.fit(&x, y, n_classes)?;
        self.n_classes = n_classes;
        Ok(())
    }

    pub fn predict(&self, data: &Dataset) -> Result<Vec<usize>> {
        if self.n_classes == 0 {
            return Err(EvalError::NotFitted("FeaturePipeline".to_string()));
        }
        let augmented = match self.augmenter.as_ref() {
            Some(augmenter) => augmenter.transform(data)?,
            None => data.clone(),
        };

        let text = self.vectorizer.transform(augmented.text())?;
        let numeric = match &self.scaler {
            Some(scaler) => transform_all(augmented.numeric(), scaler)?,
            None => augmented.numeric().clone(),
        };
        self.classifier.predict(&hstack(&text, &numeric)?)
    }
}

fn hstack(text: &Array2<f64>, numeric: &Array2<f64>) -> Result<Array2<f64>> {
    concatenate(Axis(1), &[text.view(), numeric.view()]).map_err(|e| EvalError::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VectorizerConfig, VectorizerKind};
    use crate::models::naive_bayes::{MultinomialNaiveBayes, NaiveBayesParams};

    fn sports_politics() -> (Dataset, Vec<usize>) {
        let text = vec![
            "the match ended with a late goal",
            "the striker scored a goal in the match",
            "parliament passed the budget vote",
            "the senate vote on the new law",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let numeric = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let labels = vec!["sport", "sport", "politics", "politics"]
            .into_iter()
            .map(String::from)
            .collect();
        let data = Dataset::new(text, numeric, vec!["length".to_string()], labels).unwrap();
        let y = data.encoded_labels();
        (data, y)
    }

    #[test]
    fn test_unscaled_naive_bayes_pipeline() {
        let (data, y) = sports_politics();
        let vectorizer = VectorizerConfig::default().build(VectorizerKind::BagOfWords).unwrap();
        let classifier = Box::new(MultinomialNaiveBayes::new(NaiveBayesParams::default()));
        let mut pipeline = FeaturePipeline::new(None, vectorizer, classifier, false);

        pipeline.fit(&data, &y, 2).unwrap();
        assert_eq!(pipeline.predict(&data).unwrap(), y);
    }

    #[test]
    fn test_scaled_naive_bayes_rejects_negatives() {
        let (data, y) = sports_politics();
        let vectorizer = VectorizerConfig::default().build(VectorizerKind::BagOfWords).unwrap();
        let classifier = Box::new(MultinomialNaiveBayes::new(NaiveBayesParams::default()));
        let mut pipeline = FeaturePipeline::new(None, vectorizer, classifier, true);

        let err = pipeline.fit(&data, &y, 2).unwrap_err();
        assert!(matches!(err, EvalError::NegativeFeatures(_)));
    }

    #[test]
    fn test_predict_before_fit() {
        let (data, _) = sports_politics();
        let vectorizer = VectorizerConfig::default().build(VectorizerKind::TfIdf).unwrap();
        let classifier = Box::new(MultinomialNaiveBayes::new(NaiveBayesParams::default()));
        let pipeline = FeaturePipeline::new(None, vectorizer, classifier, true);
        assert!(pipeline.predict(&data).is_err());
    }
}
