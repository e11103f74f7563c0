//! Derived-feature steps applied before vectorization.
use std::collections::HashSet;

use ndarray::{concatenate, Array2, Axis};

use crate::data_handling::Dataset;
use crate::error::{EvalError, Result};
use crate::features::vectorizer::tokenize;

/// Adds derived columns to a dataset. Fit on the training fold, then applied
/// to both folds.
pub trait FeatureAugmenter: Send + Sync {
    fn fit(&mut self, data: &Dataset) -> Result<()>;

    fn transform(&self, data: &Dataset) -> Result<Dataset>;

    /// An unfitted copy carrying the same parameters.
    fn fresh(&self) -> Box<dyn FeatureAugmenter>;
}

/// Counts lexicon keywords in the text column.
///
/// Appends `keyword_count` (number of tokens found in the lexicon) and
/// `keyword_ratio` (that count over the token count, 0 for empty text).
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    keywords: HashSet<String>,
}

impl KeywordExtractor {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    fn score(&self, text: &str) -> (f64, f64) {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return (0.0, 0.0);
        }
        let hits = tokens.iter().filter(|t| self.keywords.contains(*t)).count() as f64;
        (hits, hits / tokens.len() as f64)
    }
}

impl FeatureAugmenter for KeywordExtractor {
    fn fit(&mut self, _data: &Dataset) -> Result<()> {
        Ok(())
    }

    fn transform(&self, data: &Dataset) -> Result<Dataset> {
        let mut derived = Array2::<f64>::zeros((data.len(), 2));
        for (row, text) in data.text().iter().enumerate() {
            let (count, ratio) = self.score(text);
            derived[[row, 0]] = count;
            derived[[row, 1]] = ratio;
        }

        let numeric = concatenate(Axis(1), &[data.numeric().view(), derived.view()])
            .map_err(|e| EvalError::InvalidInput(e.to_string()))?;
        let mut names = data.numeric_names().to_vec();
        names.push("keyword_count".to_string());
        names.push("keyword_ratio".to_string());

        data.with_numeric(numeric, names)
    }

    fn fresh(&self) -> Box<dyn FeatureAugmenter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_columns_appended() {
        let data = Dataset::from_text(
            vec!["Quantum physics lab".to_string(), "".to_string()],
            vec!["science".to_string(), "other".to_string()],
        )
        .unwrap();
        let extractor = KeywordExtractor::new(["physics", "Quantum"]);
        let augmented = extractor.transform(&data).unwrap();

        assert_eq!(augmented.numeric_names(), &["keyword_count", "keyword_ratio"]);
        assert_eq!(augmented.numeric()[[0, 0]], 2.0);
        assert!((augmented.numeric()[[0, 1]] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(augmented.numeric()[[1, 0]], 0.0);
        assert_eq!(augmented.numeric()[[1, 1]], 0.0);
    }
}
