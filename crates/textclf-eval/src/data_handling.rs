//! The dataset evaluated by the cross-validation loop.
//!
//! A `Dataset` holds one free-text column, zero or more numeric columns and
//! a label per row. It is read-only to the evaluation loop; fold subsets are
//! copies made with [`Dataset::select_rows`].
use std::cmp::Ordering;
use std::collections::BTreeMap;

use ndarray::{Array2, Axis};

use crate::error::{EvalError, Result};

#[derive(Debug, Clone)]
pub struct Dataset {
    text: Vec<String>,
    numeric: Array2<f64>,
    numeric_names: Vec<String>,
    labels: Vec<String>,
}

impl Dataset {
    pub fn new(
        text: Vec<String>,
        numeric: Array2<f64>,
        numeric_names: Vec<String>,
        labels: Vec<String>,
    ) -> Result<Self> {
        if text.len() != labels.len() {
            return Err(EvalError::LengthMismatch {
                features: text.len(),
                labels: labels.len(),
            });
        }
        if numeric.nrows() != labels.len() {
            return Err(EvalError::LengthMismatch {
                features: numeric.nrows(),
                labels: labels.len(),
            });
        }
        if numeric_names.len() != numeric.ncols() {
            return Err(EvalError::InvalidInput(format!(
                "{} numeric column names given for {} columns",
                numeric_names.len(),
                numeric.ncols()
            )));
        }
        Ok(Dataset {
            text,
            numeric,
            numeric_names,
            labels,
        })
    }

    /// A dataset with a text column and no numeric columns.
    pub fn from_text(text: Vec<String>, labels: Vec<String>) -> Result<Self> {
        let rows = text.len();
        Self::new(text, Array2::zeros((rows, 0)), Vec::new(), labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn text(&self) -> &[String] {
        &self.text
    }

    pub fn numeric(&self) -> &Array2<f64> {
        &self.numeric
    }

    pub fn numeric_names(&self) -> &[String] {
        &self.numeric_names
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Sorted unique labels. Labels that all parse as numbers sort
    /// numerically, otherwise lexicographically.
    pub fn classes(&self) -> Vec<String> {
        let mut classes = self.labels.clone();
        classes.sort_by(compare_labels);
        classes.dedup();
        classes
    }

    /// Class index of every row, against [`Dataset::classes`].
    pub fn encoded_labels(&self) -> Vec<usize> {
        let classes = self.classes();
        let index: BTreeMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        self.labels.iter().map(|l| index[l.as_str()]).collect()
    }

    /// Number of rows per class, in class order.
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        self.classes()
            .into_iter()
            .map(|c| {
                let count = self.labels.iter().filter(|l| **l == c).count();
                (c, count)
            })
            .collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            text: indices.iter().map(|&i| self.text[i].clone()).collect(),
            numeric: self.numeric.select(Axis(0), indices),
            numeric_names: self.numeric_names.clone(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }

    /// Same rows, with the numeric block replaced.
    pub fn with_numeric(&self, numeric: Array2<f64>, numeric_names: Vec<String>) -> Result<Dataset> {
        Dataset::new(self.text.clone(), numeric, numeric_names, self.labels.clone())
    }

    pub fn log_input_data_summary(&self) {
        log::info!(
            "{} rows, {} numeric column(s): {:?}",
            self.len(),
            self.numeric.ncols(),
            self.numeric_names
        );
        for (class, count) in self.class_counts() {
            log::info!("  class '{}': {} rows", class, count);
        }
    }
}

fn compare_labels(a: &String, b: &String) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_length_mismatch() {
        let result = Dataset::from_text(strings(&["a", "b"]), strings(&["x"]));
        assert!(matches!(
            result,
            Err(EvalError::LengthMismatch { features: 2, labels: 1 })
        ));
    }

    #[test]
    fn test_numeric_classes_sort_numerically() {
        let data = Dataset::from_text(strings(&["a", "b", "c"]), strings(&["10", "2", "2"])).unwrap();
        assert_eq!(data.classes(), strings(&["2", "10"]));
        assert_eq!(data.encoded_labels(), vec![1, 0, 0]);
    }

    #[test]
    fn test_select_rows_keeps_columns() {
        let numeric = Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 3.0]).unwrap();
        let data = Dataset::new(
            strings(&["a", "b", "c"]),
            numeric,
            strings(&["n"]),
            strings(&["x", "y", "x"]),
        )
        .unwrap();
        let subset = data.select_rows(&[2, 0]);
        assert_eq!(subset.text(), &strings(&["c", "a"])[..]);
        assert_eq!(subset.numeric()[[0, 0]], 3.0);
        assert_eq!(subset.numeric_names(), &strings(&["n"])[..]);
        assert_eq!(subset.class_counts(), vec![("x".to_string(), 2)]);
    }
}
