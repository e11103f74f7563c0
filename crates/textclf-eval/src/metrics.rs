//! Classification scores over class-index predictions.
//!
//! Macro averages run over the classes that occur in either `y_true` or
//! `y_pred`; a class with an empty denominator scores 0.
use std::fmt;

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::error::{EvalError, Result};

/// Counts of (true class, predicted class) pairs. Rows are true classes,
/// columns predicted classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(EvalError::LengthMismatch {
                features: y_pred.len(),
                labels: y_true.len(),
            });
        }
        let mut counts = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if t >= n_classes || p >= n_classes {
                return Err(EvalError::InvalidInput(format!(
                    "Class index ({}, {}) outside 0..{}",
                    t, p, n_classes
                )));
            }
            counts[t][p] += 1;
        }
        Ok(Self { counts })
    }

    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, true_class: usize, predicted: usize) -> usize {
        self.counts[true_class][predicted]
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    fn true_positives(&self, class: usize) -> usize {
        self.counts[class][class]
    }

    /// Row sum: rows whose true class is `class`.
    fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Column sum: rows predicted as `class`.
    fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    fn active_classes(&self) -> Vec<usize> {
        (0..self.n_classes())
            .filter(|&c| self.support(c) > 0 || self.predicted(c) > 0)
            .collect()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes()).map(|c| self.true_positives(c)).sum();
        correct as f64 / total as f64
    }

    fn precision(&self, class: usize) -> f64 {
        ratio(self.true_positives(class), self.predicted(class))
    }

    fn recall(&self, class: usize) -> f64 {
        ratio(self.true_positives(class), self.support(class))
    }

    fn f1(&self, class: usize) -> f64 {
        // 2TP / (2TP + FP + FN), which is 0 rather than NaN when TP is 0
        let tp = self.true_positives(class);
        ratio(2 * tp, self.predicted(class) + self.support(class))
    }

    fn macro_average(&self, per_class: impl Fn(usize) -> f64) -> f64 {
        let classes = self.active_classes();
        if classes.is_empty() {
            return 0.0;
        }
        classes.iter().map(|&c| per_class(c)).sum::<f64>() / classes.len() as f64
    }

    pub fn precision_macro(&self) -> f64 {
        self.macro_average(|c| self.precision(c))
    }

    pub fn recall_macro(&self) -> f64 {
        self.macro_average(|c| self.recall(c))
    }

    pub fn f1_macro(&self) -> f64 {
        self.macro_average(|c| self.f1(c))
    }

    pub fn score(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy(),
            Metric::PrecisionMacro => self.precision_macro(),
            Metric::RecallMacro => self.recall_macro(),
            Metric::F1Macro => self.f1_macro(),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn confusion(y_true: &[usize], y_pred: &[usize]) -> Result<ConfusionMatrix> {
    let n_classes = y_true.iter().chain(y_pred.iter()).max().map_or(0, |&m| m + 1);
    ConfusionMatrix::new(y_true, y_pred, n_classes)
}

pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    Ok(confusion(y_true, y_pred)?.accuracy())
}

pub fn precision_macro(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    Ok(confusion(y_true, y_pred)?.precision_macro())
}

pub fn recall_macro(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    Ok(confusion(y_true, y_pred)?.recall_macro())
}

pub fn f1_macro(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    Ok(confusion(y_true, y_pred)?.f1_macro())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    Accuracy,
    PrecisionMacro,
    RecallMacro,
    F1Macro,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Accuracy,
        Metric::PrecisionMacro,
        Metric::RecallMacro,
        Metric::F1Macro,
    ];

    /// Column label in the ranking table.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Accuracy => "Accuracy",
            Metric::PrecisionMacro => "Precision",
            Metric::RecallMacro => "Recall",
            Metric::F1Macro => "F1",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mean and population standard deviation of per-fold scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
}

impl MetricSummary {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self { mean: 0.0, std: 0.0 };
        }
        Self {
            mean: scores.iter().mean(),
            std: scores.iter().population_std_dev(),
        }
    }

    /// Both values rounded to three decimals, for display.
    pub fn rounded(&self) -> Self {
        Self {
            mean: round3(self.mean),
            std: round3(self.std),
        }
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_predicted_class_scores_zero() {
        // balanced binary, always predicts class 0
        let y_true = [0, 0, 1, 1];
        let y_pred = [0, 0, 0, 0];
        assert!((accuracy(&y_true, &y_pred).unwrap() - 0.5).abs() < 1e-12);
        // class 0: p=0.5 r=1 f1=2/3; class 1: all zero
        assert!((f1_macro(&y_true, &y_pred).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((precision_macro(&y_true, &y_pred).unwrap() - 0.25).abs() < 1e-12);
        assert!((recall_macro(&y_true, &y_pred).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_absent_classes_are_not_averaged() {
        let cm = ConfusionMatrix::new(&[0, 0], &[0, 0], 3).unwrap();
        assert_eq!(cm.f1_macro(), 1.0);
        assert_eq!(cm.get(0, 0), 2);
        assert_eq!(cm.total(), 2);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let cm = ConfusionMatrix::new(&[0, 1, 1, 2], &[0, 2, 1, 2], 3).unwrap();
        assert_eq!(cm.rows(), &[vec![1, 0, 0], vec![0, 1, 1], vec![0, 0, 1]]);
    }

    #[test]
    fn test_summary_population_std() {
        let summary = MetricSummary::from_scores(&[1.0, 2.0, 3.0, 4.0]);
        assert!((summary.mean - 2.5).abs() < 1e-12);
        assert!((summary.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.rounded().std, 1.118);
    }
}
