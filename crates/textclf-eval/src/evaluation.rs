//! Cross-validated comparison of every (classifier, vectorizer) pair.
//!
//! Classifiers form the outer loop and vectorizers the inner loop, both in
//! insertion order. Each pair gets its own [`FeaturePipeline`]; all pairs
//! share one set of stratified folds. The first failing pair aborts the
//! whole evaluation.
use std::collections::HashSet;

use serde::Serialize;

use crate::config::{StepConfig, VectorizerKind};
use crate::cross_validation::{cross_val_predict_and_score, StratifiedKFold};
use crate::data_handling::Dataset;
use crate::error::{EvalError, Result};
use crate::features::{FeatureAugmenter, TextVectorizer};
use crate::metrics::{round3, ConfusionMatrix, Metric, MetricSummary};
use crate::models::factory::default_classifiers;
use crate::models::Classifier;
use crate::pipeline::FeaturePipeline;
use crate::report::plots::{plot_confusion_matrix, ConfusionGrid};

/// Panels per row in the confusion-matrix grid.
const GRID_COLUMNS: usize = 3;

/// A display name bound to an unfitted classifier.
pub struct ClassifierSpec {
    pub name: String,
    pub classifier: Box<dyn Classifier>,
}

impl ClassifierSpec {
    pub fn new(name: impl Into<String>, classifier: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            classifier,
        }
    }
}

/// A display name bound to an unfitted text vectorizer.
pub struct VectorizerSpec {
    pub name: String,
    pub vectorizer: Box<dyn TextVectorizer>,
}

impl VectorizerSpec {
    pub fn new(name: impl Into<String>, vectorizer: Box<dyn TextVectorizer>) -> Self {
        Self {
            name: name.into(),
            vectorizer,
        }
    }
}

/// TF-IDF and bag-of-words built from a step's default parameters.
pub fn default_vectorizers(config: &StepConfig) -> Result<Vec<VectorizerSpec>> {
    Ok(vec![
        VectorizerSpec::new(VectorizerKind::TfIdf.display_name(), config.default_tf_idf()?),
        VectorizerSpec::new(VectorizerKind::BagOfWords.display_name(), config.default_bow()?),
    ])
}

fn check_unique<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(EvalError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    pub n_splits: usize,
    pub shuffle: bool,
    pub random_state: u64,
    /// Classifiers (by display name) whose numeric columns are passed
    /// through unscaled.
    pub unscaled: Vec<String>,
    /// Scores to report. F1 is always computed.
    pub metrics: Vec<Metric>,
    /// Log a status line per pair and build the confusion-matrix grid.
    pub verbose: bool,
    /// Axis labels for the confusion matrices, in class order. Defaults to
    /// the dataset's class names.
    pub tick_labels: Option<Vec<String>>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle: false,
            random_state: 42,
            unscaled: vec!["Naive Bayes".to_string()],
            metrics: Metric::ALL.to_vec(),
            verbose: true,
            tick_labels: None,
        }
    }
}

/// Scores of one (classifier, vectorizer) pair.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub classifier: String,
    pub vectorizer: String,
    /// Built from the out-of-fold predictions over the whole dataset.
    pub confusion: ConfusionMatrix,
    pub f1: MetricSummary,
    /// Summaries of the requested metrics other than F1, in request order.
    pub scores: Vec<(Metric, MetricSummary)>,
}

impl EvaluationResult {
    pub fn summary(&self, metric: Metric) -> Option<MetricSummary> {
        if metric == Metric::F1Macro {
            return Some(self.f1);
        }
        self.scores.iter().find(|(m, _)| *m == metric).map(|(_, s)| *s)
    }
}

/// A row of the ranking table, values rounded to three decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub classifier: String,
    pub vectorizer: String,
    pub f1_mean: f64,
    pub f1_std: f64,
    pub scores: Vec<(Metric, MetricSummary)>,
}

pub struct EvaluationOutcome {
    /// One record per pair, in evaluation order.
    pub results: Vec<EvaluationResult>,
    /// Same records sorted by mean F1, best first.
    pub ranking: Vec<RankedResult>,
    /// Confusion-matrix panels, present when running verbose.
    pub figure: Option<ConfusionGrid>,
}

/// Stable sort by mean F1, descending, then round for display. Pairs with
/// equal F1 keep their evaluation order.
pub fn rank(results: &[EvaluationResult]) -> Vec<RankedResult> {
    let mut sorted: Vec<&EvaluationResult> = results.iter().collect();
    sorted.sort_by(|a, b| b.f1.mean.total_cmp(&a.f1.mean));
    sorted
        .into_iter()
        .map(|r| RankedResult {
            classifier: r.classifier.clone(),
            vectorizer: r.vectorizer.clone(),
            f1_mean: round3(r.f1.mean),
            f1_std: round3(r.f1.std),
            scores: r.scores.iter().map(|(m, s)| (*m, s.rounded())).collect(),
        })
        .collect()
}

/// Render the ranking as a markdown table.
pub fn render_ranking_table(ranking: &[RankedResult]) -> String {
    let extra: Vec<Metric> = ranking
        .first()
        .map(|r| r.scores.iter().map(|(m, _)| *m).collect())
        .unwrap_or_default();

    let mut header = String::from("| Classifier | Vectorizer | F1 Mean | F1 Std |");
    let mut rule = String::from("|---|---|---:|---:|");
    for metric in &extra {
        header.push_str(&format!(" {0} Mean | {0} Std |", metric));
        rule.push_str("---:|---:|");
    }

    let mut table = format!("{}\n{}\n", header, rule);
    for row in ranking {
        table.push_str(&format!(
            "| {} | {} | {:.3} | {:.3} |",
            row.classifier, row.vectorizer, row.f1_mean, row.f1_std
        ));
        for metric in &extra {
            match row.scores.iter().find(|(m, _)| m == metric) {
                Some((_, s)) => table.push_str(&format!(" {:.3} | {:.3} |", s.mean, s.std)),
                None => table.push_str(" | |"),
            }
        }
        table.push('\n');
    }
    table
}

/// Evaluates a fixed grid of classifiers and vectorizers on one dataset.
pub struct ClassifierEvaluation {
    data: Dataset,
    classifiers: Vec<ClassifierSpec>,
    vectorizers: Vec<VectorizerSpec>,
    augmenter: Option<Box<dyn FeatureAugmenter>>,
    options: EvaluationOptions,
}

impl ClassifierEvaluation {
    pub fn new(
        data: Dataset,
        classifiers: Vec<ClassifierSpec>,
        vectorizers: Vec<VectorizerSpec>,
        augmenter: Option<Box<dyn FeatureAugmenter>>,
        options: EvaluationOptions,
    ) -> Result<Self> {
        check_unique(classifiers.iter().map(|c| c.name.as_str()))?;
        check_unique(vectorizers.iter().map(|v| v.name.as_str()))?;
        if data.is_empty() {
            return Err(EvalError::InvalidInput("Cannot evaluate an empty dataset".to_string()));
        }
        Ok(Self {
            data,
            classifiers,
            vectorizers,
            augmenter,
            options,
        })
    }

    /// The default classifier grid against the step's TF-IDF and
    /// bag-of-words vectorizers, seeded from the step's random state.
    pub fn with_defaults(
        data: Dataset,
        config: &StepConfig,
        augmenter: Option<Box<dyn FeatureAugmenter>>,
        options: EvaluationOptions,
    ) -> Result<Self> {
        let options = EvaluationOptions {
            random_state: config.random_state(),
            ..options
        };
        let classifiers = default_classifiers(options.random_state);
        Self::new(data, classifiers, default_vectorizers(config)?, augmenter, options)
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn evaluate(&self) -> Result<EvaluationOutcome> {
        let classes = self.data.classes();
        let n_classes = classes.len();
        let y = self.data.encoded_labels();

        let tick_labels = match &self.options.tick_labels {
            Some(labels) if labels.len() != n_classes => {
                return Err(EvalError::InvalidInput(format!(
                    "{} tick labels given for {} classes",
                    labels.len(),
                    n_classes
                )));
            }
            Some(labels) => labels.clone(),
            None => classes.clone(),
        };

        let folds = StratifiedKFold::new(self.options.n_splits, self.options.shuffle, self.options.random_state)
            .split(&y, n_classes)?;

        let mut metrics = vec![Metric::F1Macro];
        metrics.extend(self.options.metrics.iter().copied().filter(|m| *m != Metric::F1Macro));

        let mut figure = self.options.verbose.then(|| ConfusionGrid::new(GRID_COLUMNS));
        let mut results = Vec::with_capacity(self.classifiers.len() * self.vectorizers.len());

        for clf in &self.classifiers {
            let scale_numeric = !self.options.unscaled.contains(&clf.name);
            for vect in &self.vectorizers {
                if self.options.verbose {
                    log::info!("Evaluating {} with {}", clf.name, vect.name);
                }
                let pipeline = FeaturePipeline::new(
                    self.augmenter.as_ref().map(|a| a.fresh()),
                    vect.vectorizer.fresh(),
                    clf.classifier.fresh(),
                    scale_numeric,
                );
                let cv = cross_val_predict_and_score(&pipeline, &self.data, &y, n_classes, &folds, &metrics)?;
                let confusion = ConfusionMatrix::new(&y, &cv.predictions, n_classes)?;

                if let Some(grid) = figure.as_mut() {
                    let title = format!("{} + {}", clf.name, vect.name);
                    grid.push(plot_confusion_matrix(&confusion, &tick_labels, &title)?);
                }

                let mut summaries = cv
                    .fold_scores
                    .iter()
                    .map(|(m, scores)| (*m, MetricSummary::from_scores(scores)));
                let f1 = summaries
                    .next()
                    .map(|(_, s)| s)
                    .unwrap_or(MetricSummary { mean: 0.0, std: 0.0 });
                log::debug!("{} + {}: F1 {:.3} ± {:.3}", clf.name, vect.name, f1.mean, f1.std);

                results.push(EvaluationResult {
                    classifier: clf.name.clone(),
                    vectorizer: vect.name.clone(),
                    confusion,
                    f1,
                    scores: summaries.collect(),
                });
            }
        }

        let ranking = rank(&results);
        Ok(EvaluationOutcome {
            results,
            ranking,
            figure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::baseline::MajorityClass;

    fn result(name: &str, f1: f64) -> EvaluationResult {
        EvaluationResult {
            classifier: name.to_string(),
            vectorizer: "TF-IDF".to_string(),
            confusion: ConfusionMatrix::new(&[], &[], 2).unwrap(),
            f1: MetricSummary { mean: f1, std: 0.01234 },
            scores: vec![],
        }
    }

    #[test]
    fn test_rank_is_stable_and_rounded() {
        let results = vec![result("a", 0.5), result("b", 0.9), result("c", 0.5), result("d", 0.91234)];
        let names: Vec<String> = rank(&results).into_iter().map(|r| r.classifier).collect();
        assert_eq!(names, vec!["d", "b", "a", "c"]);

        let top = &rank(&results)[0];
        assert_eq!(top.f1_mean, 0.912);
        assert_eq!(top.f1_std, 0.012);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let data = Dataset::from_text(vec!["a".into(), "b".into()], vec!["x".into(), "y".into()]).unwrap();
        let classifiers = vec![
            ClassifierSpec::new("Majority", Box::new(MajorityClass::new())),
            ClassifierSpec::new("Majority", Box::new(MajorityClass::new())),
        ];
        let err = ClassifierEvaluation::new(data, classifiers, vec![], None, EvaluationOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, EvalError::DuplicateName(name) if name == "Majority"));
    }

    #[test]
    fn test_render_ranking_table() {
        let mut r = result("Naive Bayes", 0.8);
        r.scores = vec![(Metric::Accuracy, MetricSummary { mean: 0.85, std: 0.02 })];
        let table = render_ranking_table(&rank(&[r]));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Classifier | Vectorizer | F1 Mean | F1 Std | Accuracy Mean | Accuracy Std |");
        assert_eq!(lines[2], "| Naive Bayes | TF-IDF | 0.800 | 0.012 | 0.850 | 0.020 |");
    }
}
