//! End-to-end tests of the evaluation loop with stub and real models.

use ndarray::Array2;

use textclf_eval::config::{VectorizerConfig, VectorizerKind};
use textclf_eval::data_handling::Dataset;
use textclf_eval::evaluation::{
    render_ranking_table, ClassifierEvaluation, ClassifierSpec, EvaluationOptions, VectorizerSpec,
};
use textclf_eval::features::{KeywordExtractor, TextVectorizer};
use textclf_eval::metrics::Metric;
use textclf_eval::models::baseline::MajorityClass;
use textclf_eval::models::naive_bayes::{MultinomialNaiveBayes, NaiveBayesParams};
use textclf_eval::models::Classifier;
use textclf_eval::{EvalError, Result};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Ignores the text entirely: zero text features.
#[derive(Clone)]
struct NoTextFeatures;

impl TextVectorizer for NoTextFeatures {
    fn fit(&mut self, _docs: &[String]) -> Result<()> {
        Ok(())
    }

    fn transform(&self, docs: &[String]) -> Result<Array2<f64>> {
        Ok(Array2::zeros((docs.len(), 0)))
    }

    fn n_features(&self) -> usize {
        0
    }

    fn fresh(&self) -> Box<dyn TextVectorizer> {
        Box::new(self.clone())
    }
}

/// Predicts class 1 when the last feature column is positive.
#[derive(Clone, Default)]
struct SignOfLastColumn {
    fitted: bool,
}

impl Classifier for SignOfLastColumn {
    fn fit(&mut self, _x: &Array2<f64>, _y: &[usize], _n_classes: usize) -> Result<()> {
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        if !self.fitted {
            return Err(EvalError::NotFitted("SignOfLastColumn".to_string()));
        }
        let last = x.ncols() - 1;
        Ok(x.column(last).iter().map(|&v| usize::from(v > 0.0)).collect())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(SignOfLastColumn::default())
    }
}

/// Fails on every fit.
#[derive(Clone)]
struct Broken;

impl Classifier for Broken {
    fn fit(&mut self, _x: &Array2<f64>, _y: &[usize], _n_classes: usize) -> Result<()> {
        Err(EvalError::InvalidInput("broken on purpose".to_string()))
    }

    fn predict(&self, _x: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(Vec::new())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(Broken)
    }
}

/// 100 rows, half "neg" half "pos", one numeric column whose sign matches
/// the label.
fn balanced_dataset() -> Dataset {
    let n = 100;
    let mut text = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let mut numeric = Array2::<f64>::zeros((n, 1));
    for i in 0..n {
        let positive = i % 2 == 1;
        text.push(format!("row number {}", i));
        labels.push(if positive { "pos" } else { "neg" }.to_string());
        numeric[[i, 0]] = if positive { 1.0 + i as f64 / 100.0 } else { -1.0 - i as f64 / 100.0 };
    }
    Dataset::new(text, numeric, vec!["signal".to_string()], labels).unwrap()
}

fn quiet() -> EvaluationOptions {
    EvaluationOptions {
        verbose: false,
        ..EvaluationOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[test]
fn perfect_stub_ranks_above_majority_stub() {
    let classifiers = vec![
        ClassifierSpec::new("Majority", Box::new(MajorityClass::new())),
        ClassifierSpec::new("Perfect", Box::new(SignOfLastColumn::default())),
    ];
    let vectorizers = vec![VectorizerSpec::new("Identity", Box::new(NoTextFeatures))];

    let evaluation = ClassifierEvaluation::new(balanced_dataset(), classifiers, vectorizers, None, quiet()).unwrap();
    let outcome = evaluation.evaluate().unwrap();

    // evaluation order is preserved in the raw results
    assert_eq!(outcome.results[0].classifier, "Majority");
    assert_eq!(outcome.results[1].classifier, "Perfect");

    let majority = &outcome.results[0];
    let perfect = &outcome.results[1];
    assert!((perfect.f1.mean - 1.0).abs() < 1e-9);
    assert!((majority.f1.mean - 1.0 / 3.0).abs() < 1e-9);
    assert!(majority.f1.std.abs() < 1e-9);

    assert_eq!(outcome.ranking[0].classifier, "Perfect");
    assert_eq!(outcome.ranking[0].f1_mean, 1.0);
    assert_eq!(outcome.ranking[1].classifier, "Majority");
    assert_eq!(outcome.ranking[1].f1_mean, 0.333);

    // the majority stub never predicts "pos"
    assert_eq!(majority.confusion.rows(), &[vec![50, 0], vec![50, 0]]);
    assert_eq!(perfect.confusion.rows(), &[vec![50, 0], vec![0, 50]]);
    assert!(outcome.figure.is_none());
}

#[test]
fn equal_scores_keep_evaluation_order() {
    let classifiers = vec![
        ClassifierSpec::new("First", Box::new(MajorityClass::new())),
        ClassifierSpec::new("Second", Box::new(MajorityClass::new())),
    ];
    let vectorizers = vec![VectorizerSpec::new("Identity", Box::new(NoTextFeatures))];
    let outcome = ClassifierEvaluation::new(balanced_dataset(), classifiers, vectorizers, None, quiet())
        .unwrap()
        .evaluate()
        .unwrap();

    let order: Vec<&str> = outcome.ranking.iter().map(|r| r.classifier.as_str()).collect();
    assert_eq!(order, vec!["First", "Second"]);
}

#[test]
fn all_requested_metrics_are_summarised() {
    let classifiers = vec![ClassifierSpec::new("Majority", Box::new(MajorityClass::new()))];
    let vectorizers = vec![VectorizerSpec::new("Identity", Box::new(NoTextFeatures))];
    let outcome = ClassifierEvaluation::new(balanced_dataset(), classifiers, vectorizers, None, quiet())
        .unwrap()
        .evaluate()
        .unwrap();

    let result = &outcome.results[0];
    assert!((result.summary(Metric::Accuracy).unwrap().mean - 0.5).abs() < 1e-9);
    assert!((result.summary(Metric::RecallMacro).unwrap().mean - 0.5).abs() < 1e-9);
    assert!((result.summary(Metric::PrecisionMacro).unwrap().mean - 0.25).abs() < 1e-9);

    let table = render_ranking_table(&outcome.ranking);
    assert!(table.contains("| Majority | Identity | 0.333 | 0.000 |"));
}

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

#[test]
fn one_failing_pair_aborts_everything() {
    let classifiers = vec![
        ClassifierSpec::new("Majority", Box::new(MajorityClass::new())),
        ClassifierSpec::new("Broken", Box::new(Broken)),
    ];
    let vectorizers = vec![VectorizerSpec::new("Identity", Box::new(NoTextFeatures))];
    let result = ClassifierEvaluation::new(balanced_dataset(), classifiers, vectorizers, None, quiet())
        .unwrap()
        .evaluate();
    assert!(matches!(result, Err(EvalError::InvalidInput(_))));
}

#[test]
fn wrong_tick_label_count_is_rejected() {
    let classifiers = vec![ClassifierSpec::new("Majority", Box::new(MajorityClass::new()))];
    let vectorizers = vec![VectorizerSpec::new("Identity", Box::new(NoTextFeatures))];
    let options = EvaluationOptions {
        tick_labels: Some(vec!["only one".to_string()]),
        ..quiet()
    };
    let result = ClassifierEvaluation::new(balanced_dataset(), classifiers, vectorizers, None, options)
        .unwrap()
        .evaluate();
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Real text pipeline
// ---------------------------------------------------------------------------

fn topic_dataset() -> Dataset {
    let sport = ["goal", "match", "team", "striker", "league", "coach"];
    let politics = ["vote", "senate", "law", "budget", "minister", "election"];
    let mut text = Vec::new();
    let mut labels = Vec::new();
    for i in 0..10 {
        for (words, label) in [(&sport, "sport"), (&politics, "politics")] {
            text.push(format!("{} {} {}", words[i % 6], words[(i + 1) % 6], words[(i + 2) % 6]));
            labels.push(label.to_string());
        }
    }
    Dataset::from_text(text, labels).unwrap()
}

#[test]
fn naive_bayes_separates_topics_and_builds_grid() {
    let tfidf = VectorizerConfig::default().build(VectorizerKind::TfIdf).unwrap();
    let bow = VectorizerConfig::default().build(VectorizerKind::BagOfWords).unwrap();
    let classifiers = vec![
        ClassifierSpec::new("Naive Bayes", Box::new(MultinomialNaiveBayes::new(NaiveBayesParams::default()))),
        ClassifierSpec::new("Majority", Box::new(MajorityClass::new())),
    ];
    let vectorizers = vec![VectorizerSpec::new("TF-IDF", tfidf), VectorizerSpec::new("Bag of words", bow)];

    // keyword columns are non-negative, and "Naive Bayes" is left unscaled
    let augmenter = Box::new(KeywordExtractor::new(["goal", "vote"]));
    let outcome = ClassifierEvaluation::new(topic_dataset(), classifiers, vectorizers, Some(augmenter), EvaluationOptions::default())
        .unwrap()
        .evaluate()
        .unwrap();

    assert_eq!(outcome.results.len(), 4);
    let pairs: Vec<(&str, &str)> = outcome
        .results
        .iter()
        .map(|r| (r.classifier.as_str(), r.vectorizer.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Naive Bayes", "TF-IDF"),
            ("Naive Bayes", "Bag of words"),
            ("Majority", "TF-IDF"),
            ("Majority", "Bag of words"),
        ]
    );
    assert!(outcome.results[0].f1.mean > 0.99);
    assert!(outcome.results[1].f1.mean > 0.99);
    assert_eq!(outcome.ranking[3].classifier, "Majority");

    let grid = outcome.figure.unwrap();
    assert_eq!(grid.len(), 4);
    assert_eq!(grid.rows(), 2);
}
