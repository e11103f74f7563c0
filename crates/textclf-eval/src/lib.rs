//! textclf-eval: cross-validated comparison of text classifiers.
//!
//! This crate evaluates every (classifier, vectorizer) pair over a dataset
//! holding one free-text column plus numeric columns. It provides a
//! JSON-backed step configuration, small text vectorizers and classifiers
//! behind traits, stratified k-fold cross-validation, and plotly/maud
//! reporting.
//!
//! The evaluation loop only talks to the `Classifier`, `TextVectorizer` and
//! `FeatureAugmenter` traits, so callers can plug in their own models.
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;

pub use error::{EvalError, Result};
