//! `textclf model ...`: read, write and evaluate saved presets.
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use textclf_eval::config::{ConfigLoader, ModelPreset, ModelType};
use textclf_eval::evaluation::{ClassifierEvaluation, ClassifierSpec, EvaluationOptions, VectorizerSpec};
use textclf_eval::models::factory::build_model;
use textclf_eval::success;

use crate::evaluate::{finish, load_dataset, load_step, EvaluateArgs};

/// Look up a preset fresh from disk. `None` when it does not exist.
pub fn show_model(config: &Path, step: &str, name: &str) -> Result<Option<Value>> {
    let mut step_config = ConfigLoader::new(config)
        .load(step)
        .with_context(|| format!("Failed to load step '{}' from {}", step, config.display()))?;
    let preset = step_config.get_model(name)?;
    Ok(preset.map(|p| p.to_value()))
}

/// Save a preset built from flat `fields`, returning what was stored.
pub fn save_model(config: &Path, step: &str, name: &str, fields: Map<String, Value>) -> Result<ModelPreset> {
    let mut step_config = ConfigLoader::new(config)
        .load(step)
        .with_context(|| format!("Failed to load step '{}' from {}", step, config.display()))?;
    let preset = step_config
        .save_model(name, fields)
        .with_context(|| format!("Failed to save model '{}' to {}", name, config.display()))?;
    success!("Model '{}' saved to {}", name, config.display());
    Ok(preset)
}

/// Evaluate one saved preset: its classifier with its own vectorizer.
pub fn evaluate_model(args: &EvaluateArgs, name: &str) -> Result<()> {
    let mut config = load_step(args)?;
    let preset = config
        .get_model(name)?
        .with_context(|| format!("Model '{}' not found in step '{}'", name, args.step))?;

    let model_type = preset.model_type()?;
    let (kind, vectorizer_config) = preset.vectorizer_config()?;
    log::debug!("Preset '{}': {:?} with {:?}", name, model_type, vectorizer_config);

    let classifiers = vec![ClassifierSpec::new(name, build_model(&model_type, config.random_state()))];
    let vectorizers = vec![VectorizerSpec::new(kind.display_name(), vectorizer_config.build(kind)?)];

    let unscaled = match model_type {
        ModelType::NaiveBayes(_) => vec![name.to_string()],
        _ => Vec::new(),
    };
    let options = EvaluationOptions {
        unscaled,
        ..args.options(&config)
    };

    let data = load_dataset(args)?;
    let evaluation = ClassifierEvaluation::new(data, classifiers, vectorizers, args.augmenter(), options)?;
    let outcome = evaluation.evaluate().context("Evaluation failed")?;

    let title = format!("{} {} evaluation", config.name, name);
    finish(args, &config, &title, outcome)
}
