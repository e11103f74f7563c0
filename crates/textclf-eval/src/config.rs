//! JSON-backed step configuration.
//!
//! The configuration file looks like:
//!
//! ```json
//! {
//!   "result_dir": "results",
//!   "static_dir": "static",
//!   "random_state": 42,
//!   "test_ratio": 0.2,
//!   "Step1": {
//!     "multi_label": false,
//!     "vectorizer": {
//!       "TF-IDF": { "ngrams": "(1,2)", "max_features": 5000 },
//!       "BoW": { "ngrams": "(1,1)", "max_features": 5000 }
//!     },
//!     "models": {
//!       "lr_bigram": { "model": "logistic_regression", "c": 0.5,
//!                      "vectorizer": { "ngram_range": "(1,2)" } }
//!     }
//!   }
//! }
//! ```
//!
//! A [`ConfigLoader`] owns the file path; there is no global state. The file
//! on disk is the source of truth: [`StepConfig::get_model`] and
//! [`StepConfig::save_model`] refresh the step from disk before they read or
//! write, and every write goes through a temp file renamed over the target.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EvalError, Result};
use crate::features::vectorizer::{CountVectorizer, TextVectorizer, TfidfVectorizer};
use crate::models::gbdt::GradientBoostingParams;
use crate::models::knn::KnnParams;
use crate::models::logistic::LogisticParams;
use crate::models::naive_bayes::NaiveBayesParams;
use crate::models::svm::LinearSvcParams;
use crate::models::trees::{ForestParams, TreeParams};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Keys of a flat preset that belong to the nested "vectorizer" record.
pub const VECTORIZER_KEYS: [&str; 4] = ["ngram_range", "min_df", "max_features", "vectorizer_type"];

/// Parse a range string such as `"(1,2)"` into `(1, 2)`.
pub fn parse_ngram_range(input: &str) -> Result<(usize, usize)> {
    let trimmed = input.trim_matches(|c| c == '(' || c == ')' || c == ' ');
    let parts: Vec<&str> = trimmed.split(',').collect();
    if parts.len() != 2 {
        return Err(EvalError::NgramParse(input.to_string()));
    }
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| EvalError::NgramParse(input.to_string()))
    };
    Ok((parse(parts[0])?, parse(parts[1])?))
}

/// Translate a symbolic ngram name into its range string. Unknown names map
/// to `"(1,1)"`.
pub fn ngram_range_from_symbol(name: &str) -> &'static str {
    match name {
        "unigram" => "(1,1)",
        "bigram" => "(1,2)",
        "trigram" => "(1,3)",
        "quadrugram" => "(1,4)",
        "bigram_only" => "(2,2)",
        _ => "(1,1)",
    }
}

/// Python-style truthiness of a JSON value.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Which text weighting a vectorizer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorizerKind {
    TfIdf,
    BagOfWords,
}

impl VectorizerKind {
    /// Display name used in evaluation tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            VectorizerKind::TfIdf => "TF-IDF",
            VectorizerKind::BagOfWords => "Bag of words",
        }
    }
}

impl FromStr for VectorizerKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tf-idf" | "tfidf" | "tf_idf" => Ok(VectorizerKind::TfIdf),
            "bow" | "bag of words" | "bag_of_words" | "count" => Ok(VectorizerKind::BagOfWords),
            _ => Err(EvalError::InvalidInput(format!("Unknown vectorizer type: {}", s))),
        }
    }
}

/// Parameters shared by both vectorizer kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    pub ngrams: (usize, usize),
    pub max_features: Option<usize>,
    pub min_df: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngrams: (1, 1),
            max_features: None,
            min_df: 1,
        }
    }
}

impl VectorizerConfig {
    /// Read a step default entry: `{ "ngrams": "(a,b)", "max_features": n }`.
    fn from_step_entry(entry: Option<&Value>) -> Result<Self> {
        Self::from_record(entry, "ngrams")
    }

    fn from_record(record: Option<&Value>, ngram_key: &str) -> Result<Self> {
        let mut config = VectorizerConfig::default();
        let Some(record) = record else {
            return Ok(config);
        };
        if let Some(ngrams) = record.get(ngram_key).and_then(Value::as_str) {
            config.ngrams = parse_ngram_range(ngrams)?;
        }
        config.max_features = record
            .get("max_features")
            .and_then(Value::as_u64)
            .map(|v| v as usize);
        if let Some(min_df) = record.get("min_df").and_then(Value::as_u64) {
            config.min_df = min_df as usize;
        }
        Ok(config)
    }

    pub fn build(&self, kind: VectorizerKind) -> Result<Box<dyn TextVectorizer>> {
        Ok(match kind {
            VectorizerKind::TfIdf => Box::new(TfidfVectorizer::new(self.clone())?),
            VectorizerKind::BagOfWords => Box::new(CountVectorizer::new(self.clone())?),
        })
    }
}

/// Supported classifier kinds and their hyper-parameters.
///
/// Presets name the kind with a `model` key; absent hyper-parameters take
/// their defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelType {
    LogisticRegression(LogisticParams),
    NaiveBayes(NaiveBayesParams),
    LinearSvc(LinearSvcParams),
    DecisionTree(TreeParams),
    RandomForest(ForestParams),
    Knn(KnnParams),
    GradientBoosting(GradientBoostingParams),
    Majority,
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::LogisticRegression(LogisticParams::default())
    }
}

impl FromStr for ModelType {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "logistic_regression" | "logreg" => Ok(ModelType::LogisticRegression(LogisticParams::default())),
            "naive_bayes" | "multinomial_nb" => Ok(ModelType::NaiveBayes(NaiveBayesParams::default())),
            "linear_svc" | "linear_svm" | "svm" => Ok(ModelType::LinearSvc(LinearSvcParams::default())),
            "decision_tree" | "tree" => Ok(ModelType::DecisionTree(TreeParams::default())),
            "random_forest" | "rf" => Ok(ModelType::RandomForest(ForestParams::default())),
            "knn" => Ok(ModelType::Knn(KnnParams::default())),
            "gradient_boosting" | "gbdt" => {
                Ok(ModelType::GradientBoosting(GradientBoostingParams::default()))
            }
            "majority" => Ok(ModelType::Majority),
            _ => Err(EvalError::UnknownModel(s.to_string())),
        }
    }
}

/// A named model preset stored under a step's "models" mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPreset {
    pub name: String,
    /// Model hyper-parameters (every key except the vectorizer ones).
    pub params: Map<String, Value>,
    /// Nested vectorizer record.
    pub vectorizer: Map<String, Value>,
}

impl ModelPreset {
    /// Split a flat field set into hyper-parameters and a vectorizer record.
    ///
    /// `ngram_range` is translated through [`ngram_range_from_symbol`].
    pub fn from_flat(name: &str, fields: Map<String, Value>) -> Self {
        let mut params = Map::new();
        let mut vectorizer = Map::new();
        for (key, value) in fields {
            if key == "ngram_range" {
                let symbol = match value.as_str() {
                    Some(symbol) => symbol,
                    None => {
                        log::warn!(
                            "Preset '{}': ngram_range {} is not a name, using unigrams",
                            name,
                            value
                        );
                        ""
                    }
                };
                vectorizer.insert(key, Value::from(ngram_range_from_symbol(symbol)));
            } else if VECTORIZER_KEYS.contains(&key.as_str()) {
                vectorizer.insert(key, value);
            } else if key == "vectorizer" {
                if let Value::Object(nested) = value {
                    vectorizer.extend(nested);
                }
            } else {
                params.insert(key, value);
            }
        }
        Self {
            name: name.to_string(),
            params,
            vectorizer,
        }
    }

    fn from_stored(name: &str, value: &Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(EvalError::InvalidInput(format!(
                "Model preset '{}' must be a JSON object",
                name
            )));
        };
        let mut params = object.clone();
        let vectorizer = match params.remove("vectorizer") {
            Some(Value::Object(v)) => v,
            _ => Map::new(),
        };
        Ok(Self {
            name: name.to_string(),
            params,
            vectorizer,
        })
    }

    /// The JSON object written under `models.<name>`.
    pub fn to_value(&self) -> Value {
        let mut object = self.params.clone();
        object.insert("vectorizer".to_string(), Value::Object(self.vectorizer.clone()));
        Value::Object(object)
    }

    /// Resolve the classifier kind: the `model` key when present, otherwise
    /// the preset name itself.
    pub fn model_type(&self) -> Result<ModelType> {
        if self.params.contains_key("model") {
            serde_json::from_value(Value::Object(self.params.clone()))
                .map_err(|e| EvalError::UnknownModel(format!("{} ({})", self.name, e)))
        } else {
            self.name.parse()
        }
    }

    /// Vectorizer kind (TF-IDF unless `vectorizer_type` says otherwise) and
    /// parameters of this preset.
    pub fn vectorizer_config(&self) -> Result<(VectorizerKind, VectorizerConfig)> {
        let kind = match self.vectorizer.get("vectorizer_type").and_then(Value::as_str) {
            Some(name) => name.parse()?,
            None => VectorizerKind::TfIdf,
        };
        let record = Value::Object(self.vectorizer.clone());
        let config = VectorizerConfig::from_record(Some(&record), "ngram_range")?;
        Ok((kind, config))
    }
}

/// Top-level defaults shared by every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub result_dir: PathBuf,
    pub static_dir: PathBuf,
    pub random_state: u64,
    pub test_ratio: f64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            result_dir: PathBuf::from("results"),
            static_dir: PathBuf::from("static"),
            random_state: 42,
            test_ratio: 0.2,
        }
    }
}

/// Explicitly constructed handle on a configuration file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document from disk.
    pub fn read_document(&self) -> Result<Map<String, Value>> {
        read_document(&self.path)
    }

    /// Materialize the settings of step `step`.
    pub fn load(&self, step: &str) -> Result<StepConfig> {
        let document = self.read_document()?;
        let general: GeneralConfig = serde_json::from_value(Value::Object(document.clone()))?;

        let step_data = document.get(step).cloned().unwrap_or_else(|| Value::Object(Map::new()));
        let vectorizers = step_data.get("vectorizer");
        let tf_idf = VectorizerConfig::from_step_entry(vectorizers.and_then(|v| v.get("TF-IDF")))?;
        let bow = VectorizerConfig::from_step_entry(vectorizers.and_then(|v| v.get("BoW")))?;

        let mut config = StepConfig {
            name: step.to_string(),
            general,
            tf_idf,
            bow,
            multi_label: false,
            models: Map::new(),
            source: self.path.clone(),
        };
        config.apply_step_data(&step_data);
        log::debug!("Loaded step '{}' from {}", step, self.path.display());
        Ok(config)
    }
}

/// Settings for one named pipeline step.
#[derive(Debug, Clone)]
pub struct StepConfig {
    pub name: String,
    pub general: GeneralConfig,
    pub tf_idf: VectorizerConfig,
    pub bow: VectorizerConfig,
    multi_label: bool,
    models: Map<String, Value>,
    source: PathBuf,
}

impl StepConfig {
    pub fn result_dir(&self) -> &Path {
        &self.general.result_dir
    }

    pub fn static_dir(&self) -> &Path {
        &self.general.static_dir
    }

    pub fn random_state(&self) -> u64 {
        self.general.random_state
    }

    pub fn test_ratio(&self) -> f64 {
        self.general.test_ratio
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// True when the step's `multi_label` flag is truthy.
    pub fn is_multi_label(&self) -> bool {
        self.multi_label
    }

    /// In-memory presets as of the last reload.
    pub fn models(&self) -> &Map<String, Value> {
        &self.models
    }

    pub fn default_tf_idf(&self) -> Result<Box<dyn TextVectorizer>> {
        self.tf_idf.build(VectorizerKind::TfIdf)
    }

    pub fn default_bow(&self) -> Result<Box<dyn TextVectorizer>> {
        self.bow.build(VectorizerKind::BagOfWords)
    }

    fn apply_step_data(&mut self, step_data: &Value) {
        self.multi_label = step_data.get("multi_label").map_or(false, truthy);
        self.models = match step_data.get("models") {
            Some(Value::Object(models)) => models.clone(),
            _ => Map::new(),
        };
    }

    /// Refresh the step sub-object (presets and flags) from disk.
    pub fn reload(&mut self) -> Result<()> {
        let document = read_document(&self.source)?;
        let step_data = document.get(&self.name).cloned().unwrap_or_else(|| Value::Object(Map::new()));
        self.apply_step_data(&step_data);
        Ok(())
    }

    /// Write the in-memory "models" mapping back to disk.
    ///
    /// The full document is re-read first so that keys changed by someone
    /// else since the last reload survive; only this step's "models" key is
    /// replaced.
    pub fn commit(&self) -> Result<()> {
        let mut document = read_document(&self.source)?;
        let step_entry = document
            .entry(self.name.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !step_entry.is_object() {
            *step_entry = Value::Object(Map::new());
        }
        if let Value::Object(step_object) = step_entry {
            step_object.insert("models".to_string(), Value::Object(self.models.clone()));
        }
        write_document(&self.source, &document)
    }

    /// Look up a preset, fresh from disk. A missing preset is reported as a
    /// warning and returned as `None`.
    pub fn get_model(&mut self, name: &str) -> Result<Option<ModelPreset>> {
        self.reload()?;
        match self.models.get(name) {
            Some(value) => Ok(Some(ModelPreset::from_stored(name, value)?)),
            None => {
                log::warn!("Model '{}' not found in step '{}'", name, self.name);
                Ok(None)
            }
        }
    }

    /// Insert or overwrite preset `name` built from a flat field set and
    /// persist it.
    pub fn save_model(&mut self, name: &str, fields: Map<String, Value>) -> Result<ModelPreset> {
        self.reload()?;
        let preset = ModelPreset::from_flat(name, fields);
        self.models.insert(name.to_string(), preset.to_value());
        self.commit()?;
        log::info!("Saved model '{}' to step '{}'", name, self.name);
        Ok(preset)
    }
}

fn read_document(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Err(EvalError::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Object(document) => Ok(document),
        _ => Err(EvalError::InvalidInput(format!(
            "Config file {} must contain a JSON object",
            path.display()
        ))),
    }
}

fn write_document(path: &Path, document: &Map<String, Value>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, document)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| EvalError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ngram_range() {
        assert_eq!(parse_ngram_range("(1,2)").unwrap(), (1, 2));
        assert_eq!(parse_ngram_range("( 2, 3 )").unwrap(), (2, 3));
        assert_eq!(parse_ngram_range("1,1").unwrap(), (1, 1));
    }

    #[test]
    fn test_parse_ngram_range_malformed() {
        for bad in ["(1,x)", "(1)", "()", "(1,2,3)", "", "(a,b)", "(-1,2)"] {
            assert!(parse_ngram_range(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_symbol_table() {
        assert_eq!(ngram_range_from_symbol("bigram"), "(1,2)");
        assert_eq!(ngram_range_from_symbol("bigram_only"), "(2,2)");
        assert_eq!(ngram_range_from_symbol("quadrugram"), "(1,4)");
        assert_eq!(ngram_range_from_symbol("pentagram"), "(1,1)");
    }

    #[test]
    fn test_from_flat_partitions_fields() {
        let fields = json!({
            "model": "knn",
            "n_neighbors": 3,
            "ngram_range": "trigram",
            "max_features": 100,
        });
        let Value::Object(fields) = fields else { unreachable!() };
        let preset = ModelPreset::from_flat("knn3", fields);
        assert_eq!(preset.params.len(), 2);
        assert_eq!(preset.vectorizer["ngram_range"], json!("(1,3)"));
        assert_eq!(preset.vectorizer["max_features"], json!(100));
        assert!(matches!(preset.model_type().unwrap(), ModelType::Knn(KnnParams { n_neighbors: 3 })));

        let (kind, vec) = preset.vectorizer_config().unwrap();
        assert_eq!(kind, VectorizerKind::TfIdf);
        assert_eq!(vec.ngrams, (1, 3));
        assert_eq!(vec.max_features, Some(100));
    }

    #[test]
    fn test_model_type_from_name() {
        assert!(matches!("Naive Bayes".parse::<ModelType>().unwrap(), ModelType::NaiveBayes(_)));
        assert!(matches!("gbdt".parse::<ModelType>().unwrap(), ModelType::GradientBoosting(_)));
        assert!(matches!("Random Forest".parse::<ModelType>().unwrap(), ModelType::RandomForest(_)));
        assert!(matches!("tree".parse::<ModelType>().unwrap(), ModelType::DecisionTree(_)));
        assert!("adaboost".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_from_flat_non_string_ngram_range_falls_back_to_unigrams() {
        let fields = json!({ "model": "naive_bayes", "ngram_range": [1, 2] });
        let Value::Object(fields) = fields else { unreachable!() };
        let preset = ModelPreset::from_flat("nb", fields);
        assert_eq!(preset.vectorizer["ngram_range"], json!("(1,1)"));
        assert_eq!(preset.vectorizer_config().unwrap().1.ngrams, (1, 1));
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!(true)));
    }
}
