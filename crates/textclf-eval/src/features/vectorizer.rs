//! Bag-of-words and TF-IDF text vectorizers.
//!
//! Both vectorizers lowercase the text, extract tokens of two or more word
//! characters, and expand them into word n-grams. Columns of the produced
//! matrix follow the alphabetical order of the vocabulary.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use ndarray::Array2;
use regex::Regex;

use crate::config::VectorizerConfig;
use crate::error::{EvalError, Result};

/// A text-to-matrix transformation that is fit on training documents.
pub trait TextVectorizer: Send + Sync {
    /// Learn the vocabulary (and weights) from `docs`.
    fn fit(&mut self, docs: &[String]) -> Result<()>;

    /// Turn `docs` into a dense `(docs, n_features)` matrix.
    fn transform(&self, docs: &[String]) -> Result<Array2<f64>>;

    fn fit_transform(&mut self, docs: &[String]) -> Result<Array2<f64>> {
        self.fit(docs)?;
        self.transform(docs)
    }

    /// Number of output columns; 0 before fitting.
    fn n_features(&self) -> usize;

    /// An unfitted copy carrying the same parameters.
    fn fresh(&self) -> Box<dyn TextVectorizer>;
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid"))
}

/// Lowercase `text` and split it into word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Expand `tokens` into space-joined n-grams for every n in `range`.
pub fn word_ngrams(tokens: &[String], range: (usize, usize)) -> Vec<String> {
    let (min_n, max_n) = range;
    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if n == 0 || n > tokens.len() {
            continue;
        }
        for window in tokens.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}

fn validate(config: &VectorizerConfig) -> Result<()> {
    let (min_n, max_n) = config.ngrams;
    if min_n == 0 || min_n > max_n {
        return Err(EvalError::InvalidInput(format!(
            "Invalid ngram range ({},{}): need 1 <= min <= max",
            min_n, max_n
        )));
    }
    if config.max_features == Some(0) {
        return Err(EvalError::InvalidInput("max_features must be positive".to_string()));
    }
    Ok(())
}

/// Raw term-count vectorizer.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    config: VectorizerConfig,
    vocabulary: Option<BTreeMap<String, usize>>,
}

impl CountVectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        validate(&config)?;
        Ok(Self {
            config,
            vocabulary: None,
        })
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Fitted vocabulary, term -> column.
    pub fn vocabulary(&self) -> Option<&BTreeMap<String, usize>> {
        self.vocabulary.as_ref()
    }

    fn analyze(&self, doc: &str) -> Vec<String> {
        word_ngrams(&tokenize(doc), self.config.ngrams)
    }
}

impl TextVectorizer for CountVectorizer {
    fn fit(&mut self, docs: &[String]) -> Result<()> {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_freq: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            let grams = self.analyze(doc);
            let unique: HashSet<&String> = grams.iter().collect();
            for gram in unique {
                *doc_freq.entry(gram.clone()).or_insert(0) += 1;
            }
            for gram in grams {
                *term_freq.entry(gram).or_insert(0) += 1;
            }
        }

        let min_df = self.config.min_df.max(1);
        let mut terms: Vec<(String, usize)> = term_freq
            .into_iter()
            .filter(|(term, _)| doc_freq.get(term).copied().unwrap_or(0) >= min_df)
            .collect();

        if terms.is_empty() {
            return Err(EvalError::InvalidInput(
                "Empty vocabulary: the documents contain no usable tokens".to_string(),
            ));
        }

        if let Some(limit) = self.config.max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            terms.truncate(limit);
        }

        let mut names: Vec<String> = terms.into_iter().map(|(term, _)| term).collect();
        names.sort();
        let vocabulary = names.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    fn transform(&self, docs: &[String]) -> Result<Array2<f64>> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or_else(|| EvalError::NotFitted("CountVectorizer".to_string()))?;

        let mut counts = Array2::<f64>::zeros((docs.len(), vocabulary.len()));
        for (row, doc) in docs.iter().enumerate() {
            for gram in self.analyze(doc) {
                if let Some(&col) = vocabulary.get(&gram) {
                    counts[[row, col]] += 1.0;
                }
            }
        }
        Ok(counts)
    }

    fn n_features(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, BTreeMap::len)
    }

    fn fresh(&self) -> Box<dyn TextVectorizer> {
        Box::new(CountVectorizer {
            config: self.config.clone(),
            vocabulary: None,
        })
    }
}

/// Term counts re-weighted by smoothed inverse document frequency, with
/// L2-normalised rows.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    counts: CountVectorizer,
    idf: Option<Vec<f64>>,
}

impl TfidfVectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        Ok(Self {
            counts: CountVectorizer::new(config)?,
            idf: None,
        })
    }

    pub fn config(&self) -> &VectorizerConfig {
        self.counts.config()
    }

    /// Fitted idf weights in column order.
    pub fn idf(&self) -> Option<&[f64]> {
        self.idf.as_deref()
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn fit(&mut self, docs: &[String]) -> Result<()> {
        let counts = self.counts.fit_transform(docs)?;
        let n_docs = docs.len() as f64;
        let idf = counts
            .columns()
            .into_iter()
            .map(|column| {
                let df = column.iter().filter(|&&v| v > 0.0).count() as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.idf = Some(idf);
        Ok(())
    }

    fn transform(&self, docs: &[String]) -> Result<Array2<f64>> {
        let idf = self
            .idf
            .as_ref()
            .ok_or_else(|| EvalError::NotFitted("TfidfVectorizer".to_string()))?;
        let mut weights = self.counts.transform(docs)?;

        for mut row in weights.rows_mut() {
            for (value, w) in row.iter_mut().zip(idf.iter()) {
                *value *= w;
            }
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }
        Ok(weights)
    }

    fn n_features(&self) -> usize {
        self.counts.n_features()
    }

    fn fresh(&self) -> Box<dyn TextVectorizer> {
        Box::new(TfidfVectorizer {
            counts: CountVectorizer {
                config: self.counts.config.clone(),
                vocabulary: None,
            },
            idf: None,
        })
    }
}
