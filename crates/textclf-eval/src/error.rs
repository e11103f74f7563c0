//! Error type shared by the library.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Config file not found at {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid ngram range {0:?}: expected \"(a,b)\"")]
    NgramParse(String),

    #[error("Feature rows ({features}) and labels ({labels}) must have equal length")]
    LengthMismatch { features: usize, labels: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Duplicate name in mapping: {0}")]
    DuplicateName(String),

    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    #[error("{0} must be fitted before use")]
    NotFitted(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Negative values in data passed to {0}")]
    NegativeFeatures(String),

    #[error("Cross-validation error: {0}")]
    Fold(String),
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::ConfigNotFound(PathBuf::from("missing.json"));
        assert!(format!("{}", err).contains("missing.json"));

        let err = EvalError::NgramParse("(1,x)".to_string());
        assert!(format!("{}", err).contains("(1,x)"));

        let err = EvalError::LengthMismatch { features: 3, labels: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains('3') && msg.contains('2'));

        let err = EvalError::NegativeFeatures("Naive Bayes".to_string());
        assert!(format!("{}", err).contains("Naive Bayes"));
    }
}
