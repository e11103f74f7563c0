//! CSV dataset reader.
//!
//! One column holds the free text and one the label. Every other column
//! whose values all parse as numbers becomes a numeric feature. The rest
//! are skipped with a debug message.
use std::path::Path;

use ndarray::Array2;

use crate::data_handling::Dataset;
use crate::error::{EvalError, Result};

#[derive(Debug, Clone)]
pub struct DatasetReaderConfig {
    pub text_column: String,
    pub label_column: String,
    pub delimiter: u8,
}

impl Default for DatasetReaderConfig {
    fn default() -> Self {
        Self {
            text_column: "text".to_string(),
            label_column: "label".to_string(),
            delimiter: b',',
        }
    }
}

/// Read a CSV file with the default comma delimiter.
pub fn read_dataset_csv<P: AsRef<Path>>(
    path: P,
    text_column: &str,
    label_column: &str,
) -> Result<Dataset> {
    let config = DatasetReaderConfig {
        text_column: text_column.to_string(),
        label_column: label_column.to_string(),
        ..DatasetReaderConfig::default()
    };
    read_dataset_with_config(path, &config)
}

pub fn read_dataset_with_config<P: AsRef<Path>>(
    path: P,
    config: &DatasetReaderConfig,
) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_path(path.as_ref())?;
    read_dataset(&mut reader, config)
}

fn read_dataset<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    config: &DatasetReaderConfig,
) -> Result<Dataset> {
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let find = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            EvalError::InvalidInput(format!("Column '{}' not found in header {:?}", name, headers))
        })
    };
    let text_idx = find(&config.text_column)?;
    let label_idx = find(&config.label_column)?;

    let mut text = Vec::new();
    let mut labels = Vec::new();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (idx, field) in record.iter().enumerate() {
            if idx == text_idx {
                text.push(field.to_string());
            } else if idx == label_idx {
                labels.push(field.trim().to_string());
            } else if let Some(column) = columns.get_mut(idx) {
                column.push(field.to_string());
            }
        }
    }

    let mut numeric_names = Vec::new();
    let mut numeric_columns: Vec<Vec<f64>> = Vec::new();
    for (idx, values) in columns.into_iter().enumerate() {
        if idx == text_idx || idx == label_idx {
            continue;
        }
        let parsed: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
        match parsed {
            Some(col) if col.len() == labels.len() => {
                numeric_names.push(headers[idx].clone());
                numeric_columns.push(col);
            }
            _ => log::debug!("Skipping non-numeric column '{}'", headers[idx]),
        }
    }

    let rows = labels.len();
    let mut numeric = Array2::<f64>::zeros((rows, numeric_columns.len()));
    for (col, values) in numeric_columns.iter().enumerate() {
        for (row, value) in values.iter().enumerate() {
            numeric[[row, col]] = *value;
        }
    }

    Dataset::new(text, numeric, numeric_names, labels)
}
