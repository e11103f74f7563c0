use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

pub fn validate_csv_file(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("csv") => {}
        _ => anyhow::bail!("File must have a .csv extension: {}", path.display()),
    }

    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    Ok(())
}

/// Split a comma separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `key=value`. The value is read as JSON when it parses, otherwise
/// kept as a plain string.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (key, raw) = assignment
        .split_once('=')
        .with_context(|| format!("Expected key=value, got '{}'", assignment))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Empty key in '{}'", assignment);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Collect `key=value` assignments into a flat field map. Later keys win.
pub fn parse_assignments<'a, I>(assignments: I) -> Result<Map<String, Value>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut fields = Map::new();
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        fields.insert(key, value);
    }
    Ok(fields)
}
