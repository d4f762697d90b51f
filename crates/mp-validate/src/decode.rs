//! Upload decoding: raw text to loosely-typed rows.
//!
//! Decoding is deliberately separate from validation. A failure here means
//! the upload is not parseable as its declared format at all and surfaces
//! as `[V001]`, before any schema check runs.

use crate::error::{ValidateError, ValidateResult};
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;

/// One decoded row: column name to loosely-typed value
pub type RawRow = Map<String, Value>;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    /// Comma-separated values with a header row
    Csv,
    /// JSON array of objects (or an object with a `records` array)
    Json,
}

impl UploadFormat {
    /// File extension conventionally used for this format
    pub fn extension(&self) -> &'static str {
        match self {
            UploadFormat::Csv => "csv",
            UploadFormat::Json => "json",
        }
    }

    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(UploadFormat::Csv),
            "json" => Some(UploadFormat::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for UploadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for UploadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(UploadFormat::Csv),
            "json" => Ok(UploadFormat::Json),
            other => Err(format!("unknown upload format '{}'", other)),
        }
    }
}

/// Decode raw content into rows according to the declared format
pub fn decode(raw: &str, format: UploadFormat) -> ValidateResult<Vec<RawRow>> {
    match format {
        UploadFormat::Csv => decode_csv(raw),
        UploadFormat::Json => decode_json(raw),
    }
}

fn format_error(format: UploadFormat, message: impl Into<String>) -> ValidateError {
    ValidateError::Format {
        format: format.to_string(),
        message: message.into(),
    }
}

fn decode_json(raw: &str) -> ValidateResult<Vec<RawRow>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| format_error(UploadFormat::Json, e.to_string()))?;

    // Accept either a top-level array or an object wrapping a `records` array
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("records") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(format_error(
                    UploadFormat::Json,
                    "expected a JSON array of objects or an object with a 'records' array",
                ))
            }
        },
        _ => {
            return Err(format_error(
                UploadFormat::Json,
                "expected a JSON array of objects",
            ))
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(map) => Ok(map),
            other => Err(format_error(
                UploadFormat::Json,
                format!("element {} is not an object: {}", i + 1, other),
            )),
        })
        .collect()
}

fn decode_csv(raw: &str) -> ValidateResult<Vec<RawRow>> {
    let mut lines = raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| format_error(UploadFormat::Csv, "empty file"))?;
    let header = split_csv_line(header_line)
        .map_err(|m| format_error(UploadFormat::Csv, format!("header: {}", m)))?;
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(format_error(UploadFormat::Csv, "header row is empty"));
    }

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let fields = split_csv_line(line)
            .map_err(|m| format_error(UploadFormat::Csv, format!("line {}: {}", line_no + 1, m)))?;
        if fields.len() != header.len() {
            return Err(format_error(
                UploadFormat::Csv,
                format!(
                    "line {}: expected {} fields, found {}",
                    line_no + 1,
                    header.len(),
                    fields.len()
                ),
            ));
        }

        let mut row = RawRow::new();
        for (name, field) in header.iter().zip(fields) {
            let trimmed = field.trim();
            if trimmed.is_empty() {
                continue; // absent value, not an empty string
            }
            row.insert(name.trim().to_string(), parse_scalar(trimmed));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Parse a CSV cell into the loosest matching JSON scalar
fn parse_scalar(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    Value::from(s)
}

/// Split one CSV line, honoring double-quoted fields with `""` escapes.
/// Embedded newlines inside quotes are not supported.
fn split_csv_line(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}
