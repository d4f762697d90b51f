//! The four-stage validation pipeline.
//!
//! Per row: structural check (required fields present and numeric), then
//! logical consistency (`events <= n`, `sd > 0`), then plausibility flags
//! (comprehensive level only, warnings never rejections), then the batch
//! decision: more than half the rows failing rejects the whole upload.

use crate::aliases::normalize_row;
use crate::decode::RawRow;
use crate::error::{RowError, ValidateError, ValidateResult};
use chrono::Datelike;
use mp_core::{EffectMeasure, OutcomeData, OutcomeFamily, StudyRecord, ZeroEventArms};
use serde_json::Value;
use std::str::FromStr;

/// How many row errors a batch rejection surfaces
const MAX_SURFACED_ERRORS: usize = 5;

/// Requested validation depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationLevel {
    /// Structural and logical checks only
    #[default]
    Basic,
    /// Additionally flag implausible-but-valid rows as warnings
    Comprehensive,
}

impl FromStr for ValidationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(ValidationLevel::Basic),
            "comprehensive" => Ok(ValidationLevel::Comprehensive),
            other => Err(format!("unknown validation level '{}'", other)),
        }
    }
}

/// Outcome of a successful batch validation
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    /// Records that passed stages 1-2
    pub records: Vec<StudyRecord>,
    /// Batch-level warnings: plausibility flags and skipped-row notices
    pub warnings: Vec<String>,
}

/// Validate decoded rows against the schema for the given effect measure
pub fn validate_rows(
    rows: &[RawRow],
    measure: EffectMeasure,
    level: ValidationLevel,
) -> ValidateResult<ValidatedBatch> {
    if rows.is_empty() {
        return Err(ValidateError::EmptyUpload);
    }

    let family = measure.family();
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (idx, raw) in rows.iter().enumerate() {
        let row = normalize_row(raw);
        match build_record(idx, &row, family) {
            Ok(record) => {
                if level == ValidationLevel::Comprehensive {
                    warnings.extend(plausibility_warnings(idx, &record));
                }
                records.push(record);
            }
            Err(e) => errors.push(e),
        }
    }

    let total = rows.len();
    let failed = errors.len();
    if failed * 2 > total {
        errors.truncate(MAX_SURFACED_ERRORS);
        return Err(ValidateError::BatchRejected {
            failed,
            total,
            errors,
        });
    }

    for e in &errors {
        warnings.push(format!("{} (row skipped)", e));
    }

    log::debug!(
        "validated batch: {} accepted, {} skipped, {} warnings",
        records.len(),
        failed,
        warnings.len()
    );
    Ok(ValidatedBatch { records, warnings })
}

/// Stages 1-2 for one normalized row
fn build_record(idx: usize, row: &RawRow, family: OutcomeFamily) -> Result<StudyRecord, RowError> {
    let row_no = idx + 1;

    let id = opt_string(row, "id").unwrap_or_else(|| format!("record-{}", row_no));
    let name = opt_string(row, "name").unwrap_or_else(|| id.clone());
    let year = opt_int(row, "year", row_no)?;

    let outcome = match family {
        OutcomeFamily::Binary => {
            let n_treatment = count(row, "n_treatment", row_no)?;
            let n_control = count(row, "n_control", row_no)?;
            let events_treatment = count(row, "events_treatment", row_no)?;
            let events_control = count(row, "events_control", row_no)?;

            if events_treatment > n_treatment {
                return Err(logical(
                    row_no,
                    "events_treatment",
                    format!(
                        "events_treatment ({}) exceeds n_treatment ({})",
                        events_treatment, n_treatment
                    ),
                ));
            }
            if events_control > n_control {
                return Err(logical(
                    row_no,
                    "events_control",
                    format!(
                        "events_control ({}) exceeds n_control ({})",
                        events_control, n_control
                    ),
                ));
            }

            OutcomeData::Binary {
                n_treatment,
                n_control,
                events_treatment,
                events_control,
            }
        }
        OutcomeFamily::Continuous => {
            let n_treatment = count(row, "n_treatment", row_no)?;
            let n_control = count(row, "n_control", row_no)?;
            let mean_treatment = float(row, "mean_treatment", row_no)?;
            let sd_treatment = float(row, "sd_treatment", row_no)?;
            let mean_control = float(row, "mean_control", row_no)?;
            let sd_control = float(row, "sd_control", row_no)?;

            if n_treatment == 0 || n_control == 0 {
                return Err(logical(
                    row_no,
                    "n_treatment",
                    "sample sizes must be positive for continuous outcomes".to_string(),
                ));
            }
            if sd_treatment <= 0.0 {
                return Err(logical(
                    row_no,
                    "sd_treatment",
                    format!("sd_treatment must be positive, got {}", sd_treatment),
                ));
            }
            if sd_control <= 0.0 {
                return Err(logical(
                    row_no,
                    "sd_control",
                    format!("sd_control must be positive, got {}", sd_control),
                ));
            }

            OutcomeData::Continuous {
                n_treatment,
                n_control,
                mean_treatment,
                sd_treatment,
                mean_control,
                sd_control,
            }
        }
    };

    let effect_size = opt_float(row, "effect_size", row_no)?;
    let ci_lower = opt_float(row, "ci_lower", row_no)?;
    let ci_upper = opt_float(row, "ci_upper", row_no)?;
    let weight = opt_float(row, "weight", row_no)?;
    let quality_score = opt_float(row, "quality_score", row_no)?;

    if let (Some(lower), Some(upper)) = (ci_lower, ci_upper) {
        if lower >= upper {
            return Err(logical(
                row_no,
                "ci_lower",
                format!("ci_lower ({}) must be below ci_upper ({})", lower, upper),
            ));
        }
    }

    Ok(StudyRecord {
        id,
        name,
        year,
        outcome,
        effect_size,
        ci_lower,
        ci_upper,
        weight,
        quality_score,
    })
}

/// Stage 3: flags for rows that are valid but suspicious. Warnings only.
fn plausibility_warnings(idx: usize, record: &StudyRecord) -> Vec<String> {
    let row_no = idx + 1;
    let mut warnings = Vec::new();
    let label = format!("row {} ('{}')", row_no, record.name);

    match &record.outcome {
        OutcomeData::Binary {
            n_treatment,
            n_control,
            events_treatment,
            events_control,
        } => {
            if *n_treatment < 10 || *n_control < 10 {
                warnings.push(format!("{}: small sample (n < 10 in an arm)", label));
            }
            let (lo, hi) = (
                (*n_treatment).min(*n_control),
                (*n_treatment).max(*n_control),
            );
            if lo > 0 && hi >= lo * 10 {
                warnings.push(format!("{}: extreme allocation ratio between arms", label));
            }
            match record.outcome.zero_event_arms() {
                ZeroEventArms::Both => {
                    warnings.push(format!("{}: zero events in both arms", label))
                }
                ZeroEventArms::One => warnings.push(format!("{}: zero events in one arm", label)),
                ZeroEventArms::Neither => {}
            }
            if events_treatment == n_treatment || events_control == n_control {
                warnings.push(format!("{}: an arm where every participant had an event", label));
            }
        }
        OutcomeData::Continuous {
            n_treatment,
            n_control,
            ..
        } => {
            if *n_treatment < 10 || *n_control < 10 {
                warnings.push(format!("{}: small sample (n < 10 in an arm)", label));
            }
        }
    }

    if let (Some(es), Some(lower), Some(upper)) =
        (record.effect_size, record.ci_lower, record.ci_upper)
    {
        if es < lower || es > upper {
            warnings.push(format!(
                "{}: effect size {} lies outside its confidence interval [{}, {}]",
                label, es, lower, upper
            ));
        }
    }

    if let Some(year) = record.year {
        let current = chrono::Utc::now().year();
        if year < 1900 || year > current + 1 {
            warnings.push(format!("{}: implausible publication year {}", label, year));
        }
    }

    warnings
}

fn logical(row: usize, field: &str, message: String) -> RowError {
    RowError {
        row,
        field: Some(field.to_string()),
        message,
    }
}

fn missing(row: usize, field: &str) -> RowError {
    RowError {
        row,
        field: Some(field.to_string()),
        message: "required field is missing".to_string(),
    }
}

fn not_numeric(row: usize, field: &str, value: &Value) -> RowError {
    RowError {
        row,
        field: Some(field.to_string()),
        message: format!("value {} is not numeric", value),
    }
}

fn opt_string(row: &RawRow, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn count(row: &RawRow, field: &str, row_no: usize) -> Result<u64, RowError> {
    let value = row.get(field).ok_or_else(|| missing(row_no, field))?;
    let f = numeric(value).ok_or_else(|| not_numeric(row_no, field, value))?;
    if f < 0.0 {
        return Err(logical(
            row_no,
            field,
            format!("{} must be non-negative, got {}", field, f),
        ));
    }
    if f.fract() != 0.0 {
        return Err(logical(
            row_no,
            field,
            format!("{} must be a whole number, got {}", field, f),
        ));
    }
    Ok(f as u64)
}

fn float(row: &RawRow, field: &str, row_no: usize) -> Result<f64, RowError> {
    let value = row.get(field).ok_or_else(|| missing(row_no, field))?;
    let f = numeric(value).ok_or_else(|| not_numeric(row_no, field, value))?;
    if !f.is_finite() {
        return Err(logical(row_no, field, format!("{} is not finite", field)));
    }
    Ok(f)
}

fn opt_float(row: &RawRow, field: &str, row_no: usize) -> Result<Option<f64>, RowError> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let f = numeric(value).ok_or_else(|| not_numeric(row_no, field, value))?;
            Ok(Some(f))
        }
    }
}

fn opt_int(row: &RawRow, field: &str, row_no: usize) -> Result<Option<i32>, RowError> {
    match opt_float(row, field, row_no)? {
        None => Ok(None),
        Some(f) if f.fract() == 0.0 => Ok(Some(f as i32)),
        Some(f) => Err(logical(
            row_no,
            field,
            format!("{} must be a whole number, got {}", field, f),
        )),
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
