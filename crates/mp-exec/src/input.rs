//! Runtime input construction.
//!
//! Applies the dispatch policies that must be decided *before* the external
//! runtime sees the batch: the zero-event exclusion rule, continuity
//! correction flags, and `auto` model resolution.

use serde::Serialize;

use crate::error::{ExecError, ExecResult};
use mp_core::{AnalysisParameters, EffectMeasure, ResolvedModel, StudyRecord, ZeroEventArms};

/// One record as the runtime receives it
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeRecord {
    /// The validated record
    #[serde(flatten)]
    pub record: StudyRecord,

    /// Set when exactly one arm has zero events; the runtime applies its
    /// continuity correction to these
    pub continuity_correction: bool,
}

/// The well-known input file the runtime reads from its working directory
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeInput {
    /// Effect measure to pool
    pub effect_measure: EffectMeasure,

    /// Model after `auto` resolution
    pub model: ResolvedModel,

    /// Hartung-Knapp adjustment (random-effects only)
    pub hartung_knapp: bool,

    /// Confidence level for intervals
    pub confidence_level: f64,

    /// Whether to compute heterogeneity statistics
    pub heterogeneity: bool,

    /// Whether to run bias tests
    pub bias_assessment: bool,

    /// Whether to run leave-one-out sensitivity analysis
    pub sensitivity_analysis: bool,

    /// Records surviving the zero-event policy
    pub records: Vec<RuntimeRecord>,
}

/// Build the runtime input from a session's validated records.
///
/// Records with zero events in both arms are excluded with a warning;
/// records with zero events in exactly one arm are retained and flagged.
/// `auto` resolves against the count of records actually dispatched.
pub fn prepare_input(
    records: &[StudyRecord],
    params: &AnalysisParameters,
) -> ExecResult<(RuntimeInput, Vec<String>)> {
    if records.is_empty() {
        return Err(ExecError::NoUsableRecords {
            reason: "the session has no validated records".to_string(),
        });
    }

    let mut warnings = Vec::new();
    let mut dispatched = Vec::new();

    for record in records {
        match record.outcome.zero_event_arms() {
            ZeroEventArms::Both => {
                warnings.push(format!(
                    "record '{}' excluded: zero events in both arms",
                    record.name
                ));
            }
            ZeroEventArms::One => {
                log::debug!(
                    "record '{}' flagged for continuity correction (zero-event arm)",
                    record.name
                );
                dispatched.push(RuntimeRecord {
                    record: record.clone(),
                    continuity_correction: true,
                });
            }
            ZeroEventArms::Neither => {
                dispatched.push(RuntimeRecord {
                    record: record.clone(),
                    continuity_correction: false,
                });
            }
        }
    }

    if dispatched.is_empty() {
        return Err(ExecError::NoUsableRecords {
            reason: "every record was excluded by the zero-event policy".to_string(),
        });
    }

    let model = params.model.resolve(dispatched.len());
    let input = RuntimeInput {
        effect_measure: params.effect_measure,
        model,
        hartung_knapp: model == ResolvedModel::Random,
        confidence_level: params.confidence_level,
        heterogeneity: params.heterogeneity,
        bias_assessment: params.bias_assessment,
        sensitivity_analysis: params.sensitivity_analysis,
        records: dispatched,
    };

    Ok((input, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::OutcomeData;

    fn binary(name: &str, et: u64, ec: u64) -> StudyRecord {
        StudyRecord {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            year: None,
            outcome: OutcomeData::Binary {
                n_treatment: 100,
                n_control: 100,
                events_treatment: et,
                events_control: ec,
            },
            effect_size: None,
            ci_lower: None,
            ci_upper: None,
            weight: None,
            quality_score: None,
        }
    }

    fn records(n: usize) -> Vec<StudyRecord> {
        (0..n).map(|i| binary(&format!("Trial {}", i), 10 + i as u64, 12)).collect()
    }

    #[test]
    fn test_double_zero_excluded_with_warning() {
        let recs = vec![binary("Null", 0, 0), binary("A", 15, 20)];
        let (input, warnings) =
            prepare_input(&recs, &AnalysisParameters::new(EffectMeasure::Or)).unwrap();
        assert_eq!(input.records.len(), 1);
        assert_eq!(input.records[0].record.name, "A");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("zero events in both arms"));
    }

    #[test]
    fn test_single_zero_retained_and_flagged() {
        let recs = vec![binary("Sparse", 0, 7), binary("A", 15, 20)];
        let (input, warnings) =
            prepare_input(&recs, &AnalysisParameters::new(EffectMeasure::Or)).unwrap();
        assert_eq!(input.records.len(), 2);
        assert!(input.records[0].continuity_correction);
        assert!(!input.records[1].continuity_correction);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_all_excluded_is_an_error() {
        let recs = vec![binary("Null A", 0, 0), binary("Null B", 0, 0)];
        let err = prepare_input(&recs, &AnalysisParameters::new(EffectMeasure::Or)).unwrap_err();
        assert!(matches!(err, ExecError::NoUsableRecords { .. }));
    }

    #[test]
    fn test_auto_model_boundary() {
        let params = AnalysisParameters::new(EffectMeasure::Or);

        let (input, _) = prepare_input(&records(4), &params).unwrap();
        assert_eq!(input.model, ResolvedModel::Fixed);
        assert!(!input.hartung_knapp);

        let (input, _) = prepare_input(&records(5), &params).unwrap();
        assert_eq!(input.model, ResolvedModel::Random);
        assert!(input.hartung_knapp);
    }

    #[test]
    fn test_auto_counts_dispatched_records_not_uploaded() {
        // 5 uploaded, one excluded: 4 dispatched resolves to fixed
        let mut recs = records(4);
        recs.push(binary("Null", 0, 0));
        let (input, _) =
            prepare_input(&recs, &AnalysisParameters::new(EffectMeasure::Or)).unwrap();
        assert_eq!(input.records.len(), 4);
        assert_eq!(input.model, ResolvedModel::Fixed);
    }

    #[test]
    fn test_input_serializes_flattened_records() {
        let (input, _) = prepare_input(
            &[binary("A", 15, 20)],
            &AnalysisParameters::new(EffectMeasure::Or),
        )
        .unwrap();
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["effect_measure"], "OR");
        assert_eq!(value["records"][0]["n_treatment"], 100);
        assert_eq!(value["records"][0]["continuity_correction"], false);
    }
}
