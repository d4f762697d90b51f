use super::*;
use crate::decode::{decode, UploadFormat};

fn binary_csv() -> &'static str {
    "name,n_treatment,events_treatment,n_control,events_control\n\
     Trial A,100,15,100,20\n\
     Trial B,80,20,80,25\n\
     Trial C,50,8,50,12\n"
}

#[test]
fn test_accepts_valid_binary_batch() {
    let rows = decode(binary_csv(), UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records.len(), 3);
    assert!(batch.warnings.is_empty());
    assert_eq!(batch.records[0].name, "Trial A");
    assert!(matches!(
        batch.records[0].outcome,
        OutcomeData::Binary {
            n_treatment: 100,
            events_treatment: 15,
            ..
        }
    ));
}

#[test]
fn test_aliased_headers_accepted() {
    let raw = "study,n_exp,events_e,n_ctrl,events_c\nTrial A,100,15,100,20\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Rr, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records.len(), 1);
    assert!(matches!(
        batch.records[0].outcome,
        OutcomeData::Binary { n_control: 100, .. }
    ));
}

#[test]
fn test_events_exceeding_n_always_fails_row() {
    // One bad row among three: the batch survives, the row is skipped
    let raw = "name,n_treatment,events_treatment,n_control,events_control\n\
               Good A,100,15,100,20\n\
               Bad,10,20,10,5\n\
               Good B,80,20,80,25\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.warnings.len(), 1);
    assert!(batch.warnings[0].contains("events_treatment (20) exceeds n_treatment (10)"));
}

#[test]
fn test_majority_failure_rejects_batch() {
    let raw = "name,n_treatment,events_treatment,n_control,events_control\n\
               Bad A,10,20,10,5\n\
               Bad B,10,30,10,5\n\
               Good,100,15,100,20\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let err = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap_err();
    match err {
        ValidateError::BatchRejected { failed, total, errors } => {
            assert_eq!(failed, 2);
            assert_eq!(total, 3);
            assert!(!errors.is_empty());
        }
        other => panic!("expected BatchRejected, got {:?}", other),
    }
}

#[test]
fn test_exactly_half_failing_is_not_rejected() {
    let raw = "name,n_treatment,events_treatment,n_control,events_control\n\
               Bad,10,20,10,5\n\
               Good,100,15,100,20\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records.len(), 1);
}

#[test]
fn test_missing_required_field_is_row_error() {
    let raw = "name,n_treatment,events_treatment\nTrial A,100,15\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let err = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap_err();
    let errors = err.row_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field.as_deref(), Some("n_control"));
}

#[test]
fn test_continuous_requires_positive_sd() {
    let raw = "name,n_treatment,mean_treatment,sd_treatment,n_control,mean_control,sd_control\n\
               Trial A,40,12.1,0,38,13.0,2.2\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let err = validate_rows(&rows, EffectMeasure::Md, ValidationLevel::Basic).unwrap_err();
    assert!(err.to_string().contains("sd_treatment"));
}

#[test]
fn test_continuous_batch_accepted() {
    let raw = "name,n_treatment,mean_treatment,sd_treatment,n_control,mean_control,sd_control\n\
               Trial A,40,12.1,2.4,38,13.0,2.2\n\
               Trial B,55,11.8,3.1,60,12.9,2.8\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Smd, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records.len(), 2);
    assert!(matches!(
        batch.records[1].outcome,
        OutcomeData::Continuous { n_treatment: 55, .. }
    ));
}

#[test]
fn test_zero_events_both_arms_is_not_a_validation_failure() {
    let raw = "name,n_treatment,events_treatment,n_control,events_control\n\
               Null Trial,50,0,50,0\n\
               Trial A,100,15,100,20\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records.len(), 2);
}

#[test]
fn test_inverted_ci_is_row_error() {
    let raw = "name,n_treatment,events_treatment,n_control,events_control,ci_lower,ci_upper\n\
               Trial A,100,15,100,20,2.0,0.5\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let err = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap_err();
    assert!(err.to_string().contains("ci_lower"));
}

#[test]
fn test_comprehensive_flags_small_samples() {
    let raw = "name,n_treatment,events_treatment,n_control,events_control\n\
               Tiny,5,1,5,2\n\
               Trial A,100,15,100,20\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();

    let basic = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap();
    assert!(basic.warnings.is_empty());

    let full = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Comprehensive).unwrap();
    assert_eq!(full.records.len(), 2);
    assert!(full.warnings.iter().any(|w| w.contains("small sample")));
}

#[test]
fn test_comprehensive_flags_implausible_year() {
    let raw = "name,year,n_treatment,events_treatment,n_control,events_control\n\
               Ancient,1492,100,15,100,20\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Comprehensive).unwrap();
    assert!(batch
        .warnings
        .iter()
        .any(|w| w.contains("implausible publication year")));
}

#[test]
fn test_numeric_strings_accepted() {
    let raw = r#"[{"name": "Trial A", "n_treatment": "100", "events_treatment": "15",
                   "n_control": "100", "events_control": "20"}]"#;
    let rows = decode(raw, UploadFormat::Json).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records.len(), 1);
}

#[test]
fn test_empty_upload_rejected() {
    let err = validate_rows(&[], EffectMeasure::Or, ValidationLevel::Basic).unwrap_err();
    assert!(matches!(err, ValidateError::EmptyUpload));
}

#[test]
fn test_generated_ids_are_stable() {
    let raw = "n_treatment,events_treatment,n_control,events_control\n100,15,100,20\n";
    let rows = decode(raw, UploadFormat::Csv).unwrap();
    let batch = validate_rows(&rows, EffectMeasure::Or, ValidationLevel::Basic).unwrap();
    assert_eq!(batch.records[0].id, "record-1");
    assert_eq!(batch.records[0].name, "record-1");
}
