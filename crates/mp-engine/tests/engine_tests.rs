//! End-to-end workflow tests for the analysis engine.
//!
//! The external runtime is simulated through the backend probes: a binary
//! name that cannot exist (no runtime at all) or `/bin/true` (a runtime
//! that accepts jobs but honors no output contract).

use mp_core::{AnalysisParameters, Config, EffectMeasure, SessionStage, SessionStatus};
use mp_engine::{ComputeOptions, Engine};
use mp_store::ListFilter;
use mp_validate::{UploadFormat, ValidationLevel};
use tempfile::TempDir;

const MISSING: &str = "metapool-test-definitely-missing-binary";

const VALID_CSV: &str = "name,n_treatment,events_treatment,n_control,events_control\n\
                         Trial A,100,15,100,20\n\
                         Trial B,80,20,80,25\n\
                         Trial C,50,8,50,12\n";

fn config(local_binary: &str) -> Config {
    let mut config = Config::default();
    config.runtime.container.binary = MISSING.to_string();
    config.runtime.local.binary = local_binary.to_string();
    config
}

fn engine_without_runtime(tmp: &TempDir) -> Engine {
    Engine::new(&config(MISSING), tmp.path()).unwrap()
}

fn engine_with_noop_runtime(tmp: &TempDir) -> Engine {
    Engine::new(&config("true"), tmp.path()).unwrap()
}

async fn uploaded_session(engine: &Engine) -> String {
    let session = engine
        .create_session("aspirin-or", AnalysisParameters::new(EffectMeasure::Or))
        .await
        .unwrap();
    engine
        .upload_records(
            &session.id,
            VALID_CSV,
            UploadFormat::Csv,
            ValidationLevel::Basic,
        )
        .await
        .unwrap();
    session.id
}

#[tokio::test]
async fn test_upload_advances_to_validation() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);

    let session = engine
        .create_session("aspirin-or", AnalysisParameters::new(EffectMeasure::Or))
        .await
        .unwrap();
    assert_eq!(session.stage, SessionStage::Initialization);

    let outcome = engine
        .upload_records(
            &session.id,
            VALID_CSV,
            UploadFormat::Csv,
            ValidationLevel::Basic,
        )
        .await
        .unwrap();

    assert_eq!(outcome.accepted, 3);
    assert_eq!(outcome.session.stage, SessionStage::Validation);
    assert_eq!(outcome.session.status, SessionStatus::Active);
    assert_eq!(outcome.session.records.len(), 3);
    assert_eq!(outcome.session.files.uploaded.len(), 1);
    assert!(outcome.warnings.is_empty());
}

#[tokio::test]
async fn test_format_error_leaves_session_untouched() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);
    let session = engine
        .create_session("s", AnalysisParameters::new(EffectMeasure::Or))
        .await
        .unwrap();

    let err = engine
        .upload_records(&session.id, "a,b\n1,2,3\n", UploadFormat::Csv, ValidationLevel::Basic)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "format");

    let reloaded = engine.get_session(&session.id).unwrap();
    assert_eq!(reloaded.stage, SessionStage::Initialization);
    assert_eq!(reloaded.status, SessionStatus::Active);
    assert!(reloaded.files.uploaded.is_empty());
}

#[tokio::test]
async fn test_validation_failure_marks_failed_without_advancing() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);
    let session = engine
        .create_session("s", AnalysisParameters::new(EffectMeasure::Or))
        .await
        .unwrap();

    // Both rows have events > n
    let bad = "name,n_treatment,events_treatment,n_control,events_control\n\
               Bad A,10,20,10,5\n\
               Bad B,10,30,10,5\n";
    let err = engine
        .upload_records(&session.id, bad, UploadFormat::Csv, ValidationLevel::Basic)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let reloaded = engine.get_session(&session.id).unwrap();
    assert_eq!(reloaded.stage, SessionStage::DataUpload);
    assert_eq!(reloaded.status, SessionStatus::Failed);
    assert!(reloaded.records.is_empty());
    // The raw upload is still part of the audit trail
    assert_eq!(reloaded.files.uploaded.len(), 1);

    // A corrected upload resumes from the same stage
    let outcome = engine
        .upload_records(&session.id, VALID_CSV, UploadFormat::Csv, ValidationLevel::Basic)
        .await
        .unwrap();
    assert_eq!(outcome.session.stage, SessionStage::Validation);
    assert_eq!(outcome.session.status, SessionStatus::Active);
}

#[tokio::test]
async fn test_compute_without_records_is_refused() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);
    let session = engine
        .create_session("s", AnalysisParameters::new(EffectMeasure::Or))
        .await
        .unwrap();

    let err = engine
        .compute(&session.id, &ComputeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "insufficient_records");
}

#[tokio::test]
async fn test_compute_without_runtime_fails_distinguishably() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);
    let id = uploaded_session(&engine).await;

    let err = engine.compute(&id, &ComputeOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), "runtime");
    assert!(err.to_string().contains("[X001]"));

    let session = engine.get_session(&id).unwrap();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_ne!(session.status, SessionStatus::Completed);
    // Records survive for a retry without re-upload
    assert_eq!(session.records.len(), 3);
    assert_eq!(session.stage, SessionStage::Validation);
}

#[tokio::test]
async fn test_compute_with_contractless_runtime_returns_raw_output() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_with_noop_runtime(&tmp);
    let id = uploaded_session(&engine).await;

    let outcome = engine.compute(&id, &ComputeOptions::default()).await.unwrap();
    assert!(outcome.result.is_none());
    assert!(outcome.raw_output.is_some());

    // No parsed result, no completed claim
    let session = engine.get_session(&id).unwrap();
    assert_eq!(session.stage, SessionStage::Analysis);
    assert_eq!(session.status, SessionStatus::Analysis);
    assert!(session.results.is_none());
}

#[tokio::test]
async fn test_plot_without_artifact_errors() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_with_noop_runtime(&tmp);
    let id = uploaded_session(&engine).await;

    let err = engine
        .plot(&id, "forest".parse().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "runtime");

    let session = engine.get_session(&id).unwrap();
    assert_eq!(session.status, SessionStatus::Error);
    assert!(session.files.generated.is_empty());
}

#[tokio::test]
async fn test_report_requires_results() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);
    let id = uploaded_session(&engine).await;

    let err = engine.report(&id).await.unwrap_err();
    assert_eq!(err.kind(), "no_results");
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);

    let err = engine.get_session("deadbeef").unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let err = engine
        .compute("deadbeef", &ComputeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn test_sessions_survive_engine_restart() {
    let tmp = TempDir::new().unwrap();
    let id = {
        let engine = engine_without_runtime(&tmp);
        uploaded_session(&engine).await
    };

    // A fresh engine over the same data dir rehydrates from disk
    let engine = engine_without_runtime(&tmp);
    let session = engine.get_session(&id).unwrap();
    assert_eq!(session.records.len(), 3);
    assert_eq!(session.stage, SessionStage::Validation);

    let listed = engine.list_sessions(&ListFilter::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[tokio::test]
async fn test_invalid_parameters_rejected_at_creation() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);

    let mut params = AnalysisParameters::new(EffectMeasure::Or);
    params.confidence_level = 1.5;
    let err = engine.create_session("s", params).await.unwrap_err();
    assert_eq!(err.kind(), "invalid");
}

#[tokio::test]
async fn test_cleanup_dry_run_reports_nothing_for_fresh_sessions() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_without_runtime(&tmp);
    uploaded_session(&engine).await;

    let removed = engine.cleanup(None, true).unwrap();
    assert!(removed.is_empty());
}
