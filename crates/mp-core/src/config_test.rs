use super::*;

#[test]
fn test_parse_minimal_config() {
    let yaml = r#"
name: trial_pool
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.name, "trial_pool");
    assert_eq!(config.data_dir, "sessions");
    assert_eq!(config.retention_days, 30);
    assert_eq!(config.runtime.container.image, "metapool-r");
    assert_eq!(config.runtime.local.binary, "Rscript");
    assert_eq!(config.runtime.max_concurrent_jobs, 4);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: cardio_trials
data_dir: /var/lib/metapool/sessions
retention_days: 7
runtime:
  container:
    binary: podman
    image: cardio-r:latest
  local:
    binary: /opt/R/bin/Rscript
  probe_timeout_secs: 2
  job_timeout_secs: 120
  max_concurrent_jobs: 8
vars:
  reviewer: someone
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.name, "cardio_trials");
    assert_eq!(config.retention_days, 7);
    assert_eq!(config.runtime.container.binary, "podman");
    assert_eq!(config.runtime.container.image, "cardio-r:latest");
    assert_eq!(config.runtime.job_timeout_secs, 120);
    assert_eq!(config.runtime.max_concurrent_jobs, 8);
    assert!(config.vars.contains_key("reviewer"));
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = r#"
name: x
databsae: oops
"#;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_validate_rejects_zero_jobs() {
    let mut config = Config::default();
    config.runtime.max_concurrent_jobs = 0;
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_validate_rejects_negative_retention() {
    let config = Config {
        retention_days: -1,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_data_dir_absolute() {
    let config = Config::default();
    let root = std::path::Path::new("/srv/pool");
    assert_eq!(
        config.data_dir_absolute(root),
        std::path::PathBuf::from("/srv/pool/sessions")
    );

    let config = Config {
        data_dir: "/data/sessions".to_string(),
        ..Config::default()
    };
    assert_eq!(
        config.data_dir_absolute(root),
        std::path::PathBuf::from("/data/sessions")
    );
}

#[test]
fn test_load_missing_file() {
    let err = Config::load(std::path::Path::new("/nonexistent/metapool.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_or_default_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_or_default(dir.path()).unwrap();
    assert_eq!(config.name, "metapool");
}
