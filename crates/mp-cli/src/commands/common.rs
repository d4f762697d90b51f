//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mp_core::{Config, Session};
use mp_engine::Engine;

use crate::cli::GlobalArgs;

/// Resolve configuration and project root from the global arguments
pub(crate) fn load_config(global: &GlobalArgs) -> Result<(Config, PathBuf)> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("failed to load config '{}'", path))?,
        None => Config::load_or_default(&root)
            .with_context(|| format!("failed to load config from '{}'", root.display()))?,
    };
    Ok((config, root))
}

/// Build the engine for the configured project
pub(crate) fn build_engine(global: &GlobalArgs) -> Result<Engine> {
    let (config, root) = load_config(global)?;
    let engine = Engine::new(&config, &root)?;
    Ok(engine)
}

/// Print any serializable value as pretty JSON
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Spinner shown while an external-runtime job is in flight
pub(crate) fn job_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// One-session text summary shared by `create`, `show`, and `upload`
pub(crate) fn print_session_summary(session: &Session) {
    println!("Session {} ('{}')", session.id, session.name);
    println!("  status:   {}", session.status);
    println!("  stage:    {}", session.stage);
    println!(
        "  measure:  {} (model: {}, confidence: {})",
        session.parameters.effect_measure,
        session.parameters.model,
        session.parameters.confidence_level
    );
    println!("  records:  {}", session.records.len());
    println!(
        "  files:    {} uploaded, {} generated",
        session.files.uploaded.len(),
        session.files.generated.len()
    );
    println!(
        "  updated:  {}",
        session.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(results) = &session.results {
        println!(
            "  pooled:   {:.4} [{:.4}, {:.4}] ({} model, p = {:.4})",
            results.overall.estimate,
            results.overall.ci_lower,
            results.overall.ci_upper,
            results.model.kind,
            results.overall.p_value
        );
    }
}
