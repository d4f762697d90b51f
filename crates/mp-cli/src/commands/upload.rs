//! Upload command implementation

use anyhow::{anyhow, Context, Result};
use std::fs;

use crate::cli::{GlobalArgs, OutputFormat, UploadArgs};
use crate::commands::common::{build_engine, print_json, print_session_summary};
use mp_validate::{UploadFormat, ValidationLevel};

/// Execute the upload command
pub async fn execute(args: &UploadArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;

    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read '{}'", args.file.display()))?;

    let format = match &args.format {
        Some(s) => s.parse::<UploadFormat>().map_err(anyhow::Error::msg)?,
        None => UploadFormat::from_path(&args.file).ok_or_else(|| {
            anyhow!(
                "cannot infer upload format from '{}'; pass --format csv|json",
                args.file.display()
            )
        })?,
    };
    let level = args
        .level
        .parse::<ValidationLevel>()
        .map_err(anyhow::Error::msg)?;

    let outcome = engine
        .upload_records(&args.session, &raw, format, level)
        .await?;

    for warning in &outcome.warnings {
        eprintln!("[warn] {}", warning);
    }

    match args.output {
        OutputFormat::Json => print_json(&outcome.session)?,
        OutputFormat::Text => {
            println!(
                "Accepted {} record(s) into session {}",
                outcome.accepted, outcome.session.id
            );
            print_session_summary(&outcome.session);
        }
    }
    Ok(())
}
