//! Plot command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, PlotArgs};
use crate::commands::common::{build_engine, job_spinner};
use mp_engine::PlotKind;

/// Execute the plot command
pub async fn execute(args: &PlotArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;
    let kind = args.kind.parse::<PlotKind>().map_err(anyhow::Error::msg)?;

    let spinner = job_spinner(&format!("Rendering {} plot...", kind));
    let outcome = engine.plot(&args.session, kind).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    for warning in &outcome.warnings {
        eprintln!("[warn] {}", warning);
    }
    println!(
        "Rendered {} plot on {} backend: {}",
        kind,
        outcome.backend,
        outcome.artifact.display()
    );
    Ok(())
}
