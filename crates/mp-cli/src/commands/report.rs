//! Report command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, ReportArgs};
use crate::commands::common::build_engine;

/// Execute the report command
pub async fn execute(args: &ReportArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;
    let outcome = engine.report(&args.session).await?;
    println!("Wrote {}", outcome.path.display());
    Ok(())
}
