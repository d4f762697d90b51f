//! Clean command implementation

use anyhow::Result;
use chrono::Duration;

use crate::cli::{CleanArgs, GlobalArgs};
use crate::commands::common::build_engine;

/// Execute the clean command
pub async fn execute(args: &CleanArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;
    let retention = args.retention_days.map(Duration::days);

    let removed = engine.cleanup(retention, args.dry_run)?;

    if removed.is_empty() {
        println!("Nothing to clean");
        return Ok(());
    }

    for id in &removed {
        if args.dry_run {
            println!("  Would remove: {}", id);
        } else {
            println!("  Removed: {}", id);
        }
    }
    println!();
    println!(
        "{} {} session{}",
        if args.dry_run { "Would remove" } else { "Removed" },
        removed.len(),
        if removed.len() == 1 { "" } else { "s" }
    );
    Ok(())
}
