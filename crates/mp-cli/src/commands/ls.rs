//! Ls command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, LsArgs, OutputFormat};
use crate::commands::common::{build_engine, print_json};
use mp_core::SessionStatus;
use mp_store::ListFilter;

/// Execute the ls command
pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;

    let filter = ListFilter {
        status: args
            .status
            .as_deref()
            .map(str::parse::<SessionStatus>)
            .transpose()
            .map_err(anyhow::Error::msg)?,
        name_contains: args.name.clone(),
    };
    let sessions = engine.list_sessions(&filter)?;

    match args.output {
        OutputFormat::Json => print_json(&sessions)?,
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No sessions found");
                return Ok(());
            }
            println!(
                "{:<10} {:<24} {:<10} {:<14} {:>7}  {}",
                "ID", "NAME", "STATUS", "STAGE", "RECORDS", "UPDATED"
            );
            for session in &sessions {
                println!(
                    "{:<10} {:<24} {:<10} {:<14} {:>7}  {}",
                    session.id,
                    truncate(&session.name, 24),
                    session.status.to_string(),
                    session.stage.to_string(),
                    session.records.len(),
                    session.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{}\u{2026}", cut)
    }
}
