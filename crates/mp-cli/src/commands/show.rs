//! Show command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, OutputFormat, ShowArgs};
use crate::commands::common::{build_engine, print_json, print_session_summary};

/// Execute the show command
pub async fn execute(args: &ShowArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;
    let session = engine.get_session(&args.session)?;

    match args.output {
        OutputFormat::Json => print_json(&session)?,
        OutputFormat::Text => {
            print_session_summary(&session);
            if global.verbose && !session.records.is_empty() {
                println!();
                println!("Records:");
                for record in &session.records {
                    println!(
                        "  {} ('{}', n = {})",
                        record.id,
                        record.name,
                        record.outcome.total_n()
                    );
                }
            }
        }
    }
    Ok(())
}
