//! Init command implementation

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::{GlobalArgs, InitArgs};
use mp_core::config::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Metapool project configuration
name: metapool

# Directory holding per-session state
data_dir: sessions

# Sessions inactive longer than this (and not active) are removed by `mp clean`
retention_days: 30

runtime:
  container:
    binary: docker
    image: metapool-r
  local:
    binary: Rscript
  probe_timeout_secs: 5
  job_timeout_secs: 300
  max_concurrent_jobs: 4
"#;

/// Execute the init command
pub async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let root = PathBuf::from(&global.project_dir);
    fs::create_dir_all(&root)
        .with_context(|| format!("failed to create project directory '{}'", root.display()))?;

    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists at '{}' (use --force to overwrite)",
            CONFIG_FILE,
            config_path.display()
        );
    }

    fs::write(&config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write '{}'", config_path.display()))?;
    println!("Wrote {}", config_path.display());

    let sessions_dir = root.join("sessions");
    fs::create_dir_all(&sessions_dir)
        .with_context(|| format!("failed to create '{}'", sessions_dir.display()))?;
    println!("Created {}", sessions_dir.display());

    println!();
    println!("Next steps:");
    println!("  mp create my-analysis --measure OR");
    println!("  mp upload <session-id> studies.csv");
    println!("  mp compute <session-id>");
    Ok(())
}
