//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Metapool - session-scoped meta-analysis against an external statistics runtime
#[derive(Parser, Debug)]
#[command(name = "mp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold metapool.yml and the sessions directory
    Init(InitArgs),

    /// Create a new analysis session
    Create(CreateArgs),

    /// Upload study records into a session
    Upload(UploadArgs),

    /// Run the pooled-effect computation
    Compute(ComputeArgs),

    /// Render a forest or funnel plot
    Plot(PlotArgs),

    /// Generate the Markdown summary report
    Report(ReportArgs),

    /// Show one session
    Show(ShowArgs),

    /// List sessions
    Ls(LsArgs),

    /// Remove sessions past the retention threshold
    Clean(CleanArgs),
}

/// Output formats for command results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing metapool.yml
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Session name
    pub name: String,

    /// Effect measure (OR, RR, MD, SMD, HR)
    #[arg(short, long, default_value = "OR")]
    pub measure: String,

    /// Pooling model (fixed, random, auto)
    #[arg(long, default_value = "auto")]
    pub model: String,

    /// Confidence level for intervals
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    /// Skip heterogeneity statistics
    #[arg(long)]
    pub no_heterogeneity: bool,

    /// Run publication-bias tests
    #[arg(long)]
    pub bias: bool,

    /// Run leave-one-out sensitivity analysis
    #[arg(long)]
    pub sensitivity: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Session id
    pub session: String,

    /// File to upload
    pub file: PathBuf,

    /// Upload format (csv, json); inferred from the extension when omitted
    #[arg(short, long)]
    pub format: Option<String>,

    /// Validation level (basic, comprehensive)
    #[arg(short, long, default_value = "basic")]
    pub level: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the compute command
#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Session id
    pub session: String,

    /// Override the session's pooling model for this run
    #[arg(long)]
    pub model: Option<String>,

    /// Override the session's confidence level for this run
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the plot command
#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Session id
    pub session: String,

    /// Plot kind (forest, funnel)
    pub kind: String,
}

/// Arguments for the report command
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Session id
    pub session: String,
}

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Session id
    pub session: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Only sessions with this status (active, analysis, completed, failed, error)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Only sessions whose name contains this substring
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Show what would be removed without removing it
    #[arg(long)]
    pub dry_run: bool,

    /// Override the configured retention threshold, in days
    #[arg(long)]
    pub retention_days: Option<i64>,
}
