use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "qbench",
    version,
    about = "Benchmark baseline vs. optimized warehouse queries and record their cost"
)]
pub struct Cli {
    /// Defaults to `run` with default settings.
    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every catalog query once and write the summary
    Run(RunArgs),
    /// Load and check a catalog without running it
    Validate(ValidateArgs),
    /// Check the backend client and print the effective settings
    Doctor(DoctorArgs),
    /// Print catalog query names in run order
    List(ListArgs),
    Version,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Optional settings file; flags override its values
    #[arg(long, default_value = "qbench.yaml")]
    pub config: PathBuf,

    /// Catalog YAML (defaults to the builtin catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Summary artifact, recreated on every run
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Verbose run log, recreated on every run
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Also write a JSON artifact with every query's outcome
    #[arg(long)]
    pub json: Option<PathBuf>,

    #[arg(long, env = "QBENCH_LOCATION")]
    pub location: Option<String>,

    #[arg(long, env = "QBENCH_PROJECT")]
    pub project_id: Option<String>,

    /// Path to the bq client
    #[arg(long, env = "QBENCH_BQ")]
    pub bq_path: Option<PathBuf>,

    /// backend: bq|fake (fake produces synthetic stats without a warehouse)
    #[arg(long, default_value = "bq")]
    pub backend: String,

    /// tab-delimited summary instead of comma-delimited
    #[arg(long)]
    pub tsv: bool,

    /// reject unknown catalog fields instead of warning
    #[arg(long)]
    pub strict: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        RunArgs::parse_from(["run"])
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json
}

#[derive(clap::Args, Debug, Clone)]
pub struct DoctorArgs {
    #[arg(long, default_value = "qbench.yaml")]
    pub config: PathBuf,

    #[arg(long)]
    pub catalog: Option<PathBuf>,

    #[arg(long, env = "QBENCH_BQ")]
    pub bq_path: Option<PathBuf>,

    #[arg(long, default_value = "bq")]
    pub backend: String,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json

    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}
