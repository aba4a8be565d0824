use super::args::*;
use qbench_core::backend::bq::BqCliBackend;
use qbench_core::backend::fake::FakeBackend;
use qbench_core::backend::QueryBackend;
use qbench_core::config::{builtin_catalog, load_catalog};
use qbench_core::errors::ConfigError;
use qbench_core::model::Catalog;
use qbench_core::runlog::RunLog;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub mod doctor;
pub mod list;
pub mod run;
pub mod validate;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
    pub const PREFLIGHT_FAILED: i32 = 3;
    /// The run log or summary could not be written.
    pub const IO_ERROR: i32 = 4;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        None => run::run(RunArgs::default()).await,
        Some(Command::Run(args)) => run::run(args).await,
        Some(Command::Validate(args)) => validate::run(args),
        Some(Command::Doctor(args)) => doctor::run(args).await,
        Some(Command::List(args)) => list::run(args),
        Some(Command::Version) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("QBENCH_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. With a run log, every event is written to
/// stderr and mirrored into the log file.
pub fn init_logging(run_log: Option<&RunLog>) {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_target(false);

    let _ = match run_log {
        Some(log) => builder
            .with_writer(std::io::stderr.and(log.clone()))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
}

/// Runs `f` with events going to stderr only, before the run log is allowed
/// to receive anything.
pub fn with_stderr_logging<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _guard = subscriber.set_default();
    f()
}

/// Loads `path`, or the builtin catalog when no path is given. Returns the
/// catalog and a label for where it came from.
pub fn load_catalog_or_builtin(
    path: Option<&Path>,
    strict: bool,
) -> Result<(Catalog, String), ConfigError> {
    match path {
        Some(p) => Ok((load_catalog(p, strict)?, p.display().to_string())),
        None => Ok((builtin_catalog()?, "<builtin>".to_string())),
    }
}

pub fn build_backend(
    name: &str,
    bq_path: &Path,
    project_id: Option<String>,
) -> Result<Arc<dyn QueryBackend>, ConfigError> {
    match name {
        "bq" => Ok(Arc::new(BqCliBackend::new(
            PathBuf::from(bq_path),
            project_id,
        ))),
        "fake" => Ok(Arc::new(FakeBackend::new())),
        other => Err(ConfigError(format!(
            "unknown backend '{}' (expected bq|fake)",
            other
        ))),
    }
}
