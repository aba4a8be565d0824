use super::{
    build_backend, exit_codes, init_logging, load_catalog_or_builtin, with_stderr_logging,
};
use crate::cli::args::RunArgs;
use qbench_core::config::settings::{SettingsFile, DEFAULT_LOG};
use qbench_core::engine::runner::{run_benchmark, RunTargets};
use qbench_core::errors::HarnessError;
use qbench_core::model::SubmitOptions;
use qbench_core::report::console::render_summary;
use qbench_core::runlog::RunLog;
use std::path::PathBuf;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut merged = match SettingsFile::load_if_exists(&args.config) {
        Ok(file) => file.merge(cli_overrides(&args)),
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let log_path = merged
        .log
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG));
    let log = match RunLog::create(&log_path) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[FATAL] {}", e);
            return Ok(exit_codes::IO_ERROR);
        }
    };

    // Nothing but a [FATAL] line may reach the log before preflight passes,
    // so catalog warnings go to stderr only.
    let loaded = with_stderr_logging(|| {
        load_catalog_or_builtin(merged.catalog.as_deref(), args.strict)
    });
    init_logging(Some(&log));
    let (catalog, origin) = match loaded {
        Ok(c) => c,
        Err(e) => return fail_config(&log, &e),
    };

    // Flags and the settings file win over the catalog's own location.
    if merged.location.is_none() {
        merged.location = catalog.location.clone();
    }
    let settings = match merged.resolve() {
        Ok(s) => s,
        Err(e) => return fail_config(&log, &e),
    };

    let backend = match build_backend(&args.backend, &settings.bq_path, settings.project_id.clone()) {
        Ok(b) => b,
        Err(e) => return fail_config(&log, &e),
    };

    let options = SubmitOptions {
        location: settings.location.clone(),
        ..SubmitOptions::default()
    };
    let targets = RunTargets {
        summary: &settings.summary_path,
        delimiter: settings.delimiter,
    };
    let artifacts = match run_benchmark(backend, &catalog, options, log.clone(), targets).await {
        Ok(a) => a,
        Err(HarnessError::Preflight(msg)) => {
            eprintln!("[FATAL] preflight failed: {}", msg);
            return Ok(exit_codes::PREFLIGHT_FAILED);
        }
        Err(e @ HarnessError::Io { .. }) => {
            eprintln!("[FATAL] {}", e);
            return Ok(exit_codes::IO_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(p) = &settings.json_path {
        if let Err(e) = qbench_core::report::json::write_json(&artifacts, p) {
            log.fatal(&format!("failed to write {}: {:#}", p.display(), e));
            eprintln!("[FATAL] failed to write {}: {:#}", p.display(), e);
            return Ok(exit_codes::IO_ERROR);
        }
    }

    let text = format!(
        "{}catalog: {}\nsummary: {}\nlog: {}\n",
        render_summary(&artifacts.outcomes),
        origin,
        settings.summary_path.display(),
        settings.log_path.display()
    );
    eprint!("{}", text);
    log.raw(&text);

    // Per-query failures are reported, not turned into an exit code.
    Ok(exit_codes::OK)
}

fn fail_config(log: &RunLog, e: &dyn std::fmt::Display) -> anyhow::Result<i32> {
    log.fatal(&format!("config error: {}", e));
    eprintln!("config error: {}", e);
    Ok(exit_codes::CONFIG_ERROR)
}

fn cli_overrides(args: &RunArgs) -> SettingsFile {
    SettingsFile {
        summary: args.summary.clone(),
        log: args.log.clone(),
        json: args.json.clone(),
        catalog: args.catalog.clone(),
        location: args.location.clone(),
        project_id: args.project_id.clone(),
        bq_path: args.bq_path.clone(),
        delimiter: if args.tsv { Some("tab".into()) } else { None },
    }
}
