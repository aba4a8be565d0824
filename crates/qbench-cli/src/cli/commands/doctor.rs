use qbench_core::config::settings::SettingsFile;
use qbench_core::doctor::{doctor, DoctorOptions};

use super::{build_backend, exit_codes, init_logging, load_catalog_or_builtin};
use crate::cli::args::DoctorArgs;

pub async fn run(args: DoctorArgs) -> anyhow::Result<i32> {
    init_logging(None);

    let overrides = SettingsFile {
        catalog: args.catalog.clone(),
        bq_path: args.bq_path.clone(),
        ..Default::default()
    };
    let settings = match SettingsFile::load_if_exists(&args.config)
        .and_then(|f| f.merge(overrides).resolve())
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let backend = build_backend(&args.backend, &settings.bq_path, settings.project_id.clone())?;
    let catalog = load_catalog_or_builtin(settings.catalog_path.as_deref(), false);
    let mut catalog_error = None;
    let catalog_ref = match &catalog {
        Ok((c, origin)) => Some((c, origin.clone())),
        Err(e) => {
            catalog_error = Some(e.to_string());
            None
        }
    };

    let mut report = doctor(
        backend.as_ref(),
        &DoctorOptions {
            settings: &settings,
            catalog: catalog_ref,
        },
    )
    .await;
    if let Some(e) = catalog_error {
        report.notes.push(format!("catalog did not load: {}", e));
    }

    let rendered = if args.format == "json" {
        serde_json::to_string_pretty(&report)?
    } else {
        let mut s = String::new();
        s.push_str(&format!("qbench doctor (v{})\n", report.qbench_version));
        s.push_str(&format!(
            "Platform: {}/{}\n",
            report.platform.os, report.platform.arch
        ));
        s.push_str(&format!(
            "Backend: {} ({})\n",
            report.backend.name,
            if report.backend.preflight_ok {
                "ok".to_string()
            } else {
                report
                    .backend
                    .preflight_error
                    .clone()
                    .unwrap_or_else(|| "unavailable".into())
            }
        ));
        if let Some(c) = &report.catalog {
            s.push_str(&format!(
                "Catalog: {} ({}) {} queries, groups: {}\n",
                c.name,
                c.origin,
                c.query_count,
                c.groups.join(", ")
            ));
        }
        s.push_str(&format!(
            "Summary: {}\nLog: {}\nLocation: {}\n",
            report.settings.summary_path, report.settings.log_path, report.settings.location
        ));
        if !report.notes.is_empty() {
            s.push_str("\nNotes:\n");
            for n in &report.notes {
                s.push_str(&format!("- {}\n", n));
            }
        }
        s
    };

    if let Some(p) = args.out {
        std::fs::write(&p, rendered)?;
        eprintln!("wrote file: {}", p.display());
    } else if args.format == "json" {
        println!("{}", rendered);
    } else {
        eprintln!("{}", rendered);
    }

    if report.backend.preflight_ok {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::PREFLIGHT_FAILED)
    }
}
