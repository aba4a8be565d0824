pub mod model;

use chrono::Utc;

use crate::backend::QueryBackend;
use crate::config::settings::HarnessSettings;
use crate::model::{Catalog, Variant};

use model::*;

pub struct DoctorOptions<'a> {
    pub settings: &'a HarnessSettings,
    /// Catalog plus a label for where it came from.
    pub catalog: Option<(&'a Catalog, String)>,
}

pub async fn doctor(backend: &dyn QueryBackend, opts: &DoctorOptions<'_>) -> DoctorReport {
    let mut notes = vec![];

    let preflight = crate::preflight::check(backend).await;
    if preflight.is_err() {
        notes.push("install the backend client or pass --bq-path".to_string());
    }

    let catalog = opts
        .catalog
        .as_ref()
        .map(|(c, origin)| summarize_catalog(c, origin, &mut notes));

    let s = opts.settings;
    DoctorReport {
        schema_version: 1,
        generated_at: Utc::now().to_rfc3339(),
        qbench_version: env!("CARGO_PKG_VERSION").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        backend: BackendSummary {
            name: backend.name().to_string(),
            preflight_ok: preflight.is_ok(),
            preflight_error: preflight.err().map(|e| e.to_string()),
        },
        catalog,
        settings: SettingsSummary {
            summary_path: s.summary_path.display().to_string(),
            log_path: s.log_path.display().to_string(),
            location: s.location.clone(),
            project_id: s.project_id.clone(),
        },
        notes,
    }
}

fn summarize_catalog(cat: &Catalog, origin: &str, notes: &mut Vec<String>) -> CatalogSummary {
    let groups = cat.groups();
    let unpaired: Vec<String> = groups
        .iter()
        .filter(|g| {
            let has = |v: Variant| {
                cat.queries
                    .iter()
                    .any(|q| q.group.as_deref() == Some(g.as_str()) && q.variant == Some(v))
            };
            !(has(Variant::Baseline) && has(Variant::Optimized))
        })
        .cloned()
        .collect();
    if !unpaired.is_empty() {
        notes.push(format!(
            "groups without a baseline/optimized pair get no delta report: {}",
            unpaired.join(", ")
        ));
    }

    CatalogSummary {
        name: cat.name.clone(),
        origin: origin.to_string(),
        query_count: cat.queries.len() as u32,
        groups,
        unpaired_groups: unpaired,
    }
}
