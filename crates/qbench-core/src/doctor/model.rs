use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub schema_version: u32,    // 1
    pub generated_at: String,   // rfc3339
    pub qbench_version: String, // e.g. "0.3.0"
    pub platform: PlatformInfo,

    pub backend: BackendSummary,
    pub catalog: Option<CatalogSummary>,
    pub settings: SettingsSummary,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSummary {
    pub name: String,
    pub preflight_ok: bool,
    pub preflight_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub name: String,
    pub origin: String,
    pub query_count: u32,
    pub groups: Vec<String>,
    /// Groups that lack either a baseline or an optimized variant.
    pub unpaired_groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSummary {
    pub summary_path: String,
    pub log_path: String,
    pub location: String,
    pub project_id: Option<String>,
}
