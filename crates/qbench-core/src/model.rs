use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub version: u32,
    #[serde(default = "default_catalog_name")]
    pub name: String,
    /// Default execution location for every query in the catalog.
    #[serde(default)]
    pub location: Option<String>,
    pub queries: Vec<QueryDefinition>,
}

fn default_catalog_name() -> String {
    "catalog".to_string()
}

impl Catalog {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(|q| q.name.as_str())
    }

    pub fn groups(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for q in &self.queries {
            if let Some(g) = &q.group {
                if !out.contains(g) {
                    out.push(g.clone());
                }
            }
        }
        out
    }
}

/// One named benchmark case. The SQL text is opaque to the harness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryDefinition {
    pub name: String,
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl QueryDefinition {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            group: None,
            variant: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Baseline,
    Optimized,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Baseline => "baseline",
            Variant::Optimized => "optimized",
        }
    }
}

/// Options sent with every job submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitOptions {
    pub use_cache: bool,
    /// Create the job and return immediately instead of waiting for it.
    pub nosync: bool,
    pub format: String,
    pub location: String,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            use_cache: false,
            nosync: true,
            format: "json".into(),
            location: "US".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSubmission {
    pub job_id: String,
    pub submitted_at: String, // rfc3339
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionStats {
    pub start_time_ms: Option<f64>,
    pub end_time_ms: Option<f64>,
    pub duration_ms: Option<i64>,
    pub bytes_processed: Option<u64>,
    pub slot_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_billed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
}

impl ExecutionStats {
    pub fn is_complete(&self) -> bool {
        self.duration_ms.is_some() && self.bytes_processed.is_some() && self.slot_ms.is_some()
    }
}

/// A persisted summary line. Missing stats serialize as empty cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    pub query_name: String,
    pub job_id: String,
    pub duration_ms: Option<i64>,
    pub bytes_processed: Option<u64>,
    pub slot_ms: Option<u64>,
}

impl SummaryRow {
    pub fn from_stats(query_name: &str, job_id: &str, stats: &ExecutionStats) -> Self {
        Self {
            query_name: query_name.to_string(),
            job_id: job_id.to_string(),
            duration_ms: stats.duration_ms,
            bytes_processed: stats.bytes_processed,
            slot_ms: stats.slot_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionState {
    Pending,
    Submitted,
    Completed,
    SubmissionFailed,
    WaitFailed,
}

impl DefinitionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DefinitionState::Completed
                | DefinitionState::SubmissionFailed
                | DefinitionState::WaitFailed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub name: String,
    pub state: DefinitionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    pub job: Option<JobSubmission>,
    pub stats: Option<ExecutionStats>,
    #[serde(default)]
    pub stats_missing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn pending(def: &QueryDefinition) -> Self {
        Self {
            name: def.name.clone(),
            state: DefinitionState::Pending,
            group: def.group.clone(),
            variant: def.variant,
            job: None,
            stats: None,
            stats_missing: false,
            error: None,
        }
    }

    pub fn summary_row(&self) -> Option<SummaryRow> {
        if self.state != DefinitionState::Completed {
            return None;
        }
        let job = self.job.as_ref()?;
        let stats = self.stats.clone().unwrap_or_default();
        Some(SummaryRow::from_stats(&self.name, &job.job_id, &stats))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub catalog: String,
    pub backend: String,
    pub started_at: String,
    pub finished_at: String,
    pub outcomes: Vec<QueryOutcome>,
}

impl RunArtifacts {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == DefinitionState::Completed)
            .count()
    }

    /// Definitions that ended in a failure state. Anything still pending or
    /// submitted (an aborted run) counts as neither completed nor failed.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state.is_terminal() && o.state != DefinitionState::Completed)
            .count()
    }
}
