use crate::backend::{QueryBackend, RawResponse};
use crate::errors::{BackendError, HarnessError};
use crate::model::{
    Catalog, DefinitionState, JobSubmission, QueryDefinition, QueryOutcome, RunArtifacts,
    SubmitOptions,
};
use crate::report::{Delimiter, SummaryWriter};
use crate::runlog::{Marker, RunLog};
use crate::stats::{parse_job_id, parse_stats};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Drives definitions through a backend one at a time, in catalog order.
pub struct Harness {
    pub backend: Arc<dyn QueryBackend>,
    pub options: SubmitOptions,
    pub log: RunLog,
    pub summary: SummaryWriter,
}

impl Harness {
    pub fn new(
        backend: Arc<dyn QueryBackend>,
        options: SubmitOptions,
        log: RunLog,
        summary: SummaryWriter,
    ) -> Self {
        Self {
            backend,
            options,
            log,
            summary,
        }
    }

    /// Runs every definition exactly once. Per-query failures are recorded on
    /// the outcome; only a summary write failure stops the run, after a
    /// `[FATAL]` line in the log.
    pub async fn run(
        &mut self,
        catalog_name: &str,
        definitions: &[QueryDefinition],
    ) -> Result<RunArtifacts, HarnessError> {
        let started_at = Utc::now().to_rfc3339();
        self.log.line(&format!(
            "run start: catalog={} backend={} queries={} location={}",
            catalog_name,
            self.backend.name(),
            definitions.len(),
            self.options.location
        ));
        tracing::info!(
            event = "run_start",
            catalog = %catalog_name,
            backend = self.backend.name(),
            queries = definitions.len()
        );

        let mut outcomes = Vec::with_capacity(definitions.len());
        for def in definitions {
            match self.run_one(def).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if e.is_fatal() => {
                    self.log.fatal(&format!("{}: {}", def.name, e));
                    tracing::error!(event = "run_aborted", query = %def.name, error = %e);
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        let artifacts = RunArtifacts {
            catalog: catalog_name.to_string(),
            backend: self.backend.name().to_string(),
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            outcomes,
        };
        self.log.line(&format!(
            "run finished: {} completed, {} failed, {} rows in summary={}",
            artifacts.completed(),
            artifacts.failed(),
            self.summary.rows(),
            self.summary.path().display()
        ));
        tracing::info!(
            event = "run_finished",
            completed = artifacts.completed(),
            failed = artifacts.failed()
        );
        Ok(artifacts)
    }

    async fn run_one(&mut self, def: &QueryDefinition) -> Result<QueryOutcome, HarnessError> {
        let mut outcome = QueryOutcome::pending(def);
        self.log.line(&format!("=== {} ===", def.name));
        tracing::info!(event = "query_submit", query = %def.name);

        // Submit
        let submitted_at = Utc::now().to_rfc3339();
        let resp = match self.backend.submit(&def.sql, &self.options).await {
            Ok(r) => r,
            Err(e) => {
                self.log_backend_error("submit", &e);
                let err = HarnessError::Submission {
                    query: def.name.clone(),
                    reason: e.to_string(),
                };
                return Ok(self.fail(outcome, DefinitionState::SubmissionFailed, err));
            }
        };
        self.log_response("submit", &resp);

        let Some(job_id) = parse_job_id(&resp.stdout) else {
            let err = HarnessError::Submission {
                query: def.name.clone(),
                reason: "no job id in submission response".into(),
            };
            return Ok(self.fail(outcome, DefinitionState::SubmissionFailed, err));
        };
        outcome.job = Some(JobSubmission {
            job_id: job_id.clone(),
            submitted_at,
        });
        outcome.state = DefinitionState::Submitted;
        self.log.line(&format!("job id: {}", job_id));

        // Wait
        match self.backend.wait(&job_id, &self.options).await {
            Ok(r) => self.log_response("wait", &r),
            Err(e) => {
                self.log_backend_error("wait", &e);
                let err = HarnessError::Wait {
                    query: def.name.clone(),
                    job_id,
                    source: e,
                };
                return Ok(self.fail(outcome, DefinitionState::WaitFailed, err));
            }
        }

        // Stats
        let stats = match self.backend.get_stats(&job_id, &self.options).await {
            Ok(r) => {
                self.log_response("stats", &r);
                parse_stats(&r.stdout)
            }
            Err(e) => {
                self.log_backend_error("stats", &e);
                Err(e.to_string())
            }
        };
        match stats {
            Ok(s) => {
                if !s.is_complete() {
                    self.note_stats_gap(def, &job_id, "response is missing fields");
                    outcome.stats_missing = true;
                }
                outcome.stats = Some(s);
            }
            Err(reason) => {
                self.note_stats_gap(def, &job_id, &reason);
                outcome.stats_missing = true;
            }
        }
        outcome.state = DefinitionState::Completed;

        if let Some(row) = outcome.summary_row() {
            self.summary.append(&row)?;
        }
        self.log_stats_block(&outcome);
        Ok(outcome)
    }

    fn fail(
        &self,
        mut outcome: QueryOutcome,
        state: DefinitionState,
        err: HarnessError,
    ) -> QueryOutcome {
        self.log
            .marker(Marker::Failure, &format!("{}: {}", outcome.name, err));
        tracing::warn!(event = "query_failed", query = %outcome.name, state = ?state, error = %err);
        outcome.state = state;
        outcome.error = Some(err.to_string());
        outcome
    }

    fn note_stats_gap(&self, def: &QueryDefinition, job_id: &str, reason: &str) {
        let err = HarnessError::StatsUnavailable {
            query: def.name.clone(),
            job_id: job_id.to_string(),
            reason: reason.to_string(),
        };
        self.log.line(&format!("stats gap: {}", err));
        tracing::warn!(event = "stats_unavailable", query = %def.name, job_id = %job_id, reason = %reason);
    }

    fn log_response(&self, step: &str, resp: &RawResponse) {
        self.log.command(&resp.command);
        self.log.response(&format!("{} response", step), &resp.text());
    }

    fn log_backend_error(&self, step: &str, e: &BackendError) {
        self.log.command(&e.command);
        let body = if e.raw.trim().is_empty() {
            e.message.as_str()
        } else {
            e.raw.as_str()
        };
        let label = match e.exit_code {
            Some(code) => format!("{} error (exit {})", step, code),
            None => format!("{} error", step),
        };
        self.log.response(&label, body);
    }

    fn log_stats_block(&self, outcome: &QueryOutcome) {
        let s = outcome.stats.clone().unwrap_or_default();
        let cell = |v: Option<String>| v.unwrap_or_else(|| "unavailable".into());
        self.log.marker(
            Marker::Success,
            &format!(
                "{} (job {})",
                outcome.name,
                outcome
                    .job
                    .as_ref()
                    .map(|j| j.job_id.as_str())
                    .unwrap_or("")
            ),
        );
        self.log.raw(&format!(
            "  duration_ms:     {}\n  bytes_processed: {}\n  slot_ms:         {}",
            cell(s.duration_ms.map(|x| x.to_string())),
            cell(s.bytes_processed.map(|x| x.to_string())),
            cell(s.slot_ms.map(|x| x.to_string())),
        ));
        tracing::info!(
            event = "query_completed",
            query = %outcome.name,
            duration_ms = ?s.duration_ms,
            bytes_processed = ?s.bytes_processed,
            slot_ms = ?s.slot_ms
        );
    }
}

/// Where a run writes its artifacts.
#[derive(Debug, Clone)]
pub struct RunTargets<'a> {
    pub summary: &'a Path,
    pub delimiter: Delimiter,
}

/// Preflight, then a full catalog run. On preflight failure the log holds
/// only the `[FATAL]` line and no summary artifact is created. Any error that
/// ends the run is recorded as a `[FATAL]` line before it is returned.
pub async fn run_benchmark(
    backend: Arc<dyn QueryBackend>,
    catalog: &Catalog,
    options: SubmitOptions,
    log: RunLog,
    targets: RunTargets<'_>,
) -> Result<RunArtifacts, HarnessError> {
    if let Err(e) = crate::preflight::check(backend.as_ref()).await {
        log.fatal(&e.to_string());
        return Err(e);
    }

    let summary = match SummaryWriter::create(targets.summary, targets.delimiter) {
        Ok(s) => s,
        Err(e) => {
            log.fatal(&e.to_string());
            return Err(e);
        }
    };
    let mut harness = Harness::new(backend, options, log, summary);
    harness.run(&catalog.name, &catalog.queries).await
}
