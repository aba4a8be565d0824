use super::{QueryBackend, RawResponse};
use crate::errors::{BackendError, HarnessError};
use crate::model::SubmitOptions;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// What the fake backend does for one query text.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeScript {
    Succeed {
        start_ms: f64,
        end_ms: f64,
        bytes: u64,
        slot_ms: u64,
    },
    /// Submission succeeds but the response has no usable job id.
    NoJobId(String),
    SubmitError(String),
    WaitError(String),
    StatsError(String),
    /// Submission succeeds and `show` returns this raw text.
    RawStats(String),
}

#[derive(Debug, Default)]
struct FakeState {
    next_job: u64,
    jobs: HashMap<String, FakeScript>,
    calls: Vec<String>,
}

/// Scripted backend for tests and dry runs. Unscripted queries succeed with
/// synthetic stats derived from the query text.
#[derive(Debug, Default)]
pub struct FakeBackend {
    scripts: HashMap<String, FakeScript>,
    preflight_error: Option<String>,
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, sql: impl Into<String>, script: FakeScript) -> Self {
        self.scripts.insert(sql.into(), script);
        self
    }

    pub fn failing_preflight(mut self, reason: impl Into<String>) -> Self {
        self.preflight_error = Some(reason.into());
        self
    }

    /// Every call made so far, as `op:arg` strings.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    fn synthetic(sql: &str, n: u64) -> FakeScript {
        let len = sql.len() as u64;
        let start = 1_700_000_000_000.0 + (n as f64) * 10_000.0;
        FakeScript::Succeed {
            start_ms: start,
            end_ms: start + 100.0 + len as f64,
            bytes: len * 1_048_576,
            slot_ms: len * 37,
        }
    }

    fn record(&self, call: String) {
        if let Ok(mut s) = self.state.lock() {
            s.calls.push(call);
        }
    }

    fn job(&self, job_id: &str) -> Option<FakeScript> {
        self.state.lock().ok()?.jobs.get(job_id).cloned()
    }
}

#[async_trait]
impl QueryBackend for FakeBackend {
    async fn preflight(&self) -> Result<(), HarnessError> {
        match &self.preflight_error {
            Some(r) => Err(HarnessError::Preflight(r.clone())),
            None => Ok(()),
        }
    }

    async fn submit(&self, sql: &str, opts: &SubmitOptions) -> Result<RawResponse, BackendError> {
        let command = format!("fake query --location={} <{} bytes>", opts.location, sql.len());
        self.record(format!("submit:{}", sql));

        let mut state = self
            .state
            .lock()
            .map_err(|_| BackendError::new(&command, "fake state poisoned"))?;
        state.next_job += 1;
        let n = state.next_job;
        let script = self
            .scripts
            .get(sql)
            .cloned()
            .unwrap_or_else(|| Self::synthetic(sql, n));

        match script {
            FakeScript::SubmitError(msg) => {
                Err(BackendError::new(command, msg.clone()).with_raw(msg))
            }
            FakeScript::NoJobId(raw) => Ok(RawResponse {
                command,
                stdout: raw,
                stderr: String::new(),
            }),
            other => {
                let job_id = format!("fake_job_{}", n);
                state.jobs.insert(job_id.clone(), other);
                let body = serde_json::json!({
                    "jobReference": {
                        "projectId": "fake",
                        "jobId": job_id,
                        "location": opts.location,
                    },
                    "status": { "state": "RUNNING" }
                });
                Ok(RawResponse {
                    command,
                    stdout: body.to_string(),
                    stderr: String::new(),
                })
            }
        }
    }

    async fn wait(&self, job_id: &str, _opts: &SubmitOptions) -> Result<RawResponse, BackendError> {
        let command = format!("fake wait {}", job_id);
        self.record(format!("wait:{}", job_id));
        match self.job(job_id) {
            None => Err(BackendError::new(command, format!("Not found: Job {}", job_id))),
            Some(FakeScript::WaitError(msg)) => {
                Err(BackendError::new(command, msg.clone())
                    .with_exit_code(Some(1))
                    .with_raw(msg))
            }
            Some(_) => Ok(RawResponse {
                command,
                stdout: format!("Job {} ... (0s) Current status: DONE", job_id),
                stderr: String::new(),
            }),
        }
    }

    async fn get_stats(
        &self,
        job_id: &str,
        _opts: &SubmitOptions,
    ) -> Result<RawResponse, BackendError> {
        let command = format!("fake show -j {}", job_id);
        self.record(format!("stats:{}", job_id));
        let stdout = match self.job(job_id) {
            Some(FakeScript::Succeed {
                start_ms,
                end_ms,
                bytes,
                slot_ms,
            }) => serde_json::json!({
                "jobReference": { "jobId": job_id },
                "statistics": {
                    "startTime": start_ms,
                    "endTime": end_ms,
                    "totalBytesProcessed": bytes.to_string(),
                    "query": {
                        "totalSlotMs": slot_ms.to_string(),
                        "totalBytesBilled": bytes.to_string(),
                        "cacheHit": false
                    }
                }
            })
            .to_string(),
            Some(FakeScript::RawStats(raw)) => raw,
            Some(FakeScript::StatsError(msg)) => {
                return Err(BackendError::new(command, msg.clone()).with_raw(msg))
            }
            _ => return Err(BackendError::new(command, format!("Not found: Job {}", job_id))),
        };
        Ok(RawResponse {
            command,
            stdout,
            stderr: String::new(),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
