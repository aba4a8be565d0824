use crate::errors::{BackendError, HarnessError};
use crate::model::SubmitOptions;
use async_trait::async_trait;

pub mod bq;
pub mod fake;

/// Raw output of one backend invocation. Parsing happens in [`crate::stats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

impl RawResponse {
    /// stdout and stderr joined for logging.
    pub fn text(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
            (false, false) => format!(
                "{}\n{}",
                self.stdout.trim_end(),
                self.stderr.trim_end()
            ),
        }
    }
}

#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Checks that the backend client can be used at all.
    async fn preflight(&self) -> Result<(), HarnessError>;

    async fn submit(&self, sql: &str, opts: &SubmitOptions) -> Result<RawResponse, BackendError>;

    /// Blocks until the job has finished. No timeout beyond the backend's own.
    async fn wait(&self, job_id: &str, opts: &SubmitOptions) -> Result<RawResponse, BackendError>;

    async fn get_stats(
        &self,
        job_id: &str,
        opts: &SubmitOptions,
    ) -> Result<RawResponse, BackendError>;

    fn name(&self) -> &'static str;
}
