//! Error taxonomy for a benchmark run.
//!
//! Only [`HarnessError::Preflight`], [`HarnessError::Config`] and
//! [`HarnessError::Io`] end a run. The per-query variants are recorded on the
//! definition's outcome and the runner moves on to the next definition.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

/// A backend command that could not be run or exited unsuccessfully.
#[derive(Debug, Clone, Error)]
#[error("{command}: {message}")]
pub struct BackendError {
    pub command: String,
    pub exit_code: Option<i32>,
    pub message: String,
    /// Raw stdout/stderr of the failed command, kept for the run log.
    pub raw: String,
}

impl BackendError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            exit_code: None,
            message: message.into(),
            raw: String::new(),
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("preflight failed: {0}")]
    Preflight(String),

    #[error("submission failed for {query}: {reason}")]
    Submission { query: String, reason: String },

    #[error("wait failed for {query} (job {job_id}): {source}")]
    Wait {
        query: String,
        job_id: String,
        #[source]
        source: BackendError,
    },

    #[error("stats unavailable for {query} (job {job_id}): {reason}")]
    StatsUnavailable {
        query: String,
        job_id: String,
        reason: String,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Per-query errors are recovered by the runner; the rest end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::Preflight(_) | HarnessError::Config(_) | HarnessError::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_split() {
        assert!(HarnessError::Preflight("bq not found".into()).is_fatal());
        assert!(!HarnessError::Submission {
            query: "q".into(),
            reason: "no job id".into()
        }
        .is_fatal());
        assert!(!HarnessError::Wait {
            query: "q".into(),
            job_id: "j".into(),
            source: BackendError::new("bq wait j", "exit 1"),
        }
        .is_fatal());
    }

    #[test]
    fn test_wait_error_message_carries_backend_text() {
        let e = HarnessError::Wait {
            query: "q1".into(),
            job_id: "bqjob_1".into(),
            source: BackendError::new("bq wait bqjob_1", "Access Denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("q1"));
        assert!(msg.contains("Access Denied"));
    }
}
