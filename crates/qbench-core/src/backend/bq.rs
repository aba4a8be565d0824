use super::{QueryBackend, RawResponse};
use crate::errors::{BackendError, HarnessError};
use crate::model::SubmitOptions;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Drives the `bq` command-line client.
#[derive(Debug, Clone)]
pub struct BqCliBackend {
    pub bin: PathBuf,
    pub project_id: Option<String>,
}

impl Default for BqCliBackend {
    fn default() -> Self {
        Self {
            bin: PathBuf::from("bq"),
            project_id: None,
        }
    }
}

impl BqCliBackend {
    pub fn new(bin: impl Into<PathBuf>, project_id: Option<String>) -> Self {
        Self {
            bin: bin.into(),
            project_id,
        }
    }

    fn global_args(&self, opts: &SubmitOptions, with_format: bool) -> Vec<String> {
        let mut args = Vec::new();
        if with_format {
            args.push(format!("--format={}", opts.format));
        }
        args.push(format!("--location={}", opts.location));
        if let Some(p) = &self.project_id {
            args.push(format!("--project_id={}", p));
        }
        args
    }

    pub fn submit_args(&self, sql: &str, opts: &SubmitOptions) -> Vec<String> {
        let mut args = self.global_args(opts, true);
        args.push("query".into());
        args.push("--nouse_legacy_sql".into());
        args.push(if opts.use_cache {
            "--use_cache".into()
        } else {
            "--nouse_cache".into()
        });
        if opts.nosync {
            args.push("--nosync".into());
        }
        args.push(sql.to_string());
        args
    }

    pub fn wait_args(&self, job_id: &str, opts: &SubmitOptions) -> Vec<String> {
        let mut args = self.global_args(opts, false);
        args.push("wait".into());
        args.push(job_id.to_string());
        args
    }

    pub fn show_args(&self, job_id: &str, opts: &SubmitOptions) -> Vec<String> {
        let mut args = self.global_args(opts, true);
        args.push("show".into());
        args.push("-j".into());
        args.push(job_id.to_string());
        args
    }

    fn render(&self, args: &[String]) -> String {
        let mut s = self.bin.display().to_string();
        for a in args {
            s.push(' ');
            if a.contains(char::is_whitespace) {
                s.push_str(&format!("'{}'", a.replace('\'', "'\\''")));
            } else {
                s.push_str(a);
            }
        }
        s
    }

    async fn exec(&self, args: Vec<String>) -> Result<RawResponse, BackendError> {
        let command = self.render(&args);
        tracing::debug!(event = "backend_exec", command = %command);

        let output = Command::new(&self.bin)
            .args(&args)
            .output()
            .await
            .map_err(|e| BackendError::new(&command, format!("failed to spawn: {}", e)))?;

        let resp = RawResponse {
            command: command.clone(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            let code = output.status.code();
            let message = match code {
                Some(c) => format!("exited with status {}", c),
                None => "terminated by signal".to_string(),
            };
            return Err(BackendError::new(command, message)
                .with_exit_code(code)
                .with_raw(resp.text()));
        }
        Ok(resp)
    }
}

#[async_trait]
impl QueryBackend for BqCliBackend {
    async fn preflight(&self) -> Result<(), HarnessError> {
        match Command::new(&self.bin).arg("version").output().await {
            Ok(out) => {
                if !out.status.success() {
                    // The client exists; auth problems surface per query.
                    tracing::warn!(
                        event = "preflight_version_nonzero",
                        bin = %self.bin.display(),
                        status = ?out.status.code()
                    );
                }
                Ok(())
            }
            Err(e) => Err(HarnessError::Preflight(format!(
                "required backend client '{}' is not available: {}",
                self.bin.display(),
                e
            ))),
        }
    }

    async fn submit(&self, sql: &str, opts: &SubmitOptions) -> Result<RawResponse, BackendError> {
        self.exec(self.submit_args(sql, opts)).await
    }

    async fn wait(&self, job_id: &str, opts: &SubmitOptions) -> Result<RawResponse, BackendError> {
        self.exec(self.wait_args(job_id, opts)).await
    }

    async fn get_stats(
        &self,
        job_id: &str,
        opts: &SubmitOptions,
    ) -> Result<RawResponse, BackendError> {
        self.exec(self.show_args(job_id, opts)).await
    }

    fn name(&self) -> &'static str {
        "bq"
    }
}
