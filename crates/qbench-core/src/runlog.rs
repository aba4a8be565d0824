//! Verbose run log: one line-oriented file per run, truncated when the run
//! starts and only appended to afterwards.

use crate::errors::HarnessError;
use chrono::{SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Fatal,
    Success,
    Failure,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::Fatal => "[FATAL]",
            Marker::Success => "[SUCCESS]",
            Marker::Failure => "[FAILURE]",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl RunLog {
    pub fn create(path: &Path) -> Result<Self, HarnessError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| HarnessError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Writes raw text; each line of `text` becomes one log line.
    pub fn raw(&self, text: &str) {
        let mut buf = String::with_capacity(text.len() + 1);
        for line in text.lines() {
            buf.push_str(line);
            buf.push('\n');
        }
        self.write_bytes(buf.as_bytes());
    }

    pub fn line(&self, msg: &str) {
        self.raw(&format!("{} {}", timestamp(), msg));
    }

    pub fn marker(&self, marker: Marker, msg: &str) {
        self.line(&format!("{} {}", marker.as_str(), msg));
    }

    pub fn command(&self, command: &str) {
        self.line(&format!("$ {}", command));
    }

    pub fn response(&self, label: &str, body: &str) {
        if body.trim().is_empty() {
            self.line(&format!("{}: <empty>", label));
        } else {
            self.line(&format!("{}:", label));
            self.raw(body);
        }
    }

    pub fn fatal(&self, msg: &str) {
        self.marker(Marker::Fatal, msg);
    }

    fn write_bytes(&self, bytes: &[u8]) {
        // A log write failure must not abort the run; report it once on stderr.
        if let Ok(mut f) = self.file.lock() {
            if let Err(e) = f.write_all(bytes).and_then(|_| f.flush()) {
                eprintln!("run log write failed ({}): {}", self.path.display(), e);
            }
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct RunLogWriter {
    file: Arc<Mutex<File>>,
}

impl Write for RunLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "run log poisoned"))?;
        f.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "run log poisoned"))?;
        f.flush()
    }
}

/// Lets a `tracing_subscriber` fmt layer mirror process output into the log.
impl<'a> MakeWriter<'a> for RunLog {
    type Writer = RunLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RunLogWriter {
            file: self.file.clone(),
        }
    }
}
