use crate::errors::HarnessError;
use crate::model::SummaryRow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SUMMARY_HEADER: [&str; 5] = [
    "Query_Name",
    "Job_ID",
    "Duration_ms",
    "Bytes_Processed",
    "Slot_Milliseconds",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "," | "comma" | "csv" => Some(Delimiter::Comma),
            "\t" | "\\t" | "tab" | "tsv" => Some(Delimiter::Tab),
            _ => None,
        }
    }
}

/// The tabular summary artifact. Recreated on [`SummaryWriter::create`];
/// rows are flushed as they are appended and never rewritten.
pub struct SummaryWriter {
    path: PathBuf,
    out: Box<dyn Write + Send>,
    delimiter: Delimiter,
    rows: usize,
}

impl SummaryWriter {
    pub fn create(path: &Path, delimiter: Delimiter) -> Result<Self, HarnessError> {
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
        Self::with_writer(path, Box::new(file), delimiter)
    }

    /// Writes the header to `out`; `path` only labels errors and reports.
    pub(crate) fn with_writer(
        path: &Path,
        out: Box<dyn Write + Send>,
        delimiter: Delimiter,
    ) -> Result<Self, HarnessError> {
        let mut w = Self {
            path: path.to_path_buf(),
            out,
            delimiter,
            rows: 0,
        };
        let header: Vec<String> = SUMMARY_HEADER.iter().map(|s| s.to_string()).collect();
        w.write_record(&header)?;
        Ok(w)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows written (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn append(&mut self, row: &SummaryRow) -> Result<(), HarnessError> {
        let fields = vec![
            row.query_name.clone(),
            row.job_id.clone(),
            opt(row.duration_ms),
            opt(row.bytes_processed),
            opt(row.slot_ms),
        ];
        self.write_record(&fields)?;
        self.rows += 1;
        Ok(())
    }

    fn write_record(&mut self, fields: &[String]) -> Result<(), HarnessError> {
        let d = self.delimiter.as_char();
        let line = fields
            .iter()
            .map(|f| escape(f, d))
            .collect::<Vec<_>>()
            .join(&d.to_string());
        self.out
            .write_all(format!("{}\n", line).as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| HarnessError::io(&self.path, e))
    }
}

// Missing stats become empty cells, never a dropped row.
fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn escape(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains(['"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
