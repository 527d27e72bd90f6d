//! Failure/censoring records and the CSV dataset codec.
//!
//! A dataset is a CSV file whose header names a `duration` and a `status`
//! column (case-insensitive, any order, extra columns ignored). Rows keep
//! their arrival order, which matters for sequential testing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Whether a record ended in an observed failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Removed by maintenance/inspection before failing (status 0).
    Censored,
    /// Failure observed (status 1).
    Failure,
}

impl RecordStatus {
    pub fn flag(self) -> u8 {
        match self {
            RecordStatus::Censored => 0,
            RecordStatus::Failure => 1,
        }
    }

    pub fn is_failure(self) -> bool {
        self == RecordStatus::Failure
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flag())
    }
}

/// One observed duration with its status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub duration: f64,
    pub status: RecordStatus,
}

impl FailureRecord {
    pub fn failure(duration: f64) -> Self {
        Self {
            duration,
            status: RecordStatus::Failure,
        }
    }

    pub fn censored(duration: f64) -> Self {
        Self {
            duration,
            status: RecordStatus::Censored,
        }
    }
}

/// Ordered sequence of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<FailureRecord>,
}

impl Dataset {
    pub fn new(records: Vec<FailureRecord>) -> Self {
        Self { records }
    }

    /// Read and parse a CSV dataset from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        parse_dataset(&text)
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FailureRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: FailureRecord) {
        self.records.push(record);
    }

    pub fn total_duration(&self) -> f64 {
        self.records.iter().map(|r| r.duration).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Mean duration over all records, `None` when empty.
    pub fn mean_duration(&self) -> Option<f64> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.total_duration() / self.records.len() as f64)
        }
    }
}

impl FromIterator<FailureRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = FailureRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a FailureRecord;
    type IntoIter = std::slice::Iter<'a, FailureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Split one CSV line into trimmed fields.
///
/// Commas inside `"..."` stay in the field and `""` inside quotes is a
/// literal quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn dataset_error(line: usize, message: impl Into<String>) -> Error {
    Error::Dataset {
        line,
        message: message.into(),
    }
}

/// Parse CSV text into a dataset.
///
/// Blank lines are skipped. Line numbers in errors are 1-based and count
/// the header.
pub fn parse_dataset(text: &str) -> Result<Dataset> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_start_matches('\u{feff}')))
        .filter(|(_, l)| !l.trim().is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| dataset_error(1, "missing header row"))?;
    let columns: Vec<String> = split_fields(header)
        .into_iter()
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let find = |name: &str| columns.iter().position(|c| c == name);
    let duration_col =
        find("duration").ok_or_else(|| dataset_error(header_line, "missing 'duration' column"))?;
    let status_col =
        find("status").ok_or_else(|| dataset_error(header_line, "missing 'status' column"))?;

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let fields = split_fields(line);
        let duration_raw = fields
            .get(duration_col)
            .ok_or_else(|| dataset_error(line_no, "missing duration field"))?;
        let status_raw = fields
            .get(status_col)
            .ok_or_else(|| dataset_error(line_no, "missing status field"))?;

        let duration: f64 = duration_raw
            .parse()
            .map_err(|_| dataset_error(line_no, format!("duration '{duration_raw}' is not a number")))?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(dataset_error(
                line_no,
                format!("duration must be finite and non-negative, got {duration_raw}"),
            ));
        }

        let status_value: f64 = status_raw
            .parse()
            .map_err(|_| dataset_error(line_no, format!("status '{status_raw}' is not a number")))?;
        let status = if status_value == 0.0 {
            RecordStatus::Censored
        } else if status_value == 1.0 {
            RecordStatus::Failure
        } else {
            return Err(dataset_error(
                line_no,
                format!("status must be 0 or 1, got {status_raw}"),
            ));
        };

        records.push(FailureRecord { duration, status });
    }

    Ok(Dataset::new(records))
}

/// Write a dataset as `duration,status` CSV.
pub fn write_dataset<W: Write>(dataset: &Dataset, mut writer: W) -> Result<()> {
    writeln!(writer, "duration,status")?;
    for record in dataset {
        writeln!(writer, "{},{}", record.duration, record.status.flag())?;
    }
    writer.flush()?;
    Ok(())
}
