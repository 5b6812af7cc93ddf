//! Row source seam and the per-load summary.

use serde::Serialize;

use crate::correlate::CorrelationReport;
use crate::merge::SourceBatch;

/// A file the source found but could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Everything a row source produced for one load.
#[derive(Debug, Clone, Default)]
pub struct SourceLoad {
    /// Readable files, in the order they should be merged
    pub batches: Vec<SourceBatch>,
    pub skipped: Vec<SkippedFile>,
}

impl SourceLoad {
    pub fn from_batches(batches: Vec<SourceBatch>) -> Self {
        Self {
            batches,
            skipped: Vec::new(),
        }
    }
}

/// Where rows come from (a folder of spreadsheets, a fixture, ...).
///
/// Errors here mean nothing could be read at all. Individual unreadable
/// files belong in [`SourceLoad::skipped`].
pub trait RowSource {
    fn read(&self) -> Result<SourceLoad, Box<dyn std::error::Error + Send + Sync>>;
}

impl RowSource for Vec<SourceBatch> {
    fn read(&self) -> Result<SourceLoad, Box<dyn std::error::Error + Send + Sync>> {
        Ok(SourceLoad::from_batches(self.clone()))
    }
}

/// Summary of one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub files_processed: usize,
    pub files_skipped: Vec<SkippedFile>,
    /// Rows after merge, before the reference rows were dropped
    pub rows_merged: usize,
    pub rows_excluded: usize,
    /// Rows in the final dataset
    pub rows: usize,
    pub headers: usize,
    pub correlation: CorrelationReport,
}

impl LoadReport {
    /// One-line status for the operator.
    pub fn status_text(&self) -> String {
        format!("Combined {} files and {} rows.", self.files_processed, self.rows)
    }
}
