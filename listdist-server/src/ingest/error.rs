//! Ingest failure taxonomy
//!
//! Every variant aborts the upload before any assignment is written, except
//! `Storage`, which can also surface after the batch (commit failure).
//! Per-assignment insert failures are not errors at this level; they are
//! counted in the batch report.

use super::parser::RecordParseError;
use super::planner::PlanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Request carried no `file` field
    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid file type '{0}'. Only CSV, XLSX, and XLS files are allowed.")]
    UnsupportedFormat(String),

    #[error("File exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Failed to parse file: {0}")]
    Parse(#[from] RecordParseError),

    #[error("No valid data found in file. Ensure columns are named: FirstName, Phone, Notes")]
    NoValidData,

    #[error("No agents available. Please add agents first.")]
    NoAgents,

    /// Reading or writing the staged upload failed
    #[error("Upload storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Roster read or batch commit failed
    #[error(transparent)]
    Storage(#[from] listdist_common::Error),
}

impl From<PlanError> for IngestError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::NoAgents => IngestError::NoAgents,
        }
    }
}
