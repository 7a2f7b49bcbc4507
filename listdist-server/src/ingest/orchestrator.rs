//! Ingest orchestrator: one upload from staged file to persisted assignments
//!
//! Sequence, each step awaited before the next:
//! 1. type and size checks (done while staging, see [`StagedUpload`])
//! 2. read and parse the staged file
//! 3. zero records -> `NoValidData`
//! 4. load the roster fresh -> `NoAgents` when empty
//! 5. plan
//! 6. write the plan as one batch, counting per-row failures
//! 7. remove the staged file, on every path
//! 8. summarize
//!
//! The roster is not locked between steps 4 and 6. Two concurrent uploads
//! each plan against whatever roster they read.

use listdist_common::api::CallerIdentity;
use listdist_common::time;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::IngestError;
use super::parser::parse_records;
use super::planner::plan_distribution;
use super::staging::StagedUpload;
use crate::db::agents::load_roster;
use crate::db::assignments::{insert_plan, InsertFailure};

/// Result of a completed ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub upload_id: Uuid,
    /// Records that survived parsing
    pub total_items: usize,
    /// Roster size at planning time
    pub agents_count: usize,
    /// Assignments actually persisted; may be below `total_items`
    pub inserted: usize,
    /// Per-row insert failures (not exposed over HTTP)
    pub failures: Vec<InsertFailure>,
}

/// Run the full pipeline for one staged upload
///
/// Consumes the staged upload and removes its file before returning,
/// whatever the outcome.
pub async fn ingest_upload(
    pool: &SqlitePool,
    staged: StagedUpload,
    caller: &CallerIdentity,
) -> Result<IngestSummary, IngestError> {
    let upload_id = Uuid::new_v4();

    info!(
        upload_id = %upload_id,
        caller = %caller,
        file = %staged.original_name(),
        format = ?staged.format(),
        bytes = staged.size(),
        "Ingesting upload"
    );

    let result = run_pipeline(pool, upload_id, &staged).await;
    staged.remove();

    match &result {
        Ok(summary) => info!(
            upload_id = %upload_id,
            total_items = summary.total_items,
            agents_count = summary.agents_count,
            inserted = summary.inserted,
            "Upload distributed"
        ),
        Err(e) => warn!(upload_id = %upload_id, error = %e, "Upload rejected"),
    }

    result
}

async fn run_pipeline(
    pool: &SqlitePool,
    upload_id: Uuid,
    staged: &StagedUpload,
) -> Result<IngestSummary, IngestError> {
    let bytes = staged.read().await?;
    let records = parse_records(&bytes, staged.format())?;

    if records.is_empty() {
        return Err(IngestError::NoValidData);
    }
    let total_items = records.len();

    let roster = load_roster(pool).await?;
    if roster.is_empty() {
        return Err(IngestError::NoAgents);
    }

    let plan = plan_distribution(records, &roster)?;
    let report = insert_plan(pool, upload_id, &plan, time::now()).await?;
    debug_assert_eq!(report.attempted(), plan.len());

    if !report.is_complete() {
        warn!(
            upload_id = %upload_id,
            attempted = report.attempted(),
            inserted = report.inserted,
            failed = report.failures.len(),
            "Batch committed with skipped rows"
        );
    }

    Ok(IngestSummary {
        upload_id,
        total_items,
        agents_count: roster.len(),
        inserted: report.inserted,
        failures: report.failures,
    })
}
