//! Assignment persistence (the `lists` table)

use chrono::{DateTime, Utc};
use listdist_common::db::{Assignment, ContactRecord};
use listdist_common::{time, Error, Result};
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use super::{parse_guid, parse_timestamp};
use crate::ingest::planner::DistributionPlan;

/// One plan entry that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertFailure {
    /// Index of the entry within the plan
    pub position: usize,
    pub agent_id: Uuid,
    pub reason: String,
}

/// Outcome of writing one plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInsertReport {
    pub inserted: usize,
    pub failures: Vec<InsertFailure>,
}

impl BatchInsertReport {
    pub fn attempted(&self) -> usize {
        self.inserted + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Write every plan entry as an assignment in one transaction
///
/// A failing row is logged, recorded in the report and skipped; SQLite rolls
/// back only that statement and the rest of the batch still commits. Only a
/// failure to begin or commit the transaction is returned as `Err`, in which
/// case nothing from this batch is persisted.
pub async fn insert_plan(
    pool: &SqlitePool,
    upload_id: Uuid,
    plan: &DistributionPlan,
    created_at: DateTime<Utc>,
) -> Result<BatchInsertReport> {
    let created_at = time::to_db_timestamp(created_at);
    let upload_guid = upload_id.to_string();
    let mut report = BatchInsertReport::default();

    let mut tx = pool.begin().await?;

    for (position, entry) in plan.entries().iter().enumerate() {
        let result = sqlx::query(
            r#"
            INSERT INTO lists (guid, agent_guid, upload_guid, position, first_name, phone, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(entry.agent_id.to_string())
        .bind(&upload_guid)
        .bind(position as i64)
        .bind(entry.record.first_name())
        .bind(entry.record.phone())
        .bind(entry.record.notes())
        .bind(&created_at)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => report.inserted += 1,
            Err(e) => {
                warn!(
                    upload_id = %upload_id,
                    position,
                    agent_id = %entry.agent_id,
                    error = %e,
                    "Error inserting assignment, skipping"
                );
                report.failures.push(InsertFailure {
                    position,
                    agent_id: entry.agent_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    tx.commit().await?;

    Ok(report)
}

/// One row of the roster ⟕ assignments join
#[derive(Debug, Clone)]
pub struct DistributionRow {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub agent_email: String,
    pub assignment: Option<Assignment>,
}

/// Every agent joined with its assignments
///
/// Agents in roster order; within an agent newest upload first, and plan
/// order inside one upload. Agents without assignments appear once with
/// `assignment: None`.
pub async fn load_distribution_rows(pool: &SqlitePool) -> Result<Vec<DistributionRow>> {
    let rows = sqlx::query(
        r#"
        SELECT
            agents.guid AS agent_guid,
            agents.name AS agent_name,
            agents.email AS agent_email,
            lists.guid AS list_guid,
            lists.upload_guid,
            lists.position,
            lists.first_name,
            lists.phone,
            lists.notes,
            lists.created_at
        FROM agents
        LEFT JOIN lists ON lists.agent_guid = agents.guid
        ORDER BY agents.created_at ASC, agents.rowid ASC,
                 lists.created_at DESC, lists.position ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<DistributionRow> {
            let agent_id = parse_guid(row.get("agent_guid"))?;

            let list_guid: Option<&str> = row.get("list_guid");
            let assignment = match list_guid {
                Some(list_guid) => {
                    let upload_guid: &str = row.get("upload_guid");
                    let first_name: String = row.get("first_name");
                    let phone: String = row.get("phone");
                    let notes: Option<String> = row.get("notes");

                    let record = ContactRecord::new(
                        Some(first_name.as_str()),
                        Some(phone.as_str()),
                        notes.as_deref(),
                    )
                    .ok_or_else(|| {
                        Error::Internal(format!("Stored assignment {} is incomplete", list_guid))
                    })?;

                    Some(Assignment {
                        id: parse_guid(list_guid)?,
                        agent_id,
                        upload_id: parse_guid(upload_guid)?,
                        position: row.get("position"),
                        record,
                        created_at: parse_timestamp(row.get("created_at"))?,
                    })
                }
                None => None,
            };

            Ok(DistributionRow {
                agent_id,
                agent_name: row.get("agent_name"),
                agent_email: row.get("agent_email"),
                assignment,
            })
        })
        .collect()
}

/// Count of persisted assignments, optionally for one upload
pub async fn count_assignments(pool: &SqlitePool, upload_id: Option<Uuid>) -> Result<i64> {
    let count = match upload_id {
        Some(id) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE upload_guid = ?")
                .bind(id.to_string())
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM lists")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}
