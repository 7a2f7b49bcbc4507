//! Distribution reader: persisted assignments regrouped per agent

use chrono::{DateTime, Utc};
use listdist_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::assignments::{load_distribution_rows, DistributionRow};

/// One roster agent with every assignment it has received
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDistribution {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub agent_email: String,
    pub lists: Vec<AssignedContact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedContact {
    pub id: Uuid,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Every roster agent with its assignments, newest first
///
/// Reads the store on each call. Agents without assignments are included
/// with an empty `lists`.
pub async fn read_distributions(pool: &SqlitePool) -> Result<Vec<AgentDistribution>> {
    let rows = load_distribution_rows(pool).await?;
    Ok(group_by_agent(rows))
}

/// Fold join rows (already ordered by agent) into one entry per agent
fn group_by_agent(rows: Vec<DistributionRow>) -> Vec<AgentDistribution> {
    let mut grouped: Vec<AgentDistribution> = Vec::new();

    for row in rows {
        let start_new = grouped.last().map_or(true, |last| last.agent_id != row.agent_id);
        if start_new {
            grouped.push(AgentDistribution {
                agent_id: row.agent_id,
                agent_name: row.agent_name,
                agent_email: row.agent_email,
                lists: Vec::new(),
            });
        }

        if let (Some(assignment), Some(current)) = (row.assignment, grouped.last_mut()) {
            current.lists.push(AssignedContact {
                id: assignment.id,
                first_name: assignment.record.first_name().to_string(),
                phone: assignment.record.phone().to_string(),
                notes: assignment.record.notes().to_string(),
                created_at: assignment.created_at,
            });
        }
    }

    grouped
}
