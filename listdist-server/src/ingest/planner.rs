//! Distribution planner: balanced, deterministic partition of records
//!
//! Contiguous block partition in roster order. With N records and M agents
//! every agent gets `N / M` records and the first `N % M` agents one more:
//!
//! ```text
//! records  r0 r1 r2 r3 r4 r5 r6      (N = 7)
//! agents   a0 a0 a0 a1 a1 a2 a2      (M = 3, N % M = 1)
//! ```

use listdist_common::db::{Agent, ContactRecord};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Empty roster; checked before anything else, regardless of N
    #[error("No agents available. Please add agents first.")]
    NoAgents,
}

/// One planned `(agent, record)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub agent_id: Uuid,
    pub record: ContactRecord,
}

/// Ordered `(agent, record)` pairs for one upload; never persisted as such
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionPlan {
    entries: Vec<PlanEntry>,
}

impl DistributionPlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records planned for one agent, in plan order
    #[cfg(test)]
    pub fn records_for(&self, agent_id: Uuid) -> impl Iterator<Item = &ContactRecord> {
        self.entries
            .iter()
            .filter(move |e| e.agent_id == agent_id)
            .map(|e| &e.record)
    }
}

/// Number of records agent `index` receives out of `total` across `agents`
///
/// `agents` must be non-zero.
pub fn quota(total: usize, agents: usize, index: usize) -> usize {
    total / agents + usize::from(index < total % agents)
}

/// Partition `records` across `roster`
pub fn plan_distribution(
    records: Vec<ContactRecord>,
    roster: &[Agent],
) -> Result<DistributionPlan, PlanError> {
    if roster.is_empty() {
        return Err(PlanError::NoAgents);
    }

    let total = records.len();
    let mut records = records.into_iter();
    let mut entries = Vec::with_capacity(total);

    for (index, agent) in roster.iter().enumerate() {
        let share = quota(total, roster.len(), index);
        entries.extend(records.by_ref().take(share).map(|record| PlanEntry {
            agent_id: agent.id,
            record,
        }));
    }

    debug_assert_eq!(entries.len(), total);

    Ok(DistributionPlan { entries })
}
