//! Database access layer for listdist-server
//!
//! Functions take the pool explicitly; the pool itself lives in `AppState`
//! and is opened in `main` and closed on shutdown.

pub mod agents;
pub mod assignments;

use chrono::{DateTime, Utc};
use listdist_common::{Error, Result};
use uuid::Uuid;

pub(crate) fn parse_guid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Invalid guid '{}': {}", raw, e)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    listdist_common::time::from_db_timestamp(raw)
        .ok_or_else(|| Error::Internal(format!("Invalid timestamp '{}'", raw)))
}
