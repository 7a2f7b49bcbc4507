//! Upload ingest and distribution pipeline
//!
//! ```text
//! staged upload ─▶ parser ─▶ planner (+ roster) ─▶ orchestrator persists
//!                                                        │
//!                             reader ◀── lists table ◀───┘
//! ```

pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod planner;
pub mod reader;
pub mod staging;

pub use error::IngestError;
pub use orchestrator::{ingest_upload, IngestSummary};
pub use parser::{parse_records, RecordParseError, UploadFormat};
pub use planner::{plan_distribution, DistributionPlan, PlanEntry, PlanError};
pub use reader::{read_distributions, AgentDistribution, AssignedContact};
pub use staging::StagedUpload;
