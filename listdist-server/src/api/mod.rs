//! HTTP API handlers for listdist-server

pub mod agents;
pub mod auth;
pub mod health;
pub mod upload;

pub use agents::{create_agent, list_agents};
pub use auth::auth_middleware;
pub use health::health_routes;
pub use upload::{get_distributions, upload_file};
