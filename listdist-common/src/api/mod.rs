//! API module for shared HTTP API functionality
//!
//! Contains ONLY pure functions and database operations (via sqlx). The
//! server crate wraps these with axum middleware.

pub mod auth;

pub use auth::{
    fingerprint, generate_salt, hash_password, load_api_token, parse_bearer, store_api_token,
    validate_bearer, verify_password, ApiAuthError, CallerIdentity,
};
