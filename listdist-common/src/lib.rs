//! # listdist Common Library
//!
//! Shared code for the contact list distribution service:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Database initialization and row models
//! - Credential helpers for the API surface
//! - Timestamp utilities

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
