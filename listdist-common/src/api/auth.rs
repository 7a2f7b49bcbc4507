//! Bearer credential checks and password hashing
//!
//! Token issuance and sessions live outside this service. What arrives here
//! is an opaque bearer token that is either the configured API token or not;
//! a match yields a [`CallerIdentity`] that handlers can log.

use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// No `Authorization` header on the request
    MissingCredential,

    /// Header present but not of the form `Bearer <token>`
    MalformedHeader,

    /// Token does not match the configured credential
    InvalidCredential,

    /// Database error loading the configured token
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingCredential => write!(f, "Missing bearer credential"),
            ApiAuthError::MalformedHeader => write!(f, "Malformed Authorization header"),
            ApiAuthError::InvalidCredential => write!(f, "Invalid credential"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

// ========================================
// Caller Identity
// ========================================

/// Opaque identity of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    /// Auth disabled (no token configured)
    Anonymous,

    /// Authenticated by token; holds the token fingerprint, never the token
    Token(String),
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallerIdentity::Anonymous => write!(f, "anonymous"),
            CallerIdentity::Token(fp) => write!(f, "token:{}", fp),
        }
    }
}

// ========================================
// Configured Token
// ========================================

/// Load the API token from the settings table
///
/// `Ok(None)` when unset or blank, which disables auth.
pub async fn load_api_token(db: &SqlitePool) -> Result<Option<String>, ApiAuthError> {
    let result: Option<(Option<String>,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'api_token'")
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(result
        .and_then(|(value,)| value)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Store (or replace) the API token in the settings table
pub async fn store_api_token(db: &SqlitePool, token: &str) -> Result<(), ApiAuthError> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('api_token', ?)")
        .bind(token)
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(())
}

// ========================================
// Bearer Validation
// ========================================

/// Extract the token from an `Authorization` header value
///
/// # Examples
///
/// ```
/// use listdist_common::api::auth::parse_bearer;
///
/// assert_eq!(parse_bearer("Bearer abc").unwrap(), "abc");
/// assert!(parse_bearer("Basic abc").is_err());
/// ```
pub fn parse_bearer(header: &str) -> Result<&str, ApiAuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(ApiAuthError::MalformedHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiAuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiAuthError::MalformedHeader);
    }

    Ok(token)
}

/// Validate an `Authorization` header against the expected token
///
/// Tokens are compared by SHA-256 digest so the comparison time does not
/// depend on how many leading bytes match.
pub fn validate_bearer(
    header: Option<&str>,
    expected: &str,
) -> Result<CallerIdentity, ApiAuthError> {
    let header = header.ok_or(ApiAuthError::MissingCredential)?;
    let provided = parse_bearer(header)?;

    if Sha256::digest(provided.as_bytes()) != Sha256::digest(expected.as_bytes()) {
        return Err(ApiAuthError::InvalidCredential);
    }

    Ok(CallerIdentity::Token(fingerprint(provided)))
}

/// Short, non-reversible fingerprint of a token (first 8 hex chars of SHA-256)
pub fn fingerprint(token: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(token.as_bytes()));
    digest[..8].to_string()
}

// ========================================
// Password Hashing
// ========================================

/// Random 16-byte salt, hex encoded
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 of salt || password, hex encoded
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password against a stored hash and salt
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}
