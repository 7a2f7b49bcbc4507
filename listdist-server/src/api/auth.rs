//! Bearer authentication middleware
//!
//! Applied to `/api/*` only. On success the request carries a
//! [`CallerIdentity`] extension for handlers to pick up.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use listdist_common::api::{validate_bearer, ApiAuthError, CallerIdentity};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// No configured token disables checking; every caller is then
/// [`CallerIdentity::Anonymous`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match state.api_token.as_deref() {
        None => CallerIdentity::Anonymous,
        Some(expected) => {
            let header = match request.headers().get(AUTHORIZATION) {
                Some(value) => Some(value.to_str().map_err(|_| {
                    reject(request.uri().path(), ApiAuthError::MalformedHeader)
                })?),
                None => None,
            };

            validate_bearer(header, expected).map_err(|e| reject(request.uri().path(), e))?
        }
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn reject(path: &str, err: ApiAuthError) -> ApiError {
    warn!(path, error = %err, "Rejected API request");
    ApiError::Unauthorized(err.to_string())
}
