use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::database::AppState;
use crate::error::AppError;

/// Middleware to check for a bearer token
///
/// When `require_auth` is off in the application state, requests pass
/// straight through. Otherwise the request must carry
/// `Authorization: Bearer <token>`:
///
/// - missing or malformed header: 401
/// - invalid or expired token: 403
///
/// The verified `Claims` are stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.require_auth {
        return Ok(next.run(request).await);
    }

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing or malformed authorization header".into()))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected access token: {}", e);
        AppError::Forbidden("Invalid or expired token".into())
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
