use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{extract_identity, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

/// Verify the bearer token and inject the caller's `AuthUser` into request
/// extensions. Verification failures end the request with 401.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers)?;

    let claims = state.verifier.verify(token).await.map_err(|err| {
        tracing::debug!("Rejected bearer token: {}", err);
        err
    })?;
    let auth_user = extract_identity(&claims, &state.config.auth.email_claim)?;

    tracing::debug!("Authenticated {} ({} scopes)", auth_user.email, auth_user.scopes.len());
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MalformedHeader)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedHeader),
    }
}
