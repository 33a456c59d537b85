use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{Action, AuthUser, ResourceKind};
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::protected::utils::{authorize, json_body, parse_new};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::User;
use crate::state::AppState;

/// `email` names the profile, and with it the owner; defaults to the caller.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub email: Option<String>,
}

/// GET /api/v1/user - A user profile
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> ApiResult<User> {
    let grant = authorize(&auth_user, query.email.as_deref(), Action::Read, ResourceKind::User)?;

    let user = Repository::<User>::new(state.store.as_ref())
        .select_404(&grant.owner, None)
        .await?;

    Ok(ApiResponse::success(user))
}

/// POST /api/v1/user - Create a profile for the resolved user
///
/// The body's `email`, when present, must match the resolved owner.
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let mut user: User = parse_new(json_body(body)?)?;

    let requested = query.email.as_deref().or(Some(user.email.as_str()));
    let grant = authorize(&auth_user, requested, Action::Write, ResourceKind::User)?;

    if !user.email.is_empty() && user.email != grant.owner {
        return Err(ApiError::malformed("email", "The profile email must match the 'email' query parameter"));
    }
    user.email = grant.owner.clone();

    if user.username.trim().is_empty() {
        return Err(ApiError::malformed("username", "A username is required"));
    }

    let created = Repository::<User>::new(state.store.as_ref())
        .create(user, &grant.owner)
        .await?;

    Ok(ApiResponse::message("Successfully created user profile", "email", &created.email))
}

/// DELETE /api/v1/user - Delete a user profile
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.email.as_deref(), Action::Write, ResourceKind::User)?;

    Repository::<User>::new(state.store.as_ref())
        .delete(&grant.owner, &grant.owner)
        .await?;

    Ok(ApiResponse::message("Successfully deleted user profile", "email", &grant.owner))
}
