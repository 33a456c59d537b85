use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{Action, AuthUser, ResourceKind};
use crate::database::Repository;
use crate::handlers::protected::content;
use crate::handlers::protected::utils::{authorize, count, json_body, require_param};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Card, CardSet};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetContentQuery {
    pub set_code: Option<String>,
    pub owner: Option<String>,
}

/// GET /api/v1/set/content - The set's cards, in set order
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SetContentQuery>,
) -> ApiResult<Vec<Card>> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Read, ResourceKind::Set)?;
    let code = require_param(query.set_code, "setCode")?;

    let store = state.store.as_ref();
    let set = Repository::<CardSet>::new(store)
        .select_404(&code, Some(&grant.owner))
        .await?;

    Ok(ApiResponse::success(content::resolve_cards(store, &set.content_ids).await?))
}

/// POST /api/v1/set/content - Add cards: `{"contentIds": [ids]}`
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SetContentQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Set)?;
    let code = require_param(query.set_code, "setCode")?;
    let request = content::parse_request::<CardSet>(json_body(body)?)?;

    let added = content::add::<CardSet>(state.store.as_ref(), &code, &grant.owner, &request).await?;

    Ok(ApiResponse::message_with("Successfully updated set", "setCode", &code, count("added", added)))
}

/// DELETE /api/v1/set/content - Remove cards: `{"contentIds": [ids]}`
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SetContentQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Set)?;
    let code = require_param(query.set_code, "setCode")?;
    let request = content::parse_request::<CardSet>(json_body(body)?)?;

    let removed = content::remove::<CardSet>(state.store.as_ref(), &code, &grant.owner, &request).await?;

    Ok(ApiResponse::message_with(
        "Successfully removed cards from set",
        "setCode",
        &code,
        count("removed", removed),
    ))
}
