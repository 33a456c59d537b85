use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{Action, AuthUser, ResourceKind};
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::protected::utils::{authorize, json_body, non_empty, parse_new, require_param};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::CardSet;
use crate::state::AppState;
use crate::validation::{check_references, duplicate_references};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuery {
    pub set_code: Option<String>,
    pub owner: Option<String>,
    pub limit: Option<String>,
}

/// GET /api/v1/set - One set by `setCode`, or the owner's sets
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SetQuery>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Read, ResourceKind::Set)?;
    let repository = Repository::<CardSet>::new(state.store.as_ref());

    let result = match non_empty(query.set_code) {
        Some(code) => serde_json::to_value(repository.select_404(&code, Some(&grant.owner)).await?),
        None => {
            let limit = state.config.effective_limit(query.limit.as_deref());
            serde_json::to_value(repository.select_any(Some(&grant.owner), limit).await?)
        }
    };

    Ok(ApiResponse::success(result.map_err(ApiError::internal)?))
}

/// POST /api/v1/set - Create a set owned by the resolved owner
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SetQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Set)?;
    let mut set: CardSet = parse_new(json_body(body)?)?;

    set.code = set.code.trim().to_string();
    set.name = set.name.trim().to_string();
    if set.code.is_empty() || set.name.is_empty() {
        return Err(ApiError::malformed(
            "code",
            "Set is missing a name and/or a set code. Both of these values must be filled",
        ));
    }

    let duplicates = duplicate_references(&[], &set.content_ids);
    if !duplicates.is_empty() {
        return Err(ApiError::DuplicateReferences {
            board: "contentIds".to_string(),
            ids: duplicates,
        });
    }

    let report = check_references(state.store.as_ref(), &set.content_ids).await?;
    ApiError::check_report(report)?;

    let created = Repository::<CardSet>::new(state.store.as_ref())
        .create(set, &grant.owner)
        .await?;

    Ok(ApiResponse::message("Successfully created new set", "setCode", &created.code))
}

/// DELETE /api/v1/set - Delete the resolved owner's set `setCode`
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SetQuery>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Set)?;
    let code = require_param(query.set_code, "setCode")?;

    let deleted = Repository::<CardSet>::new(state.store.as_ref())
        .delete(&code, &grant.owner)
        .await?;

    Ok(ApiResponse::message("Successfully deleted set", "setCode", &deleted.code))
}
