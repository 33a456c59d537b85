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
use crate::models::{Aggregate, Card};
use crate::state::AppState;
use crate::validation::is_card_id;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardQuery {
    pub card_id: Option<String>,
    pub owner: Option<String>,
    pub limit: Option<String>,
}

fn ensure_card_id(id: &str) -> Result<(), ApiError> {
    if is_card_id(id) {
        Ok(())
    } else {
        Err(ApiError::malformed("cardId", "Card ids must be lowercase version 5 UUIDs"))
    }
}

/// GET /api/v1/card - One card by `cardId`, or an index of the catalog
///
/// The card catalog is shared, so lookups are not filtered by owner and an
/// `owner` parameter is ignored.
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CardQuery>,
) -> ApiResult<Value> {
    authorize(&auth_user, None, Action::Read, ResourceKind::Card)?;
    let repository = Repository::<Card>::new(state.store.as_ref());

    let result = match non_empty(query.card_id) {
        Some(id) => {
            ensure_card_id(&id)?;
            serde_json::to_value(repository.select_404(&id, None).await?)
        }
        None => {
            let limit = state.config.effective_limit(query.limit.as_deref());
            serde_json::to_value(repository.select_any(None, limit).await?)
        }
    };

    Ok(ApiResponse::success(result.map_err(ApiError::internal)?))
}

/// POST /api/v1/card - Add a card to the catalog
///
/// The card must carry `identifiers.mtgjsonV4Id`; nothing is written otherwise.
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CardQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Card)?;
    let card: Card = parse_new(json_body(body)?)?;

    let Some(id) = card.key() else {
        return Err(ApiError::malformed(
            "identifiers",
            "Card is missing identifiers.mtgjsonV4Id",
        ));
    };
    ensure_card_id(id)?;

    let created = Repository::<Card>::new(state.store.as_ref())
        .create(card, &grant.owner)
        .await?;

    Ok(ApiResponse::message(
        "Successfully created new card",
        "cardId",
        created.uuid().unwrap_or_default(),
    ))
}

/// DELETE /api/v1/card - Delete the resolved owner's card `cardId`
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CardQuery>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Card)?;
    let id = require_param(query.card_id, "cardId")?;
    ensure_card_id(&id)?;

    Repository::<Card>::new(state.store.as_ref())
        .delete(&id, &grant.owner)
        .await?;

    Ok(ApiResponse::message("Successfully deleted card", "cardId", &id))
}
