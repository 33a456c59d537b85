use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{Action, AuthUser, ResourceKind};
use crate::boards::Boards;
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::protected::utils::{authorize, json_body, non_empty, parse_new, require_param};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::Deck;
use crate::state::AppState;
use crate::validation::{check_references, duplicate_references};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckQuery {
    pub deck_code: Option<String>,
    pub owner: Option<String>,
    pub limit: Option<String>,
}

/// GET /api/v1/deck - One deck by `deckCode`, or the owner's decks
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DeckQuery>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Read, ResourceKind::Deck)?;
    let repository = Repository::<Deck>::new(state.store.as_ref());

    match non_empty(query.deck_code) {
        Some(code) => {
            let deck = repository.select_404(&code, Some(&grant.owner)).await?;
            Ok(ApiResponse::success(serde_json::to_value(deck).map_err(ApiError::internal)?))
        }
        None => {
            let limit = state.config.effective_limit(query.limit.as_deref());
            let decks = repository.select_any(Some(&grant.owner), limit).await?;
            Ok(ApiResponse::success(serde_json::to_value(decks).map_err(ApiError::internal)?))
        }
    }
}

/// POST /api/v1/deck - Create a deck owned by the resolved owner
///
/// Every card on every board must exist, and no board may list a card twice.
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DeckQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Deck)?;
    let mut deck: Deck = parse_new(json_body(body)?)?;

    // keyed routes trim their query parameters, so stored keys must match
    deck.code = deck.code.trim().to_string();
    deck.name = deck.name.trim().to_string();
    if deck.code.is_empty() || deck.name.is_empty() {
        return Err(ApiError::malformed(
            "code",
            "Deck is missing a name and/or a deck code. Both of these values must be filled",
        ));
    }

    for board in Deck::BOARDS {
        let ids = deck.board(board).map(Vec::as_slice).unwrap_or_default();
        let duplicates = duplicate_references(&[], ids);
        if !duplicates.is_empty() {
            return Err(ApiError::DuplicateReferences {
                board: board.to_string(),
                ids: duplicates,
            });
        }
    }

    let report = check_references(state.store.as_ref(), &deck.all_references()).await?;
    ApiError::check_report(report)?;

    let created = Repository::<Deck>::new(state.store.as_ref())
        .create(deck, &grant.owner)
        .await?;

    Ok(ApiResponse::message("Successfully created new deck", "deckCode", &created.code))
}

/// DELETE /api/v1/deck - Delete the resolved owner's deck `deckCode`
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DeckQuery>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Deck)?;
    let code = require_param(query.deck_code, "deckCode")?;

    let deleted = Repository::<Deck>::new(state.store.as_ref())
        .delete(&code, &grant.owner)
        .await?;

    Ok(ApiResponse::message("Successfully deleted deck", "deckCode", &deleted.code))
}
