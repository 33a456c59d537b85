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
use crate::models::{Deck, DeckContents};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckContentQuery {
    pub deck_code: Option<String>,
    pub owner: Option<String>,
}

/// GET /api/v1/deck/content - The deck's boards resolved to full cards
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DeckContentQuery>,
) -> ApiResult<DeckContents> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Read, ResourceKind::Deck)?;
    let code = require_param(query.deck_code, "deckCode")?;

    let store = state.store.as_ref();
    let deck = Repository::<Deck>::new(store)
        .select_404(&code, Some(&grant.owner))
        .await?;

    let (main_board, side_board, commander) = futures::try_join!(
        content::resolve_cards(store, &deck.main_board),
        content::resolve_cards(store, &deck.side_board),
        content::resolve_cards(store, &deck.commander),
    )?;

    Ok(ApiResponse::success(DeckContents {
        main_board,
        side_board,
        commander,
    }))
}

/// POST /api/v1/deck/content - Add cards: `{"mainBoard": [ids], ...}`
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DeckContentQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Deck)?;
    let code = require_param(query.deck_code, "deckCode")?;
    let request = content::parse_request::<Deck>(json_body(body)?)?;

    let added = content::add::<Deck>(state.store.as_ref(), &code, &grant.owner, &request).await?;

    Ok(ApiResponse::message_with("Successfully updated deck", "deckCode", &code, count("added", added)))
}

/// DELETE /api/v1/deck/content - Remove cards: `{"mainBoard": [ids], ...}`
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DeckContentQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let grant = authorize(&auth_user, query.owner.as_deref(), Action::Write, ResourceKind::Deck)?;
    let code = require_param(query.deck_code, "deckCode")?;
    let request = content::parse_request::<Deck>(json_body(body)?)?;

    let removed = content::remove::<Deck>(state.store.as_ref(), &code, &grant.owner, &request).await?;

    Ok(ApiResponse::message_with(
        "Successfully removed cards from deck",
        "deckCode",
        &code,
        count("removed", removed),
    ))
}
