//! Board content edits shared by `/deck/content` and `/set/content`.
//!
//! A request body maps board names to card ids. Every id is validated and
//! every duplicate detected before any board is touched; the aggregate is then
//! mutated in memory and written back with a single version-checked replace.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures::future::try_join_all;
use serde_json::Value;

use crate::boards::{add_references, ensure_board, remove_references, Boards};
use crate::database::{DatabaseError, DocumentStore, Repository};
use crate::error::ApiError;
use crate::models::{Aggregate, Card};
use crate::validation::{check_references, duplicate_references, is_card_id};

/// `{ "<board>": [ids] }`, boards in name order.
pub type ContentRequest = BTreeMap<String, Vec<String>>;

/// Decode and board-check a content request for `A`.
pub fn parse_request<A: Boards>(body: Value) -> Result<ContentRequest, ApiError> {
    let request: ContentRequest = serde_json::from_value(body).map_err(|e| {
        ApiError::malformed(
            "body",
            format!("Content must map board names to lists of card ids: {e}"),
        )
    })?;

    for board in request.keys() {
        ensure_board::<A>(board)?;
    }
    Ok(request)
}

fn all_ids(request: &ContentRequest) -> Vec<String> {
    request.values().flatten().cloned().collect()
}

/// Add the requested ids to `key`'s boards. Returns the number of ids added.
pub async fn add<A>(store: &dyn DocumentStore, key: &str, owner: &str, request: &ContentRequest) -> Result<usize, ApiError>
where
    A: Aggregate + Boards,
{
    let repository = Repository::<A>::new(store);
    let mut aggregate = repository.select_404(key, Some(owner)).await?;

    let report = check_references(store, &all_ids(request)).await?;
    ApiError::check_report(report)?;

    for (board, ids) in request {
        let current = aggregate.board(board).map(Vec::as_slice).unwrap_or_default();
        let duplicates = duplicate_references(current, ids);
        if !duplicates.is_empty() {
            return Err(ApiError::DuplicateReferences {
                board: board.clone(),
                ids: duplicates,
            });
        }
    }

    let mut added = 0;
    for (board, ids) in request {
        added += add_references(&mut aggregate, board, ids)?;
    }

    repository.replace(&mut aggregate).await?;
    tracing::info!("Added {} card(s) to {} {}", added, A::KIND, key);
    Ok(added)
}

/// Remove the requested ids from `key`'s boards. Ids must be well formed but
/// need not exist or be on the board. Returns the number actually removed.
pub async fn remove<A>(store: &dyn DocumentStore, key: &str, owner: &str, request: &ContentRequest) -> Result<usize, ApiError>
where
    A: Aggregate + Boards,
{
    let repository = Repository::<A>::new(store);
    let mut aggregate = repository.select_404(key, Some(owner)).await?;

    let malformed: BTreeSet<String> = all_ids(request).into_iter().filter(|id| !is_card_id(id)).collect();
    if !malformed.is_empty() {
        return Err(ApiError::ReferenceInvalid {
            malformed,
            missing: BTreeSet::new(),
        });
    }

    let mut removed = 0;
    for (board, ids) in request {
        removed += remove_references(&mut aggregate, board, ids)?;
    }

    if removed > 0 {
        repository.replace(&mut aggregate).await?;
    }
    tracing::info!("Removed {} card(s) from {} {}", removed, A::KIND, key);
    Ok(removed)
}

/// Look up the cards behind `ids`, preserving order and repeats. Ids with no
/// matching card are skipped.
pub async fn resolve_cards(store: &dyn DocumentStore, ids: &[String]) -> Result<Vec<Card>, DatabaseError> {
    let repository = Repository::<Card>::new(store);
    let distinct: BTreeSet<&str> = ids.iter().map(String::as_str).collect();

    let lookups = distinct.iter().map(|id| {
        let repository = &repository;
        async move { repository.select_one(id, None).await.map(|card| (*id, card)) }
    });

    let found: HashMap<&str, Card> = try_join_all(lookups)
        .await?
        .into_iter()
        .filter_map(|(id, card)| card.map(|card| (id, card)))
        .collect();

    Ok(ids
        .iter()
        .filter_map(|id| {
            let card = found.get(id.as_str()).cloned();
            if card.is_none() {
                tracing::warn!("Board references unknown card {}", id);
            }
            card
        })
        .collect())
}
