//! Reference integrity of submitted card ids.
//!
//! A card id is valid when it is a canonical (lowercase, hyphenated) version 5
//! UUID *and* a card with that `identifiers.mtgjsonV4Id` exists. Both stages
//! are evaluated for every id so one response can report every problem.

use std::collections::{BTreeSet, HashSet};

use futures::future::try_join_all;
use serde::Serialize;
use uuid::{Uuid, Variant};

use crate::database::{DatabaseError, DocumentStore};
use crate::models::{Aggregate, Card};

/// Structural check for a card id.
pub fn is_card_id(candidate: &str) -> bool {
    let Ok(uuid) = Uuid::try_parse(candidate) else {
        return false;
    };

    // try_parse also accepts simple, braced, urn and uppercase forms
    uuid.get_version_num() == 5
        && uuid.get_variant() == Variant::RFC4122
        && uuid.hyphenated().to_string() == candidate
}

/// Partition of a list of card ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceReport {
    /// Well formed and existing, in input order (duplicates kept).
    pub valid: Vec<String>,
    /// Not a canonical v5 UUID.
    pub malformed: BTreeSet<String>,
    /// Well formed but no such card.
    pub missing: BTreeSet<String>,
}

impl ReferenceReport {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty() && self.missing.is_empty()
    }
}

/// Partition `ids` using `exists` for the existence stage. `exists` is only
/// consulted for well-formed ids.
pub fn validate_references<I, S, F>(ids: I, exists: F) -> ReferenceReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut report = ReferenceReport::default();

    for id in ids {
        let id = id.as_ref();
        if !is_card_id(id) {
            report.malformed.insert(id.to_string());
        } else if !exists(id) {
            report.missing.insert(id.to_string());
        } else {
            report.valid.push(id.to_string());
        }
    }

    report
}

/// Run `validate_references` against the card collection of `store`. Each
/// distinct well-formed id is looked up once; lookups run concurrently.
pub async fn check_references(store: &dyn DocumentStore, ids: &[String]) -> Result<ReferenceReport, DatabaseError> {
    let candidates: BTreeSet<&str> = ids
        .iter()
        .map(String::as_str)
        .filter(|id| is_card_id(id))
        .collect();

    let lookups = candidates.iter().map(|id| async move {
        let filter = Card::key_filter(id);
        store
            .find_one(<Card as Aggregate>::KIND.collection(), &filter)
            .await
            .map(|found| found.map(|_| *id))
    });

    let existing: HashSet<&str> = try_join_all(lookups).await?.into_iter().flatten().collect();

    Ok(validate_references(ids, |id| existing.contains(id)))
}

/// Ids that would appear more than once on a board if `incoming` were added to
/// `current`: repeats within `incoming` and ids already on the board.
pub fn duplicate_references(current: &[String], incoming: &[String]) -> BTreeSet<String> {
    let mut seen: HashSet<&str> = current.iter().map(String::as_str).collect();
    let mut duplicates = BTreeSet::new();

    for id in incoming {
        if !seen.insert(id.as_str()) {
            duplicates.insert(id.clone());
        }
    }

    duplicates
}
