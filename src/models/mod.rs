pub mod card;
pub mod deck;
pub mod meta;
pub mod set;
pub mod user;

use serde::{de::DeserializeOwned, Serialize};

use crate::auth::ResourceKind;
use crate::database::Filter;

pub use card::{Card, CardIdentifiers};
pub use deck::{Deck, DeckContents};
pub use meta::ApiMeta;
pub use set::CardSet;
pub use user::User;

/// A top-level document with an owner, a unique key and server-managed metadata.
pub trait Aggregate: Serialize + DeserializeOwned + Send + Sync {
    const KIND: ResourceKind;

    /// Name of the key used in error context, e.g. `deckCode`.
    const KEY_FIELD: &'static str;

    /// Unique key (deck/set code, card uuid, user email), if set.
    fn key(&self) -> Option<&str>;

    /// Filter selecting the document stored under `key`.
    fn key_filter(key: &str) -> Filter;

    fn meta(&self) -> Option<&ApiMeta>;

    fn meta_mut(&mut self) -> &mut Option<ApiMeta>;
}

/// Filter selecting every document owned by `owner`.
pub fn owner_filter(owner: &str) -> Filter {
    crate::database::filter(serde_json::json!({ "mtgjsonApiMeta": { "owner": owner } }))
}
