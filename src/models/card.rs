use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{Aggregate, ApiMeta};
use crate::auth::ResourceKind;
use crate::database::{filter, Filter};

/// An MTGJSON card. Only the fields this service reasons about are typed; the
/// rest of the MTGJSON card schema is carried through untouched.
///
/// See: https://mtgjson.com/data-models/card/card-set/
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<CardIdentifiers>,

    #[serde(rename = "mtgjsonApiMeta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiMeta>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardIdentifiers {
    #[serde(rename = "mtgjsonV4Id", default, skip_serializing_if = "Option::is_none")]
    pub mtgjson_v4_id: Option<String>,

    /// scryfallId, multiverseId, tcgplayerProductId, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Card {
    pub fn uuid(&self) -> Option<&str> {
        self.identifiers
            .as_ref()
            .and_then(|ids| ids.mtgjson_v4_id.as_deref())
    }
}

impl Aggregate for Card {
    const KIND: ResourceKind = ResourceKind::Card;
    const KEY_FIELD: &'static str = "cardId";

    fn key(&self) -> Option<&str> {
        self.uuid()
    }

    fn key_filter(key: &str) -> Filter {
        filter(json!({ "identifiers": { "mtgjsonV4Id": key } }))
    }

    fn meta(&self) -> Option<&ApiMeta> {
        self.meta.as_ref()
    }

    fn meta_mut(&mut self) -> &mut Option<ApiMeta> {
        &mut self.meta
    }
}
