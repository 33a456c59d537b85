use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{Aggregate, ApiMeta};
use crate::auth::ResourceKind;
use crate::boards::Boards;
use crate::database::{filter, Filter};

/// An MTGJSON set. Card membership is tracked by id in `contentIds`; other set
/// attributes (baseSetSize, block, ...) are carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub set_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(default)]
    pub content_ids: Vec<String>,

    #[serde(rename = "mtgjsonApiMeta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiMeta>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Aggregate for CardSet {
    const KIND: ResourceKind = ResourceKind::Set;
    const KEY_FIELD: &'static str = "setCode";

    fn key(&self) -> Option<&str> {
        Some(self.code.as_str()).filter(|code| !code.is_empty())
    }

    fn key_filter(key: &str) -> Filter {
        filter(json!({ "code": key }))
    }

    fn meta(&self) -> Option<&ApiMeta> {
        self.meta.as_ref()
    }

    fn meta_mut(&mut self) -> &mut Option<ApiMeta> {
        &mut self.meta
    }
}

impl Boards for CardSet {
    const BOARDS: &'static [&'static str] = &["contentIds"];

    fn board(&self, name: &str) -> Option<&Vec<String>> {
        (name == "contentIds").then_some(&self.content_ids)
    }

    fn board_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        (name == "contentIds").then_some(&mut self.content_ids)
    }
}
