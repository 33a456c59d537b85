use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Aggregate, ApiMeta, Card};
use crate::auth::ResourceKind;
use crate::boards::Boards;
use crate::database::{filter, Filter};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub deck_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(default)]
    pub main_board: Vec<String>,

    #[serde(default)]
    pub side_board: Vec<String>,

    #[serde(default)]
    pub commander: Vec<String>,

    #[serde(rename = "mtgjsonApiMeta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiMeta>,
}

impl Aggregate for Deck {
    const KIND: ResourceKind = ResourceKind::Deck;
    const KEY_FIELD: &'static str = "deckCode";

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

impl Boards for Deck {
    const BOARDS: &'static [&'static str] = &["mainBoard", "sideBoard", "commander"];

    fn board(&self, name: &str) -> Option<&Vec<String>> {
        match name {
            "mainBoard" => Some(&self.main_board),
            "sideBoard" => Some(&self.side_board),
            "commander" => Some(&self.commander),
            _ => None,
        }
    }

    fn board_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        match name {
            "mainBoard" => Some(&mut self.main_board),
            "sideBoard" => Some(&mut self.side_board),
            "commander" => Some(&mut self.commander),
            _ => None,
        }
    }
}

/// A deck's boards resolved to full card documents.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckContents {
    pub main_board: Vec<Card>,
    pub side_board: Vec<Card>,
    pub commander: Vec<Card>,
}
