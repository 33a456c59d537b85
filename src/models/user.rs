use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Aggregate, ApiMeta};
use crate::auth::ResourceKind;
use crate::database::{filter, Filter};

/// Profile document of an account held by the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub username: String,

    #[serde(rename = "mtgjsonApiMeta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiMeta>,
}

impl Aggregate for User {
    const KIND: ResourceKind = ResourceKind::User;
    const KEY_FIELD: &'static str = "email";

    fn key(&self) -> Option<&str> {
        Some(self.email.as_str()).filter(|email| !email.is_empty())
    }

    fn key_filter(key: &str) -> Filter {
        filter(json!({ "email": key }))
    }

    fn meta(&self) -> Option<&ApiMeta> {
        self.meta.as_ref()
    }

    fn meta_mut(&mut self) -> &mut Option<ApiMeta> {
        &mut self.meta
    }
}
