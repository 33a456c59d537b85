use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-managed bookkeeping stored under `mtgjsonApiMeta`. Clients must
/// leave it null on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    pub owner: String,
    pub creation_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    /// Incremented on every replace; writes are conditional on the version read.
    #[serde(default)]
    pub version: u64,
}

impl ApiMeta {
    pub fn new(owner: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            owner: owner.into(),
            creation_date: now,
            modified_date: now,
            version: 1,
        }
    }

    pub fn touch(&mut self) {
        self.modified_date = Utc::now();
        self.version += 1;
    }
}
