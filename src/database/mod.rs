pub mod manager;
pub mod memory;
pub mod repository;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use manager::PgDocumentStore;
pub use memory::MemoryStore;
pub use repository::Repository;

use crate::auth::ResourceKind;

/// Errors raised by document store implementations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Document must be a JSON object")]
    InvalidDocument,

    #[error("Not found: {kind} {id}")]
    NotFound {
        kind: ResourceKind,
        key_field: &'static str,
        id: String,
    },

    #[error("Already exists: {kind} {id}")]
    AlreadyExists {
        kind: ResourceKind,
        key_field: &'static str,
        id: String,
    },

    /// Raised by stores that enforce key uniqueness on insert.
    #[error("Duplicate key in {0}")]
    DuplicateKey(String),

    #[error("Version conflict on {kind} {id}")]
    VersionConflict {
        kind: ResourceKind,
        key_field: &'static str,
        id: String,
    },

    #[error("Expected to delete exactly one {kind} {id}, deleted {deleted}")]
    DeleteFailed {
        kind: ResourceKind,
        id: String,
        deleted: u64,
    },

    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// A JSON object matched against stored documents by containment: every key
/// in the filter must be present in the document with a containing value.
pub type Filter = Map<String, Value>;

/// Build a filter from a `json!` literal. Non-object values yield an empty
/// filter, which matches every document.
pub fn filter(value: Value) -> Filter {
    match value {
        Value::Object(map) => map,
        _ => Filter::new(),
    }
}

/// Document-oriented persistence. Implementations must be safe for concurrent
/// use; callers add no locking of their own.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, DatabaseError>;

    /// At most `limit` documents matching `filter`, in insertion order.
    async fn index(&self, collection: &str, filter: &Filter, limit: i64) -> Result<Vec<Value>, DatabaseError>;

    async fn insert(&self, collection: &str, document: &Value) -> Result<(), DatabaseError>;

    /// Replace the first document matching `filter`. Returns the number of
    /// documents matched (0 or 1).
    async fn replace(&self, collection: &str, filter: &Filter, document: &Value) -> Result<u64, DatabaseError>;

    /// Delete the first document matching `filter`. Returns the deleted count.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// JSON containment with the semantics of PostgreSQL's `jsonb @> jsonb`
/// for the object and scalar shapes used in filters.
pub fn contains(document: &Value, pattern: &Value) -> bool {
    match (document, pattern) {
        (Value::Object(doc), Value::Object(pat)) => pat
            .iter()
            .all(|(key, sub)| doc.get(key).is_some_and(|value| contains(value, sub))),
        (Value::Array(doc), Value::Array(pat)) => pat
            .iter()
            .all(|sub| doc.iter().any(|value| contains(value, sub))),
        (Value::Array(doc), scalar) if !scalar.is_object() => doc.iter().any(|value| value == scalar),
        (doc, pat) => doc == pat,
    }
}
