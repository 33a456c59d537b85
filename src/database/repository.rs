use std::marker::PhantomData;

use serde_json::{json, Value};

use crate::database::{DatabaseError, DocumentStore, Filter};
use crate::models::{owner_filter, Aggregate, ApiMeta};

/// Typed access to the collection holding `T`.
pub struct Repository<'a, T> {
    store: &'a dyn DocumentStore,
    _phantom: PhantomData<T>,
}

impl<'a, T: Aggregate> Repository<'a, T> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    fn collection() -> &'static str {
        T::KIND.collection()
    }

    fn scoped_filter(key: &str, owner: Option<&str>) -> Filter {
        let mut filter = T::key_filter(key);
        if let Some(owner) = owner {
            filter.extend(owner_filter(owner));
        }
        filter
    }

    fn decode(document: Value) -> Result<T, DatabaseError> {
        Ok(serde_json::from_value(document)?)
    }

    fn not_found(key: &str) -> DatabaseError {
        DatabaseError::NotFound {
            kind: T::KIND,
            key_field: T::KEY_FIELD,
            id: key.to_string(),
        }
    }

    /// Document under `key`, restricted to `owner` when given.
    pub async fn select_one(&self, key: &str, owner: Option<&str>) -> Result<Option<T>, DatabaseError> {
        self.store
            .find_one(Self::collection(), &Self::scoped_filter(key, owner))
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn select_404(&self, key: &str, owner: Option<&str>) -> Result<T, DatabaseError> {
        self.select_one(key, owner)
            .await?
            .ok_or_else(|| Self::not_found(key))
    }

    /// Up to `limit` documents, restricted to `owner` when given.
    pub async fn select_any(&self, owner: Option<&str>, limit: i64) -> Result<Vec<T>, DatabaseError> {
        let filter = owner.map(owner_filter).unwrap_or_default();
        self.store
            .index(Self::collection(), &filter, limit)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// Insert `aggregate` owned by `owner`. Keys are unique across owners.
    ///
    /// The lookup and the insert are separate calls; a create racing another
    /// with the same key is only caught when the store rejects duplicate keys.
    pub async fn create(&self, mut aggregate: T, owner: &str) -> Result<T, DatabaseError> {
        let key = aggregate.key().ok_or(DatabaseError::InvalidDocument)?.to_string();
        let already_exists = || DatabaseError::AlreadyExists {
            kind: T::KIND,
            key_field: T::KEY_FIELD,
            id: key.clone(),
        };

        if self.select_one(&key, None).await?.is_some() {
            return Err(already_exists());
        }

        *aggregate.meta_mut() = Some(ApiMeta::new(owner));
        match self
            .store
            .insert(Self::collection(), &serde_json::to_value(&aggregate)?)
            .await
        {
            Err(DatabaseError::DuplicateKey(_)) => return Err(already_exists()),
            other => other?,
        }

        tracing::info!("Created {} {} for {}", T::KIND, key, owner);
        Ok(aggregate)
    }

    /// Write back an aggregate previously read through this repository. The
    /// write only lands if the stored version still matches the one read.
    pub async fn replace(&self, aggregate: &mut T) -> Result<(), DatabaseError> {
        let key = aggregate.key().ok_or(DatabaseError::InvalidDocument)?.to_string();

        let mut filter = T::key_filter(&key);
        if let Some(meta) = aggregate.meta() {
            let mut expected = json!({ "owner": meta.owner });
            // documents written before versioning carry no version field
            if meta.version > 0 {
                expected["version"] = json!(meta.version);
            }
            filter.extend(crate::database::filter(json!({ "mtgjsonApiMeta": expected })));
        }

        if let Some(meta) = aggregate.meta_mut() {
            meta.touch();
        }

        let matched = self
            .store
            .replace(Self::collection(), &filter, &serde_json::to_value(&*aggregate)?)
            .await?;

        if matched == 0 {
            return Err(DatabaseError::VersionConflict {
                kind: T::KIND,
                key_field: T::KEY_FIELD,
                id: key,
            });
        }
        Ok(())
    }

    /// Delete the document under `key` owned by `owner`. Exactly one document
    /// must go.
    pub async fn delete(&self, key: &str, owner: &str) -> Result<T, DatabaseError> {
        let existing = self.select_404(key, Some(owner)).await?;

        let deleted = self
            .store
            .delete_one(Self::collection(), &Self::scoped_filter(key, Some(owner)))
            .await?;

        if deleted != 1 {
            return Err(DatabaseError::DeleteFailed {
                kind: T::KIND,
                id: key.to_string(),
                deleted,
            });
        }

        tracing::info!("Deleted {} {} owned by {}", T::KIND, key, owner);
        Ok(existing)
    }
}
