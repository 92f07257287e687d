//! Services over the document store.
//!
//! Each service holds the resolved [`CoreConfig`](crate::config::CoreConfig) and an injected
//! store handle. Nothing here keeps state between calls.

pub mod appointments;
pub mod patients;
pub mod users;

use crate::error::{CoreError, CoreResult, StoreError};
use crate::store::{decode, DocumentStore, Query};
use serde::de::DeserializeOwned;
use serde_json::Value;
use synapse_id::DocumentId;

/// Fetch and decode one document, treating absence as `None`.
pub(crate) async fn find_by_id<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> CoreResult<Option<T>> {
    match store.get(collection, id).await {
        Ok(document) => Ok(Some(decode(document)?)),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// First document whose `attribute` equals `value`, if any.
pub(crate) async fn find_one<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    attribute: &str,
    value: impl Into<Value>,
) -> CoreResult<Option<T>> {
    let query = Query::new().equal(attribute, value).limit(1);
    let list = store.list(collection, &query).await?;
    match list.documents.into_iter().next() {
        Some(document) => Ok(Some(decode(document)?)),
        None => Ok(None),
    }
}

/// Reject ids the store could never have issued before making a round trip.
pub(crate) fn parse_id(id: &str) -> CoreResult<DocumentId> {
    Ok(DocumentId::parse(id)?)
}

/// Turn a store-level `NotFound` into a domain one naming the entity.
pub(crate) fn entity_not_found(entity: &'static str, id: &str, err: StoreError) -> CoreError {
    match err {
        StoreError::NotFound { .. } => CoreError::NotFound {
            entity,
            id: id.to_string(),
        },
        other => other.into(),
    }
}
