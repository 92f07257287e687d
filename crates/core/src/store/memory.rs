use super::{
    Document, DocumentList, DocumentStore, Filter, Order, Query, CREATED_AT_KEY, ID_KEY,
    UPDATED_AT_KEY,
};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    document: Document,
}

/// In-process document store.
///
/// Contents live for the lifetime of the value. Used when no remote backend is configured and
/// throughout the test suites.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Stored>>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn is_metadata(key: &str) -> bool {
    key.starts_with('$')
}

fn matches(document: &Document, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Equal(attribute, value) => document.get(attribute) == Some(value),
    })
}

/// Missing values sort first. Values of different kinds compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, id: &str, data: Document) -> StoreResult<Document> {
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let documents = collections.entry(collection.to_string()).or_default();

        if documents
            .iter()
            .any(|s| s.document.get(ID_KEY).and_then(Value::as_str) == Some(id))
        {
            return Err(StoreError::Backend(format!(
                "document with the requested ID '{id}' already exists"
            )));
        }

        let mut document: Document = data.into_iter().filter(|(k, _)| !is_metadata(k)).collect();
        let timestamp = now();
        document.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        document.insert(CREATED_AT_KEY.to_string(), timestamp.clone());
        document.insert(UPDATED_AT_KEY.to_string(), timestamp);

        let seq = self.next_seq.fetch_add(1, AtomicOrdering::SeqCst);
        documents.push(Stored {
            seq,
            document: document.clone(),
        });
        Ok(document)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        collections
            .get(collection)
            .and_then(|docs| {
                docs.iter()
                    .find(|s| s.document.get(ID_KEY).and_then(Value::as_str) == Some(id))
            })
            .map(|s| s.document.clone())
            .ok_or_else(|| not_found(collection, id))
    }

    async fn list(&self, collection: &str, query: &Query) -> StoreResult<DocumentList> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        let mut found: Vec<&Stored> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|s| matches(&s.document, &query.filters))
                    .collect()
            })
            .unwrap_or_default();

        match &query.order {
            Some(Order::Asc(attribute)) => found.sort_by(|a, b| {
                compare_values(a.document.get(attribute), b.document.get(attribute))
                    .then(a.seq.cmp(&b.seq))
            }),
            Some(Order::Desc(attribute)) => found.sort_by(|a, b| {
                compare_values(b.document.get(attribute), a.document.get(attribute))
                    .then(b.seq.cmp(&a.seq))
            }),
            None => found.sort_by_key(|s| s.seq),
        }

        let total = found.len();
        let documents = found
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|s| s.document.clone())
            .collect();

        Ok(DocumentList { total, documents })
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> StoreResult<Document> {
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let stored = collections
            .get_mut(collection)
            .and_then(|docs| {
                docs.iter_mut()
                    .find(|s| s.document.get(ID_KEY).and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| not_found(collection, id))?;

        for (key, value) in data {
            if !is_metadata(&key) {
                stored.document.insert(key, value);
            }
        }
        stored
            .document
            .insert(UPDATED_AT_KEY.to_string(), now());

        Ok(stored.document.clone())
    }
}
