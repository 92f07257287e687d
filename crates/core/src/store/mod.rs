//! Document store seam.
//!
//! Services never talk to a database directly; they hold an `Arc<dyn DocumentStore>` chosen at
//! startup (see [`build_store`](crate::config::build_store)). Documents are schemaless JSON
//! objects. Typed entities are produced with [`decode`] and turned back into documents with
//! [`encode`].

mod appwrite;
mod memory;

pub use appwrite::AppwriteStore;
pub use memory::MemoryStore;

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A schemaless record as held by the backend.
pub type Document = Map<String, Value>;

pub const ID_KEY: &str = "$id";
pub const CREATED_AT_KEY: &str = "$createdAt";
pub const UPDATED_AT_KEY: &str = "$updatedAt";

/// One page of a listing. `total` counts every match, ignoring the query limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentList {
    pub total: usize,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Attribute equals the value exactly.
    Equal(String, Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    Asc(String),
    Desc(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest documents first. The default ordering for appointment listings.
    pub fn recent_first() -> Self {
        Self {
            order: Some(Order::Desc(CREATED_AT_KEY.to_string())),
            ..Self::default()
        }
    }

    pub fn equal(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Equal(attribute.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Backend-agnostic document storage.
///
/// Implementations assign the `$id`, `$createdAt` and `$updatedAt` metadata keys. `get` and
/// `update` report a missing document as [`StoreError::NotFound`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, collection: &str, id: &str, data: Document) -> StoreResult<Document>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document>;

    async fn list(&self, collection: &str, query: &Query) -> StoreResult<DocumentList>;

    /// Merge `data` into an existing document. Metadata keys in `data` are ignored.
    async fn update(&self, collection: &str, id: &str, data: Document) -> StoreResult<Document>;
}

/// Decode a stored document into an entity, naming the failing field path on error.
pub fn decode<T: DeserializeOwned>(document: Document) -> StoreResult<T> {
    serde_path_to_error::deserialize(Value::Object(document))
        .map_err(|e| StoreError::Decode(format!("{}: {}", e.path(), e.inner())))
}

/// Encode a value as document fields. The value must serialize to a JSON object.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> StoreResult<Document> {
    match crate::serialize::serialize(value) {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Encode(format!(
            "expected an object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        #[serde(rename = "$id")]
        id: String,
        user_id: String,
        count: u32,
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_decode_reads_metadata_and_fields() {
        let sample: Sample = decode(doc(json!({"$id": "a1", "userId": "u1", "count": 3}))).unwrap();
        assert_eq!(
            sample,
            Sample {
                id: "a1".into(),
                user_id: "u1".into(),
                count: 3
            }
        );
    }

    #[test]
    fn test_decode_error_names_field_path() {
        let err = decode::<Sample>(doc(json!({"$id": "a1", "userId": "u1", "count": "three"})))
            .unwrap_err();
        match err {
            StoreError::Decode(message) => assert!(message.starts_with("count"), "{message}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_encode_requires_object() {
        assert!(encode(&json!({"a": 1})).is_ok());
        assert!(matches!(encode(&5), Err(StoreError::Encode(_))));
    }

    #[test]
    fn test_query_builder() {
        let query = Query::recent_first().equal("userId", "u1").limit(10);
        assert_eq!(query.order, Some(Order::Desc("$createdAt".into())));
        assert_eq!(query.filters, vec![Filter::Equal("userId".into(), json!("u1"))]);
        assert_eq!(query.limit, Some(10));
    }
}
