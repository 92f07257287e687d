use super::{Document, DocumentList, DocumentStore, Filter, Order, Query};
use crate::config::AppwriteSettings;
use crate::error::{StoreError, StoreResult};
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

/// Most documents Appwrite returns for one list request; larger results are paged.
const PAGE_SIZE: usize = 100;

/// Document store backed by the Appwrite Databases REST API.
#[derive(Debug, Clone)]
pub struct AppwriteStore {
    client: Client,
    endpoint: String,
    database_id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    total: usize,
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

impl AppwriteStore {
    /// Build a client that authenticates every request with the project id and API key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the credentials are not valid header values or the HTTP
    /// client cannot be constructed.
    pub fn new(settings: &AppwriteSettings, database_id: &str) -> CoreResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&settings.project_id)
                .map_err(|e| CoreError::Config(format!("invalid Appwrite project id: {e}")))?,
        );
        let mut key = HeaderValue::from_str(&settings.api_key)
            .map_err(|e| CoreError::Config(format!("invalid Appwrite API key: {e}")))?;
        key.set_sensitive(true);
        headers.insert("X-Appwrite-Key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            database_id: database_id.to_string(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), id)
    }

    async fn list_page(
        &self,
        collection: &str,
        query: &Query,
        limit: usize,
        offset: usize,
    ) -> StoreResult<ListResponse> {
        let params: Vec<(&str, String)> = encode_queries(query, limit, offset)
            .into_iter()
            .map(|q| ("queries[]", q))
            .collect();
        let response = self
            .client
            .get(self.documents_url(collection))
            .query(&params)
            .send()
            .await?;
        Ok(check(response, collection, None).await?.json().await?)
    }
}

/// Encode one page of a query as Appwrite JSON query strings, one per `queries[]` parameter.
fn encode_queries(query: &Query, limit: usize, offset: usize) -> Vec<String> {
    let mut encoded = Vec::new();
    for filter in &query.filters {
        match filter {
            Filter::Equal(attribute, value) => encoded.push(
                json!({"method": "equal", "attribute": attribute, "values": [value]}).to_string(),
            ),
        }
    }
    match &query.order {
        Some(Order::Desc(attribute)) => {
            encoded.push(json!({"method": "orderDesc", "attribute": attribute}).to_string())
        }
        Some(Order::Asc(attribute)) => {
            encoded.push(json!({"method": "orderAsc", "attribute": attribute}).to_string())
        }
        None => {}
    }
    encoded.push(json!({"method": "limit", "values": [limit]}).to_string());
    if offset > 0 {
        encoded.push(json!({"method": "offset", "values": [offset]}).to_string());
    }
    encoded
}

/// Map a non-success response to a store error, preferring Appwrite's own message.
async fn check(response: Response, collection: &str, id: Option<&str>) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    Err(StoreError::Backend(format!("{status}: {message}")))
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn create(&self, collection: &str, id: &str, data: Document) -> StoreResult<Document> {
        let response = self
            .client
            .post(self.documents_url(collection))
            .json(&json!({"documentId": id, "data": Value::Object(data)}))
            .send()
            .await?;
        Ok(check(response, collection, None).await?.json().await?)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let response = self
            .client
            .get(self.document_url(collection, id))
            .send()
            .await?;
        Ok(check(response, collection, Some(id)).await?.json().await?)
    }

    async fn list(&self, collection: &str, query: &Query) -> StoreResult<DocumentList> {
        let wanted = query.limit.unwrap_or(usize::MAX);
        let mut documents = Vec::new();
        let total = loop {
            let limit = (wanted - documents.len()).clamp(1, PAGE_SIZE);
            let page = self
                .list_page(collection, query, limit, documents.len())
                .await?;
            let fetched = page.documents.len();
            documents.extend(page.documents);
            if fetched == 0 || documents.len() >= page.total || documents.len() >= wanted {
                break page.total;
            }
        };
        documents.truncate(wanted);
        tracing::debug!(
            "listed {} of {} documents from {}",
            documents.len(),
            total,
            collection
        );
        Ok(DocumentList { total, documents })
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> StoreResult<Document> {
        let data: Document = data.into_iter().filter(|(k, _)| !k.starts_with('$')).collect();
        let response = self
            .client
            .patch(self.document_url(collection, id))
            .json(&json!({"data": Value::Object(data)}))
            .send()
            .await?;
        Ok(check(response, collection, Some(id)).await?.json().await?)
    }
}
