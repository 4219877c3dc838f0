use crate::models::{Point, VectorSpec};
use crate::traits::VectorStore;
use crate::StoreError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::{json, Value};

pub struct QdrantStore {
    endpoint: String,
    collection: String,
    client: Client,
}

impl QdrantStore {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            client: Client::new(),
        }
    }

    /// Client that sends `api-key` on every request, as Qdrant Cloud expects.
    pub fn with_api_key(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        api_key: &str,
    ) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(api_key.trim())
            .map_err(|error| StoreError::Request(format!("invalid qdrant api key: {error}")))?;
        headers.insert("api-key", value);

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            client,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }
}

pub(crate) fn collection_body(vector: &VectorSpec) -> Value {
    let mut vectors = serde_json::Map::new();
    vectors.insert(
        vector.name.clone(),
        json!({
            "size": vector.size,
            "distance": "Cosine",
        }),
    );
    json!({ "vectors": vectors })
}

pub(crate) fn collection_names(listing: &Value) -> Vec<String> {
    listing
        .pointer("/result/collections")
        .and_then(Value::as_array)
        .map(|collections| {
            collections
                .iter()
                .filter_map(|entry| entry.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

async fn check(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::BackendResponse {
        backend: "qdrant".to_string(),
        details: format!("{status}: {body}"),
    })
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn collection_exists(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .get(format!("{}/collections", self.endpoint))
            .send()
            .await?;
        let listing: Value = check(response).await?.json().await?;

        Ok(collection_names(&listing)
            .iter()
            .any(|name| *name == self.collection))
    }

    async fn create_collection(&self, vector: &VectorSpec) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.collection_url())
            .json(&collection_body(vector))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn upsert_points(&self, points: &[Point]) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
