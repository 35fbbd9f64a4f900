//! HTTP client wrapper implementing the vector index against Qdrant.

use crate::index::payload::{build_payload, current_timestamp_rfc3339, generate_point_id};
use crate::index::types::{ChunkInsert, IndexError, QueryPoint, QueryResponse, QueryResponseResult, RetrievedChunk};
use crate::index::VectorIndex;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// Lightweight HTTP client for Qdrant-backed document storage.
pub struct QdrantIndex {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) collection: String,
    pub(crate) api_key: Option<String>,
    pub(crate) vector_size: usize,
}

impl QdrantIndex {
    /// Construct a new index client for the given Qdrant instance and collection.
    pub fn new(
        url: &str,
        collection: String,
        api_key: Option<String>,
        vector_size: usize,
    ) -> Result<Self, IndexError> {
        let client = Client::builder().user_agent("aerodesk/0.1").build()?;

        let base_url = normalize_base_url(url).map_err(IndexError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            collection = %collection,
            vector_size,
            has_api_key = api_key.as_deref().map(|value| !value.is_empty()).unwrap_or(false),
            "Initialized Qdrant index client"
        );

        Ok(Self {
            client,
            base_url,
            collection,
            api_key,
            vector_size,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), IndexError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }

    async fn delete_collection(&self) -> Result<(), IndexError> {
        let response = self
            .request(Method::DELETE, &format!("collections/{}", self.collection))
            .send()
            .await?;

        // A missing collection is fine on the first run.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        self.ensure_success(response, || {
            tracing::debug!(collection = %self.collection, "Collection dropped");
        })
        .await
    }

    async fn create_collection(&self) -> Result<(), IndexError> {
        let body = json!({
            "vectors": {
                "size": self.vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{}", self.collection))
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = %self.collection, "Collection created");
        })
        .await
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn query(&self, vector: Vec<f32>, k: usize) -> Result<Vec<RetrievedChunk>, IndexError> {
        let body = json!({
            "query": vector,
            "limit": k,
            "with_payload": true,
        });

        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/query", self.collection),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(collection = %self.collection, error = %error, "Qdrant search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points, .. } => points,
        };

        Ok(points.into_iter().map(map_query_point).collect())
    }

    async fn add_batch(&self, chunks: Vec<ChunkInsert>) -> Result<usize, IndexError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let now = current_timestamp_rfc3339();
        let serialized: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let payload =
                    build_payload(&chunk.text, &chunk.source, chunk.seq, &chunk.chunk_hash, &now);
                json!({
                    "id": generate_point_id(),
                    "vector": chunk.vector,
                    "payload": payload,
                })
            })
            .collect();

        let point_count = serialized.len();
        let response = self
            .request(
                Method::PUT,
                &format!("collections/{}/points", self.collection),
            )
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = %self.collection,
                points = point_count,
                "Points indexed"
            );
        })
        .await?;

        Ok(point_count)
    }

    async fn rebuild(&self) -> Result<(), IndexError> {
        self.delete_collection().await?;
        self.create_collection().await
    }
}

fn map_query_point(point: QueryPoint) -> RetrievedChunk {
    let QueryPoint { score, payload } = point;

    let mut text = String::new();
    let mut source = "Unknown source".to_string();
    if let Some(mut map) = payload {
        if let Some(Value::String(value)) = map.remove("text") {
            text = value;
        }
        if let Some(Value::String(value)) = map.remove("source") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                source = trimmed.to_string();
            }
        }
    }

    RetrievedChunk {
        text,
        // Qdrant reports cosine similarity; callers rank by distance.
        distance: 1.0 - score,
        source,
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
