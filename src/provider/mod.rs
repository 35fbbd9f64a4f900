//! Language-model provider abstractions and the Ollama-backed client.
//!
//! The pipeline consumes two narrow capabilities from a model runtime: turning
//! text into fixed-length vectors and completing a prompt. Both are expressed
//! as traits so the orchestration layers can be exercised with in-memory
//! doubles; the production implementation issues HTTP requests directly to a
//! local Ollama runtime.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Default base URL for a local Ollama runtime.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors raised by language-model providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider endpoint was unreachable or refused the request.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    /// Provider responded with an error status.
    #[error("Provider request failed: {0}")]
    RequestFailed(String),
    /// Provider response could not be parsed or violated an invariant.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied chunk of text.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Interface implemented by chat-completion backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Complete a single prompt and return the model's reply.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// HTTP client for a local Ollama runtime, implementing both provider traits.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    embedding_model: String,
    chat_model: String,
    embedding_dimension: usize,
}

impl OllamaClient {
    /// Construct a client for the given runtime URL and model pair.
    pub fn new(
        base_url: Option<String>,
        embedding_model: String,
        chat_model: String,
        embedding_dimension: usize,
    ) -> Self {
        let http = Client::builder()
            .user_agent("aerodesk/0.1")
            .build()
            .expect("Failed to construct reqwest::Client for Ollama");
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        tracing::debug!(
            url = %base_url,
            embedding_model = %embedding_model,
            chat_model = %chat_model,
            "Initialized Ollama client"
        );
        Self {
            http,
            base_url,
            embedding_model,
            chat_model,
            embedding_dimension,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let payload = json!({
            "model": self.embedding_model,
            "prompt": text,
        });

        let response = self
            .http
            .post(self.endpoint("api/embeddings"))
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ProviderError::Unavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|error| {
            ProviderError::InvalidResponse(format!("failed to decode embedding response: {error}"))
        })?;

        if body.embedding.len() != self.embedding_dimension {
            return Err(ProviderError::InvalidResponse(format!(
                "embedding dimension mismatch: expected {}, got {}",
                self.embedding_dimension,
                body.embedding.len()
            )));
        }

        Ok(body.embedding)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl EmbeddingClient for OllamaClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "no texts provided".to_string(),
            ));
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in &texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let payload = json!({
            "model": self.chat_model,
            "prompt": prompt,
            "stream": false,
            "options": {
                // Lower temperature keeps grounded answers and routing stable.
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(self.endpoint("api/generate"))
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ProviderError::Unavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::Unavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint("api/generate")
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            ProviderError::InvalidResponse(format!("failed to decode generate response: {error}"))
        })?;

        if !body.done {
            return Err(ProviderError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}
