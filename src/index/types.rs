//! Shared types used by the vector index and its Qdrant implementation.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with the index backend.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid index URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Backend responded with an unexpected status code.
    #[error("Unexpected index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the backend.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Prepared chunk ready for indexing, including provenance and vector.
#[derive(Debug, Clone)]
pub struct ChunkInsert {
    /// Raw chunk text.
    pub text: String,
    /// Identifier of the source document the chunk was cut from.
    pub source: String,
    /// Position of the chunk within its source document.
    pub seq: usize,
    /// Deterministic hash of the chunk used for dedupe.
    pub chunk_hash: String,
    /// Embedding vector produced for the chunk.
    pub vector: Vec<f32>,
}

/// Nearest-neighbor match returned by [`crate::index::VectorIndex::query`].
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Stored chunk text.
    pub text: String,
    /// Distance from the query vector; smaller is closer.
    pub distance: f32,
    /// Source document the chunk belongs to.
    pub source: String,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    pub(crate) result: QueryResponseResult,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryResponseResult {
    Points(Vec<QueryPoint>),
    Object {
        #[serde(default)]
        points: Vec<QueryPoint>,
        #[serde(default)]
        _count: Option<usize>,
    },
}

#[derive(Deserialize)]
pub(crate) struct QueryPoint {
    pub(crate) score: f32,
    #[serde(default)]
    pub(crate) payload: Option<Map<String, Value>>,
}
