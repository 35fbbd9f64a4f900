//! Vector index abstraction over the document store.
//!
//! The pipeline talks to the index through the [`VectorIndex`] trait; the
//! production implementation is the Qdrant HTTP client in [`client`]. Index
//! initialization fails soft: callers receive an [`IndexHandle::Unavailable`]
//! sentinel instead of an error so user-facing surfaces can degrade to an
//! administrator message rather than crash.

mod client;
mod payload;
mod types;

pub use client::QdrantIndex;
pub use payload::compute_chunk_hash;
pub use types::{ChunkInsert, IndexError, RetrievedChunk};

use async_trait::async_trait;
use std::sync::Arc;

/// Interface implemented by vector-search backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `k` nearest chunks to the query vector, closest first.
    async fn query(&self, vector: Vec<f32>, k: usize) -> Result<Vec<RetrievedChunk>, IndexError>;

    /// Insert a batch of prepared chunks, returning how many were stored.
    async fn add_batch(&self, chunks: Vec<ChunkInsert>) -> Result<usize, IndexError>;

    /// Drop all entries and recreate the backing collection.
    async fn rebuild(&self) -> Result<(), IndexError>;
}

/// Shared handle to the document index, or a sentinel when the backend is down.
#[derive(Clone)]
pub enum IndexHandle {
    /// Index initialized and ready for queries.
    Ready(Arc<dyn VectorIndex>),
    /// Backend could not be initialized; queries must short-circuit.
    Unavailable,
}

impl IndexHandle {
    /// Wrap a ready index in a handle.
    pub fn ready(index: Arc<dyn VectorIndex>) -> Self {
        Self::Ready(index)
    }

    /// Return the underlying index when available.
    pub fn get(&self) -> Option<&Arc<dyn VectorIndex>> {
        match self {
            Self::Ready(index) => Some(index),
            Self::Unavailable => None,
        }
    }

    /// Whether the index accepted initialization.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
