//! One-shot corpus ingestion populating the document index.

use crate::index::{ChunkInsert, IndexError, IndexHandle, VectorIndex, compute_chunk_hash};
use crate::metrics::SupportMetrics;
use crate::pipeline::chunking::chunk_text;
use crate::pipeline::extract::{OcrEngine, extract_document_text};
use crate::provider::{EmbeddingClient, ProviderError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

/// Errors emitted while populating the index from a corpus directory.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Embedding provider failed to produce vectors for the chunks.
    #[error("Failed to generate embeddings: {0}")]
    Provider(#[from] ProviderError),
    /// Index backend rejected a write.
    #[error("Index request failed: {0}")]
    Index(#[from] IndexError),
}

/// Counters describing a completed ingestion pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestSummary {
    /// Documents whose chunks were stored in the index.
    pub documents: usize,
    /// Total chunks stored across all documents.
    pub chunks: usize,
    /// Documents skipped because no text could be extracted.
    pub skipped: usize,
}

/// Populates the document index from a directory of source documents.
///
/// Ingestion always starts from a clean collection (delete-then-recreate), so
/// re-running it is idempotent rather than additive.
pub struct CorpusIngestor {
    embedder: Arc<dyn EmbeddingClient>,
    ocr: Arc<dyn OcrEngine>,
    chunk_size: usize,
    metrics: Arc<SupportMetrics>,
}

impl CorpusIngestor {
    /// Build an ingestor with the given collaborators and chunk budget.
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        ocr: Arc<dyn OcrEngine>,
        chunk_size: usize,
        metrics: Arc<SupportMetrics>,
    ) -> Self {
        Self {
            embedder,
            ocr,
            chunk_size,
            metrics,
        }
    }

    /// Rebuild and populate the index, failing soft into an unavailable handle.
    ///
    /// A backend that cannot be rebuilt yields [`IndexHandle::Unavailable`];
    /// an ingestion error after the rebuild leaves whatever was indexed in
    /// place and still returns a ready handle, since a partial corpus serves
    /// users better than no corpus.
    pub async fn ingest(&self, dir: &Path, index: Arc<dyn VectorIndex>) -> IndexHandle {
        if let Err(error) = index.rebuild().await {
            tracing::warn!(error = %error, "Vector index unavailable; queries will degrade");
            return IndexHandle::Unavailable;
        }

        match self.populate(dir, index.as_ref()).await {
            Ok(summary) => {
                tracing::info!(
                    documents = summary.documents,
                    chunks = summary.chunks,
                    skipped = summary.skipped,
                    "Corpus ingestion complete"
                );
            }
            Err(error) => {
                tracing::error!(error = %error, "Corpus ingestion aborted; serving partial index");
            }
        }

        IndexHandle::ready(index)
    }

    /// Walk the corpus directory and index every readable document.
    pub async fn populate(
        &self,
        dir: &Path,
        index: &dyn VectorIndex,
    ) -> Result<IngestSummary, IngestError> {
        let mut summary = IngestSummary::default();

        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "Corpus directory not found; index left empty");
            return Ok(summary);
        }

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(error = %error, "Skipping unreadable corpus entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(text) = extract_document_text(path, self.ocr.as_ref()).await else {
                continue;
            };
            let source = entry.file_name().to_string_lossy().to_string();

            if text.trim().is_empty() {
                tracing::info!(source = %source, "No text extracted; skipping document");
                summary.skipped += 1;
                continue;
            }

            let stored = self.index_document(&source, &text, index).await?;
            summary.documents += 1;
            summary.chunks += stored;
        }

        Ok(summary)
    }

    async fn index_document(
        &self,
        source: &str,
        text: &str,
        index: &dyn VectorIndex,
    ) -> Result<usize, IngestError> {
        let chunks = chunk_text(text, self.chunk_size);

        // Repeated boilerplate (headers, footers) collapses to one entry per document.
        let mut seen = HashSet::new();
        let mut prepared: Vec<(String, String)> = Vec::new();
        for chunk in chunks {
            let hash = compute_chunk_hash(&chunk);
            if seen.insert(hash.clone()) {
                prepared.push((chunk, hash));
            }
        }

        if prepared.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = prepared.iter().map(|(text, _)| text.clone()).collect();
        let embeddings = self.embedder.generate_embeddings(texts).await?;
        debug_assert_eq!(prepared.len(), embeddings.len());

        let inserts: Vec<ChunkInsert> = prepared
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(seq, ((text, chunk_hash), vector))| ChunkInsert {
                text,
                source: source.to_string(),
                seq,
                chunk_hash,
                vector,
            })
            .collect();

        let stored = index.add_batch(inserts).await?;
        self.metrics.record_document(stored as u64);
        tracing::debug!(source = %source, chunks = stored, "Document indexed");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RetrievedChunk;
    use crate::pipeline::extract::OcrError;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn generate_embeddings(
            &self,
            texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
        }
    }

    struct NoOcr;

    #[async_trait]
    impl OcrEngine for NoOcr {
        async fn recognize(&self, _image: &Path) -> Result<String, OcrError> {
            Err(OcrError::Spawn(std::io::Error::other("no binary")))
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        records: Mutex<Vec<ChunkInsert>>,
        rebuilds: AtomicUsize,
        fail_rebuild: AtomicBool,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn query(
            &self,
            _vector: Vec<f32>,
            _k: usize,
        ) -> Result<Vec<RetrievedChunk>, IndexError> {
            Ok(Vec::new())
        }

        async fn add_batch(&self, chunks: Vec<ChunkInsert>) -> Result<usize, IndexError> {
            let mut records = self.records.lock().unwrap();
            let count = chunks.len();
            records.extend(chunks);
            Ok(count)
        }

        async fn rebuild(&self) -> Result<(), IndexError> {
            if self.fail_rebuild.load(Ordering::Relaxed) {
                return Err(IndexError::InvalidUrl("backend down".into()));
            }
            self.rebuilds.fetch_add(1, Ordering::Relaxed);
            self.records.lock().unwrap().clear();
            Ok(())
        }
    }

    fn test_ingestor() -> CorpusIngestor {
        CorpusIngestor::new(
            Arc::new(FixedEmbedder),
            Arc::new(NoOcr),
            40,
            Arc::new(SupportMetrics::new()),
        )
    }

    fn write_doc(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).expect("create doc");
        write!(file, "{content}").expect("write doc");
    }

    #[tokio::test]
    async fn populates_index_from_text_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_doc(
            dir.path(),
            "baggage.txt",
            "Checked bags may weigh 23 kg. Carry-on bags may weigh 8 kg.",
        );
        write_doc(dir.path(), "empty.txt", "   ");

        let index = Arc::new(RecordingIndex::default());
        let summary = test_ingestor()
            .populate(dir.path(), index.as_ref())
            .await
            .expect("populate");

        assert_eq!(summary.documents, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.chunks >= 2);

        let records = index.records.lock().unwrap();
        assert_eq!(records.len(), summary.chunks);
        assert!(records.iter().all(|record| record.source == "baggage.txt"));
        assert_eq!(records[0].seq, 0);
    }

    #[tokio::test]
    async fn duplicate_chunks_are_indexed_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_doc(dir.path(), "dup.txt", "Same sentence here. Same sentence here.");

        // A 20-char budget splits the document into two identical chunks.
        let ingestor = CorpusIngestor::new(
            Arc::new(FixedEmbedder),
            Arc::new(NoOcr),
            20,
            Arc::new(SupportMetrics::new()),
        );
        let index = Arc::new(RecordingIndex::default());
        let summary = ingestor
            .populate(dir.path(), index.as_ref())
            .await
            .expect("populate");

        assert_eq!(summary.chunks, 1);
    }

    #[tokio::test]
    async fn missing_directory_yields_empty_index() {
        let index = Arc::new(RecordingIndex::default());
        let summary = test_ingestor()
            .populate(Path::new("/nonexistent/corpus"), index.as_ref())
            .await
            .expect("populate");

        assert_eq!(summary.documents, 0);
        assert_eq!(summary.chunks, 0);
        assert!(index.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reingestion_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_doc(
            dir.path(),
            "faq.txt",
            "Refunds take ten days. Upgrades depend on availability.",
        );

        let ingestor = test_ingestor();
        let index: Arc<RecordingIndex> = Arc::new(RecordingIndex::default());

        let first = ingestor
            .ingest(dir.path(), index.clone() as Arc<dyn VectorIndex>)
            .await;
        assert!(first.is_available());
        let first_count = index.records.lock().unwrap().len();

        let second = ingestor
            .ingest(dir.path(), index.clone() as Arc<dyn VectorIndex>)
            .await;
        assert!(second.is_available());
        let second_count = index.records.lock().unwrap().len();

        assert_eq!(first_count, second_count);
        assert_eq!(index.rebuilds.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn rebuild_failure_yields_unavailable_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = Arc::new(RecordingIndex::default());
        index.fail_rebuild.store(true, Ordering::Relaxed);

        let handle = test_ingestor()
            .ingest(dir.path(), index as Arc<dyn VectorIndex>)
            .await;
        assert!(!handle.is_available());
    }
}
