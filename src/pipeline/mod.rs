//! Retrieval pipeline: chunking, text extraction, ingestion, and answers.

pub mod answer;
pub mod chunking;
pub mod extract;
pub mod ingest;

pub use answer::{AnswerGenerator, NO_RESPONSE_FALLBACK};
pub use chunking::{DEFAULT_CHUNK_SIZE, chunk_text};
pub use extract::{OcrEngine, TesseractCli};
pub use ingest::{CorpusIngestor, IngestError, IngestSummary};
