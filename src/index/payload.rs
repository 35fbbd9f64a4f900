//! Helpers for constructing and hashing index payloads.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload object stored alongside each indexed chunk.
pub(crate) fn build_payload(
    text: &str,
    source: &str,
    seq: usize,
    chunk_hash: &str,
    timestamp_rfc3339: &str,
) -> Value {
    let mut payload = Map::new();
    payload.insert("text".into(), Value::String(text.to_string()));
    payload.insert("source".into(), Value::String(source.to_string()));
    payload.insert("seq".into(), Value::from(seq));
    payload.insert("chunk_hash".into(), Value::String(chunk_hash.to_string()));
    payload.insert(
        "timestamp".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct an identifier suitable for index points.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}
