use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion and escalation activity.
#[derive(Default)]
pub struct SupportMetrics {
    documents_indexed: AtomicU64,
    chunks_indexed: AtomicU64,
    escalations_dispatched: AtomicU64,
    escalation_failures: AtomicU64,
}

impl SupportMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ingested document and the number of chunks produced for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record an escalation dispatch attempt and whether the relay accepted it.
    pub fn record_escalation(&self, delivered: bool) {
        self.escalations_dispatched.fetch_add(1, Ordering::Relaxed);
        if !delivered {
            self.escalation_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            escalations_dispatched: self.escalations_dispatched.load(Ordering::Relaxed),
            escalation_failures: self.escalation_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of support counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of corpus documents indexed since startup.
    pub documents_indexed: u64,
    /// Total chunk count produced across all indexed documents.
    pub chunks_indexed: u64,
    /// Number of escalation emails handed to the relay since startup.
    pub escalations_dispatched: u64,
    /// Number of escalation dispatches the relay rejected or never received.
    pub escalation_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = SupportMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_indexed, 2);
        assert_eq!(snapshot.chunks_indexed, 5);
    }

    #[test]
    fn records_escalation_outcomes() {
        let metrics = SupportMetrics::new();
        metrics.record_escalation(true);
        metrics.record_escalation(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.escalations_dispatched, 2);
        assert_eq!(snapshot.escalation_failures, 1);
    }

    #[test]
    fn snapshot_is_consistent() {
        let metrics = SupportMetrics::new();
        assert_eq!(metrics.snapshot().documents_indexed, 0);
        assert_eq!(metrics.snapshot().chunks_indexed, 0);
        assert_eq!(metrics.snapshot().escalations_dispatched, 0);
    }
}
