//! Support service facade: the query pipeline and the satisfaction protocol.
//!
//! `SupportService` owns the injected collaborators (index handle, provider
//! clients, mailer, directory, per-session log) and exposes the two
//! operations the web layer consumes. Every answer is followed by a YES/NO
//! satisfaction exchange; a NO with contact information escalates the
//! conversation to a department and closes the session.

use crate::index::{IndexError, IndexHandle, VectorIndex};
use crate::metrics::{MetricsSnapshot, SupportMetrics};
use crate::pipeline::answer::AnswerGenerator;
use crate::pipeline::chunking::chunk_text;
use crate::provider::{ChatClient, EmbeddingClient, ProviderError};
use crate::support::SUPPORT_SOURCE;
use crate::support::classify::DepartmentClassifier;
use crate::support::department::{Department, DepartmentDirectory};
use crate::support::escalation::{EmailSender, EscalationDispatcher, EscalationRequest};
use crate::support::log::ConversationLog;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Number of nearest chunks retrieved per query segment.
const RETRIEVAL_K: usize = 2;

/// Source label recorded for degraded or failed exchanges.
const ERROR_SOURCE: &str = "Error";

/// Message shown when the document index never initialized.
pub const INDEX_UNAVAILABLE_MESSAGE: &str =
    "Database initialization failed. Please contact an administrator.";

/// Per-segment notice when embedding or retrieval fails mid-query.
pub const SEGMENT_ERROR_MESSAGE: &str = "Error processing this section.";

/// Closing acknowledgment for a satisfied user.
pub const CLOSING_ACKNOWLEDGMENT: &str =
    "Thank you for your feedback! Is there anything else I can help you with?";

/// Prompt requesting contact details on the dissatisfied path.
pub const CONTACT_PROMPT: &str = "I understand you need additional assistance. Please provide \
     your email address and phone number in the format: email: your@email.com, phone: 1234567890";

/// Acknowledgment used when no prior query exists to route on.
pub const GENERIC_REACH_MESSAGE: &str =
    "Thank you. Our support team will reach you within 12 hours.";

/// Validation errors for the query entry point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Query text was empty or whitespace-only.
    #[error("query text must not be empty")]
    EmptyQuery,
}

/// Validation errors for the satisfaction entry point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SatisfactionError {
    /// Satisfaction answer was neither YES nor NO.
    #[error("satisfaction answer must be YES or NO")]
    InvalidAnswer,
}

/// Contact details collected from a dissatisfied user.
#[derive(Debug, Clone)]
pub struct ContactInfo {
    /// Email address to reach the user at.
    pub email: String,
    /// Phone number to reach the user at.
    pub phone: String,
}

/// Result of one processed query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Generated answer, one paragraph per query segment.
    pub answer: String,
    /// Source document label grounding the first segment's answer.
    pub source: String,
    /// Whether the exchange was appended to the conversation log.
    pub logged: bool,
}

/// Result of one satisfaction exchange.
#[derive(Debug, Clone)]
pub struct SatisfactionOutcome {
    /// User-facing message for this step of the protocol.
    pub message: String,
    /// Set when the caller must collect contact details before retrying NO.
    pub needs_contact_info: bool,
    /// Department the conversation was routed to, when an escalation ran.
    pub department: Option<Department>,
}

/// Abstraction over the support core consumed by external surfaces.
#[async_trait]
pub trait SupportApi: Send + Sync {
    /// Answer a user query with retrieval-grounded generation.
    async fn process_query(
        &self,
        text: &str,
        output_language: &str,
        is_authenticated: bool,
    ) -> Result<QueryOutcome, QueryError>;

    /// Advance the YES/NO satisfaction protocol for the session.
    async fn process_satisfaction(
        &self,
        answer: &str,
        is_authenticated: bool,
        contact: Option<ContactInfo>,
    ) -> Result<SatisfactionOutcome, SatisfactionError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

#[derive(Debug, Error)]
enum RetrievalError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Coordinates retrieval, generation, logging, and escalation for one session.
pub struct SupportService {
    index: IndexHandle,
    embedder: Arc<dyn EmbeddingClient>,
    answerer: AnswerGenerator,
    classifier: DepartmentClassifier,
    dispatcher: EscalationDispatcher,
    log: Mutex<ConversationLog>,
    metrics: Arc<SupportMetrics>,
    chunk_size: usize,
}

impl SupportService {
    /// Assemble the service from its injected collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: IndexHandle,
        embedder: Arc<dyn EmbeddingClient>,
        chat: Arc<dyn ChatClient>,
        mailer: Arc<dyn EmailSender>,
        directory: Arc<dyn DepartmentDirectory>,
        metrics: Arc<SupportMetrics>,
        chunk_size: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            answerer: AnswerGenerator::new(chat.clone()),
            classifier: DepartmentClassifier::new(chat),
            dispatcher: EscalationDispatcher::new(mailer, directory),
            log: Mutex::new(ConversationLog::new()),
            metrics,
            chunk_size,
        }
    }

    /// Number of turns currently held in the session log.
    pub async fn log_len(&self) -> usize {
        self.log.lock().await.len()
    }

    async fn answer_segment(
        &self,
        index: &Arc<dyn VectorIndex>,
        segment: &str,
        output_language: &str,
    ) -> Result<(String, String), RetrievalError> {
        let mut vectors = self
            .embedder
            .generate_embeddings(vec![segment.to_string()])
            .await?;
        let vector = vectors.pop().ok_or_else(|| {
            ProviderError::InvalidResponse("provider returned no vectors".to_string())
        })?;

        let matches = index.query(vector, RETRIEVAL_K).await?;
        let source = matches
            .first()
            .map(|hit| hit.source.clone())
            .unwrap_or_else(|| "Unknown source".to_string());
        let context = matches
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let answer = self.answerer.generate(&context, segment, output_language).await;
        Ok((answer, source))
    }

    async fn escalate(
        &self,
        last_query: &str,
        contact: &ContactInfo,
        transcript: String,
    ) -> (String, Department) {
        let department = self.classifier.classify(last_query).await;
        let department_email = self.dispatcher.resolve(department);
        let request = EscalationRequest {
            department,
            department_email,
            user_email: contact.email.clone(),
            user_phone: contact.phone.clone(),
            transcript,
        };

        let delivered = self.dispatcher.dispatch(&request).await;
        self.metrics.record_escalation(delivered);

        let message = if delivered {
            format!(
                "Thank you. Your request has been forwarded to our {department}. They will \
                 contact you at {} within 12 hours.",
                contact.email
            )
        } else {
            tracing::error!(
                department = %department,
                department_email = %request.department_email,
                user_email = %contact.email,
                "Failed to send escalation email"
            );
            format!(
                "Thank you. Your request has been recorded for our {department}. However, due \
                 to a technical issue, there may be a delay in response. They will aim to \
                 contact you at {} within 12 hours.",
                contact.email
            )
        };

        (message, department)
    }
}

#[async_trait]
impl SupportApi for SupportService {
    async fn process_query(
        &self,
        text: &str,
        output_language: &str,
        is_authenticated: bool,
    ) -> Result<QueryOutcome, QueryError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let Some(index) = self.index.get() else {
            tracing::warn!("Query received while index is unavailable");
            return Ok(QueryOutcome {
                answer: INDEX_UNAVAILABLE_MESSAGE.to_string(),
                source: ERROR_SOURCE.to_string(),
                logged: false,
            });
        };

        // Long queries are split and each segment answered independently.
        let segments = chunk_text(trimmed, self.chunk_size);
        let mut answers = Vec::with_capacity(segments.len());
        let mut first_source: Option<String> = None;

        for segment in &segments {
            match self.answer_segment(index, segment, output_language).await {
                Ok((answer, source)) => {
                    if is_authenticated {
                        self.log.lock().await.append(segment, &answer, &source);
                    }
                    first_source.get_or_insert(source);
                    answers.push(answer);
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Query segment failed; degrading");
                    if is_authenticated {
                        self.log
                            .lock()
                            .await
                            .append(segment, SEGMENT_ERROR_MESSAGE, ERROR_SOURCE);
                    }
                    first_source.get_or_insert_with(|| ERROR_SOURCE.to_string());
                    answers.push(SEGMENT_ERROR_MESSAGE.to_string());
                }
            }
        }

        Ok(QueryOutcome {
            answer: answers.join("\n\n"),
            source: first_source.unwrap_or_else(|| "Unknown source".to_string()),
            logged: is_authenticated,
        })
    }

    async fn process_satisfaction(
        &self,
        answer: &str,
        is_authenticated: bool,
        contact: Option<ContactInfo>,
    ) -> Result<SatisfactionOutcome, SatisfactionError> {
        let normalized = answer.trim();

        if normalized.eq_ignore_ascii_case("yes") {
            // Contact info alongside YES is a caller mistake; ignore it.
            if is_authenticated {
                self.log
                    .lock()
                    .await
                    .append(normalized, CLOSING_ACKNOWLEDGMENT, SUPPORT_SOURCE);
            }
            return Ok(SatisfactionOutcome {
                message: CLOSING_ACKNOWLEDGMENT.to_string(),
                needs_contact_info: false,
                department: None,
            });
        }

        if !normalized.eq_ignore_ascii_case("no") {
            return Err(SatisfactionError::InvalidAnswer);
        }

        let contact = contact.filter(|info| !info.email.trim().is_empty());
        let Some(contact) = contact else {
            if is_authenticated {
                self.log
                    .lock()
                    .await
                    .append(normalized, CONTACT_PROMPT, SUPPORT_SOURCE);
            }
            return Ok(SatisfactionOutcome {
                message: CONTACT_PROMPT.to_string(),
                needs_contact_info: true,
                department: None,
            });
        };

        // Hold the session lock through dispatch so the snapshot and the
        // clear are atomic with respect to new queries.
        let mut log = self.log.lock().await;
        let Some(last_query) = log.last_user_entry() else {
            tracing::info!("Escalation requested with no prior query; skipping routing");
            return Ok(SatisfactionOutcome {
                message: GENERIC_REACH_MESSAGE.to_string(),
                needs_contact_info: false,
                department: None,
            });
        };

        let transcript = log.read_all();
        let (message, department) = self.escalate(&last_query, &contact, transcript).await;

        // Escalation ends the session; the snapshot can never be re-sent.
        log.clear();

        Ok(SatisfactionOutcome {
            message,
            needs_contact_info: false,
            department: Some(department),
        })
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
