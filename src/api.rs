//! HTTP surface for Aerodesk.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /query` – Answer a customer query through the retrieval pipeline.
//!   Accepts optional `output_language` and `authenticated` fields and returns
//!   the grounded answer with its source document label.
//! - `POST /satisfaction` – Advance the YES/NO satisfaction protocol,
//!   optionally carrying the user's contact information for escalation.
//! - `GET /metrics` – Observe ingestion and escalation counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery.
//!
//! The router is glue only; validation and orchestration live in the support
//! service shared through the router state.

use crate::support::{ContactInfo, QueryError, SatisfactionError, SupportApi};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the support API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SupportApi + 'static,
{
    Router::new()
        .route("/query", post(process_query::<S>))
        .route("/satisfaction", post(process_satisfaction::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

fn default_output_language() -> String {
    "English".to_string()
}

/// Request body for the `POST /query` endpoint.
#[derive(Deserialize)]
struct QueryRequest {
    /// Free-text customer query.
    text: String,
    /// Language the answer should be written in (defaults to English).
    #[serde(default = "default_output_language")]
    output_language: String,
    /// Whether the session is authenticated; controls conversation logging.
    #[serde(default)]
    authenticated: bool,
}

/// Success response for the `POST /query` endpoint.
#[derive(Serialize)]
struct QueryResponse {
    /// Generated answer text.
    answer: String,
    /// Source document label grounding the answer.
    source: String,
    /// Whether the exchange was appended to the conversation log.
    logged: bool,
}

/// Answer a customer query through the retrieval pipeline.
async fn process_query<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError>
where
    S: SupportApi,
{
    let outcome = service
        .process_query(&request.text, &request.output_language, request.authenticated)
        .await?;
    tracing::info!(
        source = %outcome.source,
        logged = outcome.logged,
        "Query request completed"
    );
    Ok(Json(QueryResponse {
        answer: outcome.answer,
        source: outcome.source,
        logged: outcome.logged,
    }))
}

/// Contact details accepted alongside a satisfaction response.
#[derive(Deserialize)]
struct ContactInfoBody {
    email: String,
    #[serde(default)]
    phone: String,
}

/// Request body for the `POST /satisfaction` endpoint.
#[derive(Deserialize)]
struct SatisfactionRequest {
    /// The user's YES/NO reply to the satisfaction question.
    answer: String,
    /// Whether the session is authenticated; controls conversation logging.
    #[serde(default)]
    authenticated: bool,
    /// Contact details collected after a NO response.
    #[serde(default)]
    contact_info: Option<ContactInfoBody>,
}

/// Success response for the `POST /satisfaction` endpoint.
#[derive(Serialize)]
struct SatisfactionResponse {
    /// User-facing message for this protocol step.
    message: String,
    /// Set when the caller must collect contact details next.
    needs_contact_info: bool,
    /// Department name when an escalation was routed.
    #[serde(skip_serializing_if = "Option::is_none")]
    department: Option<String>,
}

/// Advance the satisfaction protocol for the session.
async fn process_satisfaction<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SatisfactionRequest>,
) -> Result<Json<SatisfactionResponse>, AppError>
where
    S: SupportApi,
{
    let contact = request.contact_info.map(|info| ContactInfo {
        email: info.email,
        phone: info.phone,
    });
    let outcome = service
        .process_satisfaction(&request.answer, request.authenticated, contact)
        .await?;
    tracing::info!(
        needs_contact_info = outcome.needs_contact_info,
        department = ?outcome.department.map(|d| d.name()),
        "Satisfaction request completed"
    );
    Ok(Json(SatisfactionResponse {
        message: outcome.message,
        needs_contact_info: outcome.needs_contact_info,
        department: outcome.department.map(|d| d.name().to_string()),
    }))
}

/// Return a metrics snapshot with ingestion and escalation counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SupportApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/query",
                description: "Answer a customer query using retrieval-grounded generation. Response returns { \"answer\": string, \"source\": string, \"logged\": bool }.",
                request_example: Some(json!({
                    "text": "What is the checked baggage allowance?",
                    "output_language": "English",
                    "authenticated": true
                })),
            },
            CommandDescriptor {
                name: "satisfaction",
                method: "POST",
                path: "/satisfaction",
                description: "Advance the YES/NO satisfaction protocol; a NO with contact info escalates the conversation to a department.",
                request_example: Some(json!({
                    "answer": "NO",
                    "authenticated": true,
                    "contact_info": {
                        "email": "traveler@example.com",
                        "phone": "1234567890"
                    }
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return ingestion and escalation counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Query(QueryError),
    Satisfaction(SatisfactionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Both error enums are pure input validation.
        let message = match self {
            Self::Query(error) => error.to_string(),
            Self::Satisfaction(error) => error.to_string(),
        };
        (StatusCode::BAD_REQUEST, message).into_response()
    }
}

impl From<QueryError> for AppError {
    fn from(inner: QueryError) -> Self {
        Self::Query(inner)
    }
}

impl From<SatisfactionError> for AppError {
    fn from(inner: SatisfactionError) -> Self {
        Self::Satisfaction(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::metrics::MetricsSnapshot;
    use crate::support::{
        ContactInfo, QueryError, QueryOutcome, SatisfactionError, SatisfactionOutcome, SupportApi,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_query_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let query = commands
            .iter()
            .find(|cmd| cmd.name == "query")
            .expect("query command present");

        assert_eq!(query.method, "POST");
        assert_eq!(query.path, "/query");
        assert!(query.description.to_lowercase().contains("retrieval"));
        assert!(commands.len() >= 3);
    }

    #[tokio::test]
    async fn query_route_passes_language_and_auth_flags() {
        let service = Arc::new(StubSupportService::default());
        let app = create_router(service.clone());

        let payload = json!({
            "text": "Where is my bag?",
            "output_language": "German",
            "authenticated": true
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["answer"], "stub answer");
        assert_eq!(json["source"], "stub.txt");
        assert_eq!(json["logged"], true);

        let calls = service.queries.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("Where is my bag?".to_string(), "German".to_string(), true));
    }

    #[tokio::test]
    async fn query_route_defaults_language_to_english() {
        let service = Arc::new(StubSupportService::default());
        let app = create_router(service.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "text": "hello" }).to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let calls = service.queries.lock().await;
        assert_eq!(calls[0].1, "English");
        assert!(!calls[0].2);
    }

    #[tokio::test]
    async fn invalid_satisfaction_answer_maps_to_bad_request() {
        let service = Arc::new(StubSupportService::default());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/satisfaction")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "answer": "MAYBE" }).to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn satisfaction_route_forwards_contact_info() {
        let service = Arc::new(StubSupportService::default());
        let app = create_router(service.clone());

        let payload = json!({
            "answer": "NO",
            "authenticated": true,
            "contact_info": { "email": "traveler@example.com", "phone": "1234567890" }
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/satisfaction")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let calls = service.satisfactions.lock().await;
        assert_eq!(calls.len(), 1);
        let (answer, authenticated, contact_email) = &calls[0];
        assert_eq!(answer, "NO");
        assert!(*authenticated);
        assert_eq!(contact_email.as_deref(), Some("traveler@example.com"));
    }

    #[derive(Default)]
    struct StubSupportService {
        queries: Mutex<Vec<(String, String, bool)>>,
        satisfactions: Mutex<Vec<(String, bool, Option<String>)>>,
    }

    #[async_trait]
    impl SupportApi for StubSupportService {
        async fn process_query(
            &self,
            text: &str,
            output_language: &str,
            is_authenticated: bool,
        ) -> Result<QueryOutcome, QueryError> {
            self.queries.lock().await.push((
                text.to_string(),
                output_language.to_string(),
                is_authenticated,
            ));
            Ok(QueryOutcome {
                answer: "stub answer".into(),
                source: "stub.txt".into(),
                logged: is_authenticated,
            })
        }

        async fn process_satisfaction(
            &self,
            answer: &str,
            is_authenticated: bool,
            contact: Option<ContactInfo>,
        ) -> Result<SatisfactionOutcome, SatisfactionError> {
            if !answer.eq_ignore_ascii_case("yes") && !answer.eq_ignore_ascii_case("no") {
                return Err(SatisfactionError::InvalidAnswer);
            }
            self.satisfactions.lock().await.push((
                answer.to_string(),
                is_authenticated,
                contact.map(|info| info.email),
            ));
            Ok(SatisfactionOutcome {
                message: "ok".into(),
                needs_contact_info: false,
                department: None,
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_indexed: 0,
                chunks_indexed: 0,
                escalations_dispatched: 0,
                escalation_failures: 0,
            }
        }
    }
}
