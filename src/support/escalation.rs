//! Escalation email construction and dispatch.
//!
//! The core only needs an abstract "send an email" capability; the production
//! implementation posts to an HTTP mail relay, and deployments without a
//! relay fall back to a sender that reports every dispatch as failed so the
//! degraded acknowledgment path still works.

use crate::support::department::{Department, DepartmentDirectory};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

/// Sends a single escalation email; failures are reported, never thrown.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver one message, returning whether the transport accepted it.
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool;
}

/// Email sender posting JSON messages to an HTTP mail relay.
pub struct RelayEmailSender {
    http: Client,
    endpoint: String,
    from: String,
}

impl RelayEmailSender {
    /// Build a sender for the given relay endpoint and from-address.
    pub fn new(endpoint: String, from: String) -> Self {
        let http = Client::builder()
            .user_agent("aerodesk/mail")
            .build()
            .expect("Failed to construct reqwest::Client for mail relay");
        Self {
            http,
            endpoint,
            from,
        }
    }
}

#[async_trait]
impl EmailSender for RelayEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "body": body,
        });

        match self.http.post(&self.endpoint).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(to, subject, "Escalation email accepted by relay");
                true
            }
            Ok(response) => {
                tracing::warn!(
                    to,
                    status = %response.status(),
                    "Mail relay rejected escalation email"
                );
                false
            }
            Err(error) => {
                tracing::warn!(to, error = %error, "Failed to reach mail relay");
                false
            }
        }
    }
}

/// Stand-in sender used when no mail relay is configured.
pub struct NullEmailSender;

#[async_trait]
impl EmailSender for NullEmailSender {
    async fn send(&self, to: &str, _subject: &str, _body: &str) -> bool {
        tracing::warn!(to, "No mail relay configured; escalation email dropped");
        false
    }
}

/// One escalation, built on a NO-satisfaction response and consumed once.
#[derive(Debug, Clone)]
pub struct EscalationRequest {
    /// Department the conversation was classified to.
    pub department: Department,
    /// Resolved contact address for that department.
    pub department_email: String,
    /// Email address the user supplied.
    pub user_email: String,
    /// Phone number the user supplied.
    pub user_phone: String,
    /// Snapshot of the session transcript at escalation time.
    pub transcript: String,
}

/// Routes escalation requests to department contacts via the email sender.
pub struct EscalationDispatcher {
    mailer: Arc<dyn EmailSender>,
    directory: Arc<dyn DepartmentDirectory>,
}

impl EscalationDispatcher {
    /// Build a dispatcher over the given sender and directory.
    pub fn new(mailer: Arc<dyn EmailSender>, directory: Arc<dyn DepartmentDirectory>) -> Self {
        Self { mailer, directory }
    }

    /// Resolve the contact address for a department.
    pub fn resolve(&self, department: Department) -> String {
        self.directory.lookup(department.name())
    }

    /// Send one escalation email; best effort, reports the transport outcome.
    pub async fn dispatch(&self, request: &EscalationRequest) -> bool {
        let subject = format!("Support escalation: {}", request.department);
        let body = build_escalation_body(request);
        self.mailer
            .send(&request.department_email, &subject, &body)
            .await
    }
}

fn build_escalation_body(request: &EscalationRequest) -> String {
    format!(
        "New support request received:\n\n\
         User Contact Information:\n\
         Email: {}\n\
         Phone: {}\n\n\
         Chat History:\n{}",
        request.user_email, request.user_phone, request.transcript
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::department::StaticDepartmentDirectory;
    use httpmock::{Method::POST, MockServer};
    use std::sync::Mutex;

    pub(crate) struct RecordingSender {
        pub(crate) accept: bool,
        pub(crate) sent: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingSender {
        pub(crate) fn new(accept: bool) -> Self {
            Self {
                accept,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, to: &str, subject: &str, body: &str) -> bool {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            self.accept
        }
    }

    fn sample_request() -> EscalationRequest {
        EscalationRequest {
            department: Department::BaggageServices,
            department_email: "baggage.services@airline.com".into(),
            user_email: "traveler@example.com".into(),
            user_phone: "1234567890".into(),
            transcript: "USER: My bag was lost\nBOT: I am sorry to hear that.\n\n".into(),
        }
    }

    #[tokio::test]
    async fn dispatch_addresses_department_and_includes_transcript() {
        let mailer = Arc::new(RecordingSender::new(true));
        let dispatcher = EscalationDispatcher::new(
            mailer.clone(),
            Arc::new(StaticDepartmentDirectory::with_defaults(None)),
        );

        let delivered = dispatcher.dispatch(&sample_request()).await;
        assert!(delivered);

        let sent = mailer.sent.lock().unwrap();
        let (to, subject, body) = &sent[0];
        assert_eq!(to, "baggage.services@airline.com");
        assert!(subject.contains("Baggage Services Department"));
        assert!(body.contains("traveler@example.com"));
        assert!(body.contains("1234567890"));
        assert!(body.contains("My bag was lost"));
    }

    #[tokio::test]
    async fn relay_sender_reports_acceptance() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/send").body_contains("traveler@example.com");
                then.status(202);
            })
            .await;

        let sender = RelayEmailSender::new(
            format!("{}/send", server.base_url()),
            "support@airline.com".into(),
        );
        let delivered = sender
            .send("baggage.services@airline.com", "subject", "traveler@example.com")
            .await;

        mock.assert();
        assert!(delivered);
    }

    #[tokio::test]
    async fn relay_sender_maps_errors_to_false() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/send");
                then.status(500).body("relay down");
            })
            .await;

        let sender = RelayEmailSender::new(
            format!("{}/send", server.base_url()),
            "support@airline.com".into(),
        );
        assert!(!sender.send("to@example.com", "subject", "body").await);
    }

    #[tokio::test]
    async fn null_sender_always_fails() {
        assert!(!NullEmailSender.send("to@example.com", "s", "b").await);
    }
}
