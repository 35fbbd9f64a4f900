//! Conversation state, department routing, and the satisfaction protocol.

pub mod classify;
pub mod department;
pub mod escalation;
pub mod log;
mod service;

pub use classify::DepartmentClassifier;
pub use department::{Department, DepartmentDirectory, StaticDepartmentDirectory};
pub use escalation::{EmailSender, EscalationDispatcher, EscalationRequest, NullEmailSender, RelayEmailSender};
pub use log::{ConversationLog, ConversationTurn};
pub use service::{
    CLOSING_ACKNOWLEDGMENT, CONTACT_PROMPT, ContactInfo, GENERIC_REACH_MESSAGE,
    INDEX_UNAVAILABLE_MESSAGE, QueryError, QueryOutcome, SEGMENT_ERROR_MESSAGE, SatisfactionError,
    SatisfactionOutcome, SupportApi, SupportService,
};

/// Source label marking turns produced by the support system itself.
pub const SUPPORT_SOURCE: &str = "Support System";
