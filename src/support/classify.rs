//! Model-backed department classification with deterministic fallback.

use crate::provider::ChatClient;
use crate::support::department::Department;
use std::sync::Arc;

/// Maps a free-text query to the department that should own it.
pub struct DepartmentClassifier {
    chat: Arc<dyn ChatClient>,
}

impl DepartmentClassifier {
    /// Build a classifier on top of the given chat client.
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Classify a query, never failing.
    ///
    /// The model is asked to name exactly one department; when the reply
    /// contains no canonical name, or the provider errors, routing falls back
    /// to keyword matching and finally to Customer Experience.
    pub async fn classify(&self, query: &str) -> Department {
        let reply = match self.chat.generate(&classification_prompt(query)).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(error = %error, "Classification provider failed; using keywords");
                String::new()
            }
        };

        if let Some(department) = Department::match_reply(&reply) {
            tracing::debug!(department = %department, "Classified by model reply");
            return department;
        }

        if let Some(department) = Department::match_keywords(query) {
            tracing::debug!(department = %department, "Classified by keyword fallback");
            return department;
        }

        tracing::debug!("No routing signal found; defaulting to Customer Experience");
        Department::CustomerExperience
    }
}

fn classification_prompt(query: &str) -> String {
    format!(
        "Please determine which department should handle this customer query. Choose exactly \
         one department from the list below:\n\n\
         Baggage Services Department:\n\
         - Questions regarding carry-on and checked baggage limits\n\
         - Lost, delayed, or damaged baggage inquiries\n\
         - Prohibited item clarification and excess baggage charges\n\n\
         Customer Experience Department:\n\
         - Booking changes, cancellations, and refund processing\n\
         - Assistance with check-in procedures and upgrades\n\
         - Loyalty program inquiries and point redemptions\n\n\
         Flight Operations Department:\n\
         - Flight cancellations, delays, and rebooking requests\n\
         - Emergency guidelines and onboard safety instructions\n\
         - Compensation for disrupted flights\n\n\
         Special Services Department:\n\
         - Wheelchair requests and assistance for passengers with disabilities\n\
         - Medical equipment handling and medical condition accommodations\n\
         - Pet travel arrangements and service animal guidelines\n\n\
         Security and Compliance Department:\n\
         - Passenger data protection and privacy concerns\n\
         - Identity verification and security checks\n\
         - Emergency contact support and crisis management\n\n\
         Customer query: {query}\n\n\
         Respond ONLY with the full name of the ONE most appropriate department. Do not include \
         any explanation or additional text, just the department name."
    )
}
