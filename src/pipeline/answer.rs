//! Context-grounded answer generation.

use crate::provider::ChatClient;
use std::sync::Arc;

/// Fixed reply returned when the chat provider fails to produce an answer.
pub const NO_RESPONSE_FALLBACK: &str = "No response received.";

/// Produces answers grounded in retrieved context via the chat provider.
pub struct AnswerGenerator {
    chat: Arc<dyn ChatClient>,
}

impl AnswerGenerator {
    /// Build a generator on top of the given chat client.
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Answer `query` using only `context`, in the requested output language.
    ///
    /// Provider failures degrade to [`NO_RESPONSE_FALLBACK`] instead of an
    /// error; a bad answer beats a crashed conversation.
    pub async fn generate(&self, context: &str, query: &str, output_language: &str) -> String {
        let prompt = build_prompt(context, query, output_language);
        match self.chat.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Chat provider returned an empty answer");
                NO_RESPONSE_FALLBACK.to_string()
            }
            Err(error) => {
                tracing::warn!(error = %error, "Answer generation failed; using fallback");
                NO_RESPONSE_FALLBACK.to_string()
            }
        }
    }
}

fn build_prompt(context: &str, query: &str, output_language: &str) -> String {
    format!(
        "You are a helpful airline customer support assistant. Use the following context to \
         answer the question provided. Give the response in {output_language} language.\n\n\
         Context:\n{context}\n\n\
         Question:\n{query}\n\n\
         Answer based on the context:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubChat {
        reply: Result<&'static str, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubChat {
        fn new(reply: Result<&'static str, ()>) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for StubChat {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(ProviderError::Unavailable("connection refused".into())),
            }
        }
    }

    #[tokio::test]
    async fn passes_through_provider_reply() {
        let chat = Arc::new(StubChat::new(Ok("Your bag allowance is 23 kg.")));
        let generator = AnswerGenerator::new(chat.clone());

        let answer = generator
            .generate("Allowance is 23 kg.", "How much can I check?", "English")
            .await;

        assert_eq!(answer, "Your bag allowance is 23 kg.");
        let prompts = chat.prompts.lock().unwrap();
        assert!(prompts[0].contains("Allowance is 23 kg."));
        assert!(prompts[0].contains("How much can I check?"));
        assert!(prompts[0].contains("English language"));
    }

    #[tokio::test]
    async fn provider_failure_yields_fixed_fallback() {
        let generator = AnswerGenerator::new(Arc::new(StubChat::new(Err(()))));
        let answer = generator.generate("context", "query", "French").await;
        assert_eq!(answer, NO_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn empty_reply_yields_fixed_fallback() {
        let generator = AnswerGenerator::new(Arc::new(StubChat::new(Ok("   "))));
        let answer = generator.generate("context", "query", "English").await;
        assert_eq!(answer, NO_RESPONSE_FALLBACK);
    }
}
