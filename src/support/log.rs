//! Append-only per-session conversation log.

use crate::support::SUPPORT_SOURCE;
use time::OffsetDateTime;

/// One query/response exchange recorded in a session.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    /// Text the user submitted.
    pub user_text: String,
    /// Reply the assistant produced.
    pub bot_text: String,
    /// Label of the source grounding the reply, or the support-system marker.
    pub source_label: String,
    /// RFC3339 timestamp recorded when the turn was appended.
    pub timestamp: String,
}

/// Ordered record of a session's exchanges, cleared at session boundaries.
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one exchange to the log.
    pub fn append(&mut self, user_text: &str, bot_text: &str, source_label: &str) {
        self.turns.push(ConversationTurn {
            user_text: user_text.to_string(),
            bot_text: bot_text.to_string(),
            source_label: source_label.to_string(),
            timestamp: now_rfc3339(),
        });
    }

    /// Render the full transcript for escalation emails.
    ///
    /// Source labels are shown for retrieval-grounded turns only; the support
    /// system's own prompts carry no source.
    pub fn read_all(&self) -> String {
        let mut transcript = String::new();
        for turn in &self.turns {
            transcript.push_str(&format!("USER: {}\n", turn.user_text));
            transcript.push_str(&format!("BOT: {}", turn.bot_text));
            if !turn.source_label.is_empty() && turn.source_label != SUPPORT_SOURCE {
                transcript.push_str(&format!(" (Source: {})", turn.source_label));
            }
            transcript.push_str("\n\n");
        }
        transcript
    }

    /// Empty the log; a no-op when already empty.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Most recent user text from a retrieval-grounded turn, scanning backward.
    ///
    /// Support-system turns (satisfaction answers, contact prompts) are
    /// skipped so escalation classifies the user's actual question rather
    /// than a bare "NO".
    pub fn last_user_entry(&self) -> Option<String> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.source_label != SUPPORT_SOURCE)
            .map(|turn| turn.user_text.clone())
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log holds no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
