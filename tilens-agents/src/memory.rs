//! Conversation buffer memory
//!
//! Append-only history of human/AI exchanges. The rendered buffer is fed back
//! to the model as "previous conversation history" on every turn.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One completed exchange
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub human: String,
    pub ai: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConversationMemory {
    human_prefix: String,
    ai_prefix: String,
    turns: Vec<Turn>,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new("Human", "AI")
    }
}

impl ConversationMemory {
    pub fn new(human_prefix: &str, ai_prefix: &str) -> Self {
        Self {
            human_prefix: human_prefix.to_string(),
            ai_prefix: ai_prefix.to_string(),
            turns: Vec::new(),
        }
    }

    pub fn append(&mut self, human: &str, ai: &str) {
        self.turns.push(Turn {
            human: human.to_string(),
            ai: ai.to_string(),
            at: Utc::now(),
        });
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// History rendered as `Human: ...` / `AI: ...` lines
    pub fn buffer(&self) -> String {
        self.turns
            .iter()
            .map(|t| {
                format!(
                    "{}: {}\n{}: {}",
                    self.human_prefix, t.human, self.ai_prefix, t.ai
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
