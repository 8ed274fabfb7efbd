//! Turns and the append-only conversation state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::sentiment::{polarity, Emotion};

/// Errors from exporting or importing a conversation
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Who produced a turn.
///
/// Serialized as a plain string: `"System"`, `"User"` or the debater's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Speaker {
    /// Engine-generated notices (session start, topic changes)
    System,
    /// Direct user guidance
    User,
    /// A debater, by name
    Debater(String),
}

impl Speaker {
    /// Shorthand for a debater speaker
    pub fn debater(name: impl Into<String>) -> Self {
        Speaker::Debater(name.into())
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            Speaker::System => "System",
            Speaker::User => "User",
            Speaker::Debater(name) => name,
        }
    }

    /// Whether this speaker is a debater
    pub fn is_debater(&self) -> bool {
        matches!(self, Speaker::Debater(_))
    }
}

impl From<String> for Speaker {
    fn from(value: String) -> Self {
        match value.as_str() {
            "System" => Speaker::System,
            "User" => Speaker::User,
            _ => Speaker::Debater(value),
        }
    }
}

impl From<Speaker> for String {
    fn from(value: Speaker) -> Self {
        match value {
            Speaker::Debater(name) => name,
            other => other.name().to_string(),
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded entry of the debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique ID
    pub id: Uuid,
    /// Who spoke
    pub speaker: Speaker,
    /// What was said
    pub message: String,
    /// Detected emotion label
    pub emotion: Emotion,
    /// Sentiment polarity in [-1, 1]
    pub sentiment: f64,
    /// Phase the turn belongs to
    pub phase: String,
    /// Zero-based position in the conversation
    pub position: usize,
    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

/// Export record: only speaker and message survive a round trip
#[derive(Debug, Serialize, Deserialize)]
struct ExportedTurn {
    speaker: Speaker,
    message: String,
}

/// Append-only ordered sequence of turns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, labelling its sentiment. Returns the recorded turn.
    pub fn append(&mut self, speaker: Speaker, message: impl Into<String>, phase: &str) -> &Turn {
        let message = message.into();
        let sentiment = polarity(&message);
        let turn = Turn {
            id: Uuid::new_v4(),
            speaker,
            emotion: Emotion::from_polarity(sentiment),
            sentiment,
            message,
            phase: phase.to_string(),
            position: self.turns.len(),
            timestamp: Utc::now(),
        };
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// All turns in order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent `k` turns, oldest first
    pub fn window(&self, k: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(k);
        &self.turns[start..]
    }

    /// Render the most recent `k` turns as `speaker: message` lines
    pub fn context(&self, k: usize) -> String {
        self.window(k)
            .iter()
            .map(|t| format!("{}: {}", t.speaker, t.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Turns tagged with `phase`
    pub fn in_phase<'a>(&'a self, phase: &'a str) -> impl Iterator<Item = &'a Turn> + 'a {
        self.turns.iter().filter(move |t| t.phase == phase)
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether nothing has been said yet
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Last turn, if any
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Drop every turn (only used when a new session starts)
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Export as a JSON array of `{speaker, message}` in conversation order
    pub fn to_json(&self) -> Result<String, ConversationError> {
        let exported: Vec<ExportedTurn> = self
            .turns
            .iter()
            .map(|t| ExportedTurn {
                speaker: t.speaker.clone(),
                message: t.message.clone(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&exported)?)
    }

    /// Rebuild a conversation from [`ConversationState::to_json`] output.
    ///
    /// Phase tags are not part of the export; imported turns carry `"Imported"`.
    pub fn from_json(json: &str) -> Result<Self, ConversationError> {
        let exported: Vec<ExportedTurn> = serde_json::from_str(json)?;
        let mut state = Self::new();
        for entry in exported {
            state.append(entry.speaker, entry.message, "Imported");
        }
        Ok(state)
    }
}
