//! The seam between a debate turn and a text-generation backend
//!
//! One [`LlmRequest`] carries one debater turn: the persona, the composed
//! prompt and the sampling budget the composer picked for that debater.
//! Backends map it onto their wire format and report every failure as a
//! [`GenerationError`], which the scheduler turns into a placeholder turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling temperature when the caller does not pick one
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

/// Generation budget when the caller does not pick one
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Longest slice of an error body kept in a [`GenerationError::Rejected`]
const BODY_EXCERPT: usize = 200;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{backend} unreachable: {detail}")]
    Unreachable {
        backend: &'static str,
        detail: String,
    },
    #[error("{backend} rejected the turn ({status}): {body}")]
    Rejected {
        backend: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0} is rate limiting")]
    RateLimited(&'static str),
    #[error("unusable completion: {0}")]
    InvalidResponse(String),
    #[error("no completion within {0} ms")]
    Timeout(u64),
    #[error("{0} is cooling down after repeated failures")]
    CircuitOpen(String),
}

impl GenerationError {
    /// Classify a non-success HTTP answer. 429 is rate limiting, anything
    /// else keeps a short excerpt of the body.
    pub fn from_status(backend: &'static str, status: u16, body: &str) -> Self {
        if status == 429 {
            return Self::RateLimited(backend);
        }
        Self::Rejected {
            backend,
            status,
            body: body.trim().chars().take(BODY_EXCERPT).collect(),
        }
    }

    pub fn unreachable(backend: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Unreachable {
            backend,
            detail: error.to_string(),
        }
    }

    /// Whether this failure says anything about the backend's health.
    /// Malformed payloads and fast-failed calls do not.
    pub fn counts_against_backend(&self) -> bool {
        !matches!(self, Self::InvalidResponse(_) | Self::CircuitOpen(_))
    }
}

/// One debater turn as seen by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Persona text; sent as the system message where the backend has one
    pub system: String,
    /// Composed turn prompt
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn new(persona: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: persona.into(),
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Clamped to the 0.0..=2.0 range every supported backend accepts
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Persona and prompt folded into one message, for backends that take
    /// no system text
    pub fn inline(&self) -> String {
        if self.system.trim().is_empty() {
            self.prompt.clone()
        } else {
            format!("{}\n\n{}", self.system, self.prompt)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text, trimmed
    pub content: String,
    /// Model that answered
    pub model: String,
}

#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, GenerationError>;

    /// Prompt without a persona, returning only the text
    async fn ask(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self.complete(LlmRequest::new("", prompt)).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            GenerationError::from_status("openai", 429, "slow down"),
            GenerationError::RateLimited("openai")
        ));

        let long_body = "x".repeat(1000);
        match GenerationError::from_status("gemini", 500, &long_body) {
            GenerationError::Rejected { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), BODY_EXCERPT);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_health_accounting() {
        assert!(GenerationError::Timeout(10).counts_against_backend());
        assert!(GenerationError::unreachable("ollama", "refused").counts_against_backend());
        assert!(!GenerationError::InvalidResponse("empty".into()).counts_against_backend());
        assert!(!GenerationError::CircuitOpen("ollama".into()).counts_against_backend());
    }

    #[test]
    fn test_request_knobs() {
        let request = LlmRequest::new("You are Muse, a poet.", "Open the debate")
            .temperature(3.5)
            .max_tokens(0);
        assert_eq!(request.temperature, 2.0);
        assert_eq!(request.max_tokens, 1);
        assert_eq!(request.inline(), "You are Muse, a poet.\n\nOpen the debate");
        assert_eq!(LlmRequest::new(" ", "bare").inline(), "bare");
    }
}
