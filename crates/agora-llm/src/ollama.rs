//! Local debaters through Ollama's chat endpoint
//!
//! The persona goes in as the system message and the composed turn as the
//! user message. The model is kept loaded between turns so a debate does not
//! pay a cold start on every speaker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::{GenerationError, LlmProvider, LlmRequest, LlmResponse};

const BACKEND: &str = "ollama";

/// How long Ollama keeps the model resident after a turn
const KEEP_ALIVE: &str = "10m";

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    keep_alive: &'static str,
    options: Sampling,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Sampling {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    model: String,
    message: Option<ReplyMessage>,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug)]
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(model: &str) -> Self {
        Self::with_url("http://localhost:11434", model)
    }

    pub fn with_url(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn body<'a>(&'a self, request: &'a LlmRequest) -> ChatBody<'a> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatBody {
            model: &self.model,
            messages,
            stream: false,
            keep_alive: KEEP_ALIVE,
            options: Sampling {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }

    /// A 404 from the chat endpoint means the model was never pulled
    fn status_error(&self, status: u16, body: &str) -> GenerationError {
        if status == 404 {
            return GenerationError::Rejected {
                backend: BACKEND,
                status,
                body: format!("model '{}' is not pulled on this host", self.model),
            };
        }
        GenerationError::from_status(BACKEND, status, body)
    }

    fn read_reply(&self, reply: ChatReply) -> Result<LlmResponse, GenerationError> {
        let content = reply
            .message
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(GenerationError::InvalidResponse(
                "ollama returned no message".to_string(),
            ));
        }
        if reply.done_reason.as_deref() == Some("length") {
            tracing::debug!(model = %reply.model, "Turn cut at the token budget");
        }
        Ok(LlmResponse {
            content,
            model: reply.model,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, GenerationError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| GenerationError::unreachable(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status.as_u16(), &body));
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        self.read_reply(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OllamaProvider::with_url("http://box:11434/", "llama3");
        assert_eq!(provider.base_url, "http://box:11434");
    }

    #[test]
    fn test_persona_becomes_system_message() {
        let provider = OllamaProvider::new("llama3");
        let request = LlmRequest::new("You are Skeptic, a contrarian.", "Rebut the last point")
            .temperature(0.4)
            .max_tokens(120);

        let json = serde_json::to_value(provider.body(&request)).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are Skeptic, a contrarian.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["options"]["num_predict"], 120);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(json["stream"], false);
        assert_eq!(json["keep_alive"], KEEP_ALIVE);
    }

    #[test]
    fn test_bare_prompt_has_no_system_message() {
        let provider = OllamaProvider::new("llama3");
        let request = LlmRequest::new("", "Say hello");
        let json = serde_json::to_value(provider.body(&request)).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_missing_model_is_named() {
        let provider = OllamaProvider::new("mistral");
        match provider.status_error(404, "{\"error\":\"not found\"}") {
            GenerationError::Rejected { status, body, .. } => {
                assert_eq!(status, 404);
                assert!(body.contains("'mistral'"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            provider.status_error(429, ""),
            GenerationError::RateLimited("ollama")
        ));
    }

    #[test]
    fn test_reply_parsing() {
        let provider = OllamaProvider::new("llama3");
        let reply: ChatReply = serde_json::from_str(
            r#"{"model":"llama3","message":{"role":"assistant","content":"  Fair point. "},"done":true,"done_reason":"stop"}"#,
        )
        .unwrap();
        let response = provider.read_reply(reply).unwrap();
        assert_eq!(response.content, "Fair point.");
        assert_eq!(response.model, "llama3");

        let empty: ChatReply =
            serde_json::from_str(r#"{"model":"llama3","done":true}"#).unwrap();
        assert!(matches!(
            provider.read_reply(empty),
            Err(GenerationError::InvalidResponse(_))
        ));
    }
}
