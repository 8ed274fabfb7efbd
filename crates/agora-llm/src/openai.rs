//! Debaters through OpenAI-compatible chat completions
//!
//! Reasoning models (o1, o3) take neither a system message nor a custom
//! temperature, so the persona is folded into the user message for them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::{GenerationError, LlmProvider, LlmRequest, LlmResponse};

const BACKEND: &str = "openai";

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Turn {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug)]
pub struct OpenAIProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: "https://api.openai.com".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at an OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn is_reasoning_model(&self) -> bool {
        self.model.starts_with("o1") || self.model.starts_with("o3")
    }

    fn body(&self, request: &LlmRequest) -> CompletionBody<'_> {
        let reasoning = self.is_reasoning_model();
        let messages = if reasoning || request.system.trim().is_empty() {
            vec![Turn {
                role: "user",
                content: request.inline(),
            }]
        } else {
            vec![
                Turn {
                    role: "system",
                    content: request.system.clone(),
                },
                Turn {
                    role: "user",
                    content: request.prompt.clone(),
                },
            ]
        };

        CompletionBody {
            model: &self.model,
            messages,
            temperature: (!reasoning).then_some(request.temperature),
            max_completion_tokens: request.max_tokens,
        }
    }

    fn read_reply(reply: CompletionReply) -> Result<LlmResponse, GenerationError> {
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse("no choices returned".to_string()))?;
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(GenerationError::InvalidResponse(
                "turn withheld by the content filter".to_string(),
            ));
        }
        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(GenerationError::InvalidResponse("empty choice".to_string()));
        }
        Ok(LlmResponse {
            content: content.trim().to_string(),
            model: reply.model,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, GenerationError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| GenerationError::unreachable(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(BACKEND, status.as_u16(), &body));
        }

        let reply: CompletionReply = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        Self::read_reply(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn_request() -> LlmRequest {
        LlmRequest::new("You are Muse, a poet.", "Open the debate").temperature(0.9)
    }

    #[test]
    fn test_chat_model_gets_system_message() {
        let provider = OpenAIProvider::new("k", "gpt-4o-mini");
        let json = serde_json::to_value(provider.body(&turn_request())).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Open the debate");
        assert!(json.get("temperature").is_some());
    }

    #[test]
    fn test_reasoning_model_folds_persona() {
        let provider = OpenAIProvider::new("k", "o1-mini");
        assert!(provider.is_reasoning_model());

        let json = serde_json::to_value(provider.body(&turn_request())).unwrap();
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["content"], "You are Muse, a poet.\n\nOpen the debate");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_reply_reading() {
        let reply: CompletionReply = serde_json::from_str(
            r#"{"model":"gpt-4o-mini","choices":[{"message":{"content":" Agreed. "},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(OpenAIProvider::read_reply(reply).unwrap().content, "Agreed.");

        let filtered: CompletionReply = serde_json::from_str(
            r#"{"model":"gpt-4o-mini","choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            OpenAIProvider::read_reply(filtered),
            Err(GenerationError::InvalidResponse(_))
        ));
    }
}
