//! Google Gemini provider (generativelanguage v1beta)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::{GenerationError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Gemini provider
#[derive(Debug)]
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    /// gemini-1.5-flash
    pub fn flash(api_key: &str) -> Self {
        Self::new(api_key, "gemini-1.5-flash")
    }

    /// gemini-1.5-pro
    pub fn pro(api_key: &str) -> Self {
        Self::new(api_key, "gemini-1.5-pro")
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, GenerationError> {
        let persona = (!request.system.trim().is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: request.system,
            }],
        });
        let body = GeminiRequest {
            system_instruction: persona,
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::unreachable("gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status("gemini", status.as_u16(), &text));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let content = api_response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(GenerationError::InvalidResponse(
                "empty candidate list".to_string(),
            ));
        }

        Ok(LlmResponse {
            content: content.trim().to_string(),
            model: self.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = GeminiRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: "persona".to_string(),
                }],
            }),
            contents: vec![],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 64,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "persona");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
        assert!(json["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " there"}]}}],
            "usageMetadata": {"totalTokenCount": 12}
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::flash("key");
        assert!(provider
            .endpoint()
            .ends_with("/v1beta/models/gemini-1.5-flash:generateContent"));
    }
}
