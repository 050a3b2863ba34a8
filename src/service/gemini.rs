//! Gemini-backed implementation of the service contract
//!
//! Talks to the Generative Language `generateContent` endpoint over HTTP.
//! Chat turns request structured JSON output (reply text plus approach label);
//! speech synthesis requests the AUDIO modality and returns the inline base64
//! payload untouched for the audio codec to decode.

use super::config::GeminiConfig;
use super::prompts::{CHAT_SYSTEM_INSTRUCTION, SUMMARY_SYSTEM_INSTRUCTION};
use super::{ChatRole, ChatTurnResponse, HistoryEntry, ResponseServiceClient};
use crate::{ConfideError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Structured chat reply the model is instructed to emit
#[derive(Deserialize)]
struct StructuredReply {
    response: String,
    approach: String,
}

/// Client for the Generative Language API
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client from a validated configuration
    pub fn new(config: GeminiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.config.base_url, model)
    }

    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| ConfideError::ServiceUnavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ConfideError::ServiceUnavailable(format!(
                "generateContent error {status}: {body}"
            )));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| ConfideError::ServiceUnavailable(format!("malformed response: {e}")))
    }

    fn history_contents(history: &[HistoryEntry]) -> Vec<Content> {
        history
            .iter()
            .map(|entry| Content {
                role: Some(
                    match entry.role {
                        ChatRole::User => "user",
                        ChatRole::Model => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: Some(entry.text.clone()),
                    inline_data: None,
                }],
            })
            .collect()
    }

    /// First text part of the first candidate, if any
    fn first_text(response: &GenerateResponse) -> Option<&str> {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.text.as_deref()))
    }

    fn chat_response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "response": {
                    "type": "STRING",
                    "description": "The psychologist's response to the user.",
                },
                "approach": {
                    "type": "STRING",
                    "enum": ["CBT", "Gestalt", "Logotherapy", "Systemic", "Integrative", "Unknown"],
                    "description": "The psychological approach used in the response.",
                },
            },
            "required": ["response", "approach"],
        })
    }
}

#[async_trait]
impl ResponseServiceClient for GeminiClient {
    async fn request_chat_turn(
        &self,
        history: &[HistoryEntry],
        new_text: &str,
    ) -> Result<ChatTurnResponse> {
        let mut contents = Self::history_contents(history);
        contents.push(Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(new_text.to_string()),
                inline_data: None,
            }],
        });

        let request = GenerateRequest {
            contents,
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: Some(CHAT_SYSTEM_INSTRUCTION.to_string()),
                    inline_data: None,
                }],
            }),
            generation_config: Some(json!({
                "temperature": self.config.chat_temperature,
                "topP": self.config.chat_top_p,
                "responseMimeType": "application/json",
                "responseSchema": Self::chat_response_schema(),
            })),
        };

        let response = self.generate(&self.config.chat_model, &request).await?;
        let text = Self::first_text(&response)
            .ok_or_else(|| ConfideError::ServiceUnavailable("empty chat response".to_string()))?;

        let reply: StructuredReply = serde_json::from_str(text.trim()).map_err(|e| {
            ConfideError::ServiceUnavailable(format!("unparseable chat reply: {e}"))
        })?;

        debug!(approach = %reply.approach, "Chat turn received");

        Ok(ChatTurnResponse {
            text: reply.response,
            approach: reply.approach,
        })
    }

    async fn request_speech_synthesis(&self, text: &str) -> Result<Option<String>> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: Some(text.to_string()),
                    inline_data: None,
                }],
            }],
            system_instruction: None,
            generation_config: Some(json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice },
                    },
                },
            })),
        };

        let response = self.generate(&self.config.tts_model, &request).await?;

        let payload = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| {
                content
                    .parts
                    .into_iter()
                    .find_map(|p| p.inline_data.map(|d| d.data))
            });

        if payload.is_none() {
            warn!("Synthesis returned no audio payload");
        }

        Ok(payload)
    }

    async fn request_summary(&self, history: &[HistoryEntry]) -> Result<String> {
        let request = GenerateRequest {
            contents: Self::history_contents(history),
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: Some(SUMMARY_SYSTEM_INSTRUCTION.to_string()),
                    inline_data: None,
                }],
            }),
            generation_config: Some(json!({
                "temperature": self.config.summary_temperature,
            })),
        };

        let response = self.generate(&self.config.chat_model, &request).await?;
        Self::first_text(&response)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ConfideError::ServiceUnavailable("empty summary response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_contents_roles() {
        let history = vec![
            HistoryEntry {
                role: ChatRole::Model,
                text: "hi".into(),
            },
            HistoryEntry {
                role: ChatRole::User,
                text: "hello".into(),
            },
        ];
        let contents = GeminiClient::history_contents(&history);
        assert_eq!(contents[0].role.as_deref(), Some("model"));
        assert_eq!(contents[1].role.as_deref(), Some("user"));
        assert_eq!(contents[1].parts[0].text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_first_text_skips_non_text_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inlineData": { "mimeType": "audio/pcm", "data": "AAAA" } },
                        { "text": "hello" },
                    ],
                },
            }],
        }))
        .unwrap();
        assert_eq!(GeminiClient::first_text(&response), Some("hello"));
    }

    #[test]
    fn test_empty_candidates_yield_no_text() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(GeminiClient::first_text(&response), None);
    }

    #[test]
    fn test_structured_reply_parses() {
        let reply: StructuredReply =
            serde_json::from_str(r#"{"response":"Понимаю вас.","approach":"CBT"}"#).unwrap();
        assert_eq!(reply.response, "Понимаю вас.");
        assert_eq!(reply.approach, "CBT");
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = GeminiConfig::new("".into());
        assert!(GeminiClient::new(config).is_err());
    }
}
