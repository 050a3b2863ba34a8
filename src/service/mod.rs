//! Remote generation service contract
//!
//! The session and playback controllers depend only on the three-operation
//! [`ResponseServiceClient`] interface; the Gemini-backed implementation lives
//! in [`gemini`]. Test doubles implement the same trait.

pub mod config;
pub mod gemini;
pub mod prompts;

pub use config::GeminiConfig;
pub use gemini::GeminiClient;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of one history entry as the service expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One projected history entry sent outward with chat and summary requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub text: String,
}

/// Chat-turn reply as received from the service.
///
/// `approach` is the raw label; callers validate it against the closed
/// classification set before it reaches display state.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurnResponse {
    pub text: String,
    pub approach: String,
}

/// The three request/response contracts the core consumes.
///
/// All operations are single-attempt; any failure is recoverable by the caller.
#[async_trait]
pub trait ResponseServiceClient: Send + Sync {
    /// One chat turn: prior history plus the current user text, answered with
    /// reply text and an approach classification.
    async fn request_chat_turn(
        &self,
        history: &[HistoryEntry],
        new_text: &str,
    ) -> Result<ChatTurnResponse>;

    /// Synthesize speech for `text`. `Ok(None)` means no audio is available,
    /// which is not an error.
    async fn request_speech_synthesis(&self, text: &str) -> Result<Option<String>>;

    /// End-of-session recommendations for the whole dialogue. Free-form text.
    async fn request_summary(&self, history: &[HistoryEntry]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_serializes_lowercase() {
        let entry = HistoryEntry {
            role: ChatRole::Model,
            text: "hi".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "model");

        let user = serde_json::to_value(ChatRole::User).unwrap();
        assert_eq!(user, "user");
    }
}
