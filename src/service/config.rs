//! Configuration for the Gemini-backed service client
//!
//! The credential is supplied here at assembly time; nothing in the core reads
//! the environment or any storage directly.

use crate::{ConfideError, Result};
use secrecy::SecretString;

/// Sample rate the speech synthesis contract guarantees (Hz)
pub const SYNTHESIS_SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized audio (mono)
pub const SYNTHESIS_CHANNELS: usize = 1;

/// Configuration for [`GeminiClient`](super::GeminiClient)
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key for the Generative Language API
    pub api_key: SecretString,

    /// Model used for chat turns and summaries
    pub chat_model: String,

    /// Model used for speech synthesis
    pub tts_model: String,

    /// Prebuilt voice name for synthesis
    pub voice: String,

    /// Sampling temperature for chat turns
    pub chat_temperature: f32,

    /// Nucleus sampling parameter for chat turns
    pub chat_top_p: f32,

    /// Sampling temperature for summary generation
    pub summary_temperature: f32,

    /// Base URL of the Generative Language API
    pub base_url: String,
}

impl GeminiConfig {
    /// Create a config with the given API key and default models
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            chat_model: "gemini-2.5-flash".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            chat_temperature: 0.8,
            chat_top_p: 0.9,
            summary_temperature: 0.7,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    /// Set the chat/summary model
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Set the speech synthesis model
    pub fn with_tts_model(mut self, model: impl Into<String>) -> Self {
        self.tts_model = model.into();
        self
    }

    /// Set the synthesis voice
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Point the client at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        use secrecy::ExposeSecret;

        if self.api_key.expose_secret().is_empty() {
            return Err(ConfideError::ConfigError("API key is required".to_string()));
        }
        if self.chat_model.is_empty() {
            return Err(ConfideError::ConfigError("chat model is required".to_string()));
        }
        if self.tts_model.is_empty() {
            return Err(ConfideError::ConfigError("TTS model is required".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[redacted]")
            .field("chat_model", &self.chat_model)
            .field("tts_model", &self.tts_model)
            .field("voice", &self.voice)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models() {
        let config = GeminiConfig::new("key".into());
        assert_eq!(config.chat_model, "gemini-2.5-flash");
        assert_eq!(config.voice, "Kore");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_key_rejected() {
        let config = GeminiConfig::new("".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = GeminiConfig::new("key".into())
            .with_chat_model("gemini-x")
            .with_voice("Puck");
        assert_eq!(config.chat_model, "gemini-x");
        assert_eq!(config.voice, "Puck");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeminiConfig::new("super-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
