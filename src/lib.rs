pub mod audio;
pub mod messages;
pub mod service;
pub mod session;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConfideError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Transport decode error: {0}")]
    DecodeError(String),

    #[error("Audio format error: {0}")]
    FormatError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ConfideError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Remote calls are single-attempt, but the user may retry the action
            ConfideError::ServiceUnavailable(_) => true,
            // Malformed audio aborts one playback attempt, nothing else
            ConfideError::DecodeError(_) => true,
            ConfideError::FormatError(_) => true,
            // Hardware/device errors may require user intervention
            ConfideError::AudioDeviceError(_) => false,
            ConfideError::ConfigError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ConfideError::ServiceUnavailable(_) => {
                "Извините, произошла ошибка. Пожалуйста, попробуйте еще раз.".to_string()
            }
            ConfideError::DecodeError(_) | ConfideError::FormatError(_) => {
                "Не удалось воспроизвести аудио для этого сообщения.".to_string()
            }
            ConfideError::AudioDeviceError(_) => {
                "Ошибка аудиоустройства. Проверьте настройки звука.".to_string()
            }
            ConfideError::ConfigError(_) => {
                "Ошибка конфигурации: Ключ API не найден. Убедитесь, что переменная окружения API_KEY установлена правильно.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfideError>;
