use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
}

/// Message category: ordinary dialogue turn or the end-of-session recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Chat,
    Summary,
}

/// Closed set of psychological-approach labels a bot reply may carry.
///
/// Used only for display grouping, never for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Approach {
    Cbt,
    Gestalt,
    Logotherapy,
    Systemic,
    Integrative,
    Unknown,
}

impl Approach {
    /// Parse the label the service returns. `None` for anything outside the closed set.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "CBT" => Some(Approach::Cbt),
            "Gestalt" => Some(Approach::Gestalt),
            "Logotherapy" => Some(Approach::Logotherapy),
            "Systemic" => Some(Approach::Systemic),
            "Integrative" => Some(Approach::Integrative),
            "Unknown" => Some(Approach::Unknown),
            _ => None,
        }
    }

    /// Wire label as the service emits it
    pub fn label(&self) -> &'static str {
        match self {
            Approach::Cbt => "CBT",
            Approach::Gestalt => "Gestalt",
            Approach::Logotherapy => "Logotherapy",
            Approach::Systemic => "Systemic",
            Approach::Integrative => "Integrative",
            Approach::Unknown => "Unknown",
        }
    }

    /// Localized display name for the approach badge
    pub fn display_name(&self) -> &'static str {
        match self {
            Approach::Cbt => "КПТ",
            Approach::Gestalt => "Гештальт",
            Approach::Logotherapy => "Логотерапия",
            Approach::Systemic => "Системный",
            Approach::Integrative => "Интегративный",
            Approach::Unknown => "Общий",
        }
    }
}

/// One conversational turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub approach: Option<Approach>,
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(text: impl Into<String>, sender: Sender, approach: Option<Approach>, kind: MessageKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            approach,
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User, None, MessageKind::Chat)
    }

    pub fn bot(text: impl Into<String>, approach: Option<Approach>) -> Self {
        Self::new(text, Sender::Bot, approach, MessageKind::Chat)
    }

    pub fn summary(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot, None, MessageKind::Summary)
    }

    /// The greeting every fresh session starts with
    pub fn seed_greeting() -> Self {
        Self::bot(
            "Здравствуйте! Я ваш электронный психолог. Расскажите, что вас беспокоит?",
            Some(Approach::Integrative),
        )
    }
}
