use super::character::Character;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";
pub const ROLE_SYSTEM: &str = "system";

/// Speaker label for the user's own lines in a shared transcript.
const SELF_LABEL: &str = "Мен";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    /// Completion API role for this author.
    pub fn role(&self) -> &'static str {
        match self {
            Self::User => ROLE_USER,
            Self::Ai => ROLE_ASSISTANT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub character_image: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            character_name: None,
            character_image: None,
        }
    }

    pub fn assistant(content: impl Into<String>, character: &Character) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::Ai,
            timestamp: Utc::now(),
            character_name: Some(character.name.clone()),
            character_image: Some(character.image_url.clone()),
        }
    }

    /// Opening line shown when a character is picked.
    pub fn greeting(character: &Character) -> Self {
        Self::assistant(
            format!(
                "Сәлеметсіз бе! Мен {}. Сізбен сөйлесуге қуаныштымын.",
                character.name
            ),
            character,
        )
    }

    pub fn from_stored(message: &StoredMessage, character: Option<&Character>) -> Self {
        let (character_name, character_image) = match (message.is_user, character) {
            (false, Some(c)) => (Some(c.name.clone()), Some(c.image_url.clone())),
            _ => (None, None),
        };
        Self {
            id: message.id,
            content: message.content.clone(),
            sender: if message.is_user {
                Sender::User
            } else {
                Sender::Ai
            },
            timestamp: message.created_at,
            character_name,
            character_image,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// A persisted message row. Never updated after insert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub content: String,
    pub is_user: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn from_chat(conversation_id: Uuid, message: &ChatMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            content: message.content.clone(),
            is_user: message.is_user(),
            created_at: Utc::now(),
        }
    }
}

/// Plain-text rendition of a chat, one paragraph per message.
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let speaker = match m.sender {
                Sender::User => SELF_LABEL,
                Sender::Ai => m.character_name.as_deref().unwrap_or_default(),
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
