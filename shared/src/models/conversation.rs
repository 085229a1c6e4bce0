use super::message::{ChatMessage, StoredMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub character_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(user_id: Uuid, character_id: impl Into<String>, character_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            character_id: character_id.into(),
            title: format!("Conversation with {}", character_name),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One row of the history page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub character_id: String,
    pub character_name: Option<String>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<String>,
    pub message_count: i64,
}

impl ConversationSummary {
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [
            Some(self.title.as_str()),
            self.character_name.as_deref(),
            self.last_message.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<ChatMessage>,
}

/// A transcript kept in the local store, independent of any backend record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedConversation {
    pub id: Uuid,
    pub character_name: String,
    pub character_image: String,
    pub messages: Vec<ChatMessage>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaveConversationRequest {
    pub character_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SendMessageRequest {
    pub character_id: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SendMessageResponse {
    pub message: ChatMessage,
    pub reply: ChatMessage,
    pub conversation_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TranscriptRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpeechRequest {
    pub text: String,
}

/// Stored rows converted for display, AI lines attributed to `character_name`.
pub fn to_chat_messages(
    messages: &[StoredMessage],
    character: Option<&super::character::Character>,
) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| ChatMessage::from_stored(m, character))
        .collect()
}
