use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    Character, Conversation, ConversationSummary, CustomCharacter, StoredMessage, User,
    UserProfile, UserSettings,
};
use thiserror::Error;
use uuid::Uuid;

pub mod local;
pub mod sqlite;

pub use local::{LocalStore, LocalStoreError};
pub use sqlite::SqliteDatabase;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Login material for one account.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
}

/// Structured store for everything that belongs to a user account.
///
/// User-scoped operations take the owning user id and never touch rows that
/// belong to someone else.
#[async_trait]
pub trait Database: Send + Sync {
    // Accounts
    async fn create_user(&self, user: &User, password_hash: &str) -> DbResult<()>;
    async fn get_user(&self, user_id: Uuid) -> DbResult<User>;
    async fn get_credentials(&self, email: &str) -> DbResult<Option<Credentials>>;
    async fn update_user(
        &self,
        user_id: Uuid,
        name: Option<String>,
        avatar_url: Option<String>,
    ) -> DbResult<User>;
    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> DbResult<()>;
    async fn get_profile(&self, user_id: Uuid) -> DbResult<UserProfile>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        bio: Option<String>,
        language: Option<String>,
    ) -> DbResult<UserProfile>;
    async fn get_settings(&self, user_id: Uuid) -> DbResult<UserSettings>;
    async fn update_settings(&self, settings: &UserSettings) -> DbResult<()>;

    // Sessions and password resets
    async fn create_session(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()>;
    async fn session_active(&self, session_id: Uuid) -> DbResult<bool>;
    async fn revoke_session(&self, session_id: Uuid) -> DbResult<()>;
    async fn create_password_reset(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()>;
    /// Deletes the token and returns its owner if it had not expired.
    async fn consume_password_reset(&self, token: &str) -> DbResult<Option<Uuid>>;

    // Characters
    async fn seed_characters(&self, characters: &[Character]) -> DbResult<()>;
    async fn get_characters(&self) -> DbResult<Vec<Character>>;
    async fn get_character(&self, character_id: &str) -> DbResult<Character>;
    async fn get_custom_characters(&self, user_id: Uuid) -> DbResult<Vec<CustomCharacter>>;
    async fn get_custom_character(
        &self,
        user_id: Uuid,
        character_id: Uuid,
    ) -> DbResult<CustomCharacter>;
    async fn create_custom_character(&self, character: &CustomCharacter) -> DbResult<()>;
    async fn delete_custom_character(&self, user_id: Uuid, character_id: Uuid) -> DbResult<()>;

    // Conversations
    async fn latest_conversation(
        &self,
        user_id: Uuid,
        character_id: &str,
    ) -> DbResult<Option<Conversation>>;
    async fn create_conversation(&self, conversation: &Conversation) -> DbResult<()>;
    async fn get_conversation(&self, user_id: Uuid, conversation_id: Uuid)
    -> DbResult<Conversation>;
    async fn get_conversations(&self, user_id: Uuid) -> DbResult<Vec<ConversationSummary>>;
    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> DbResult<()>;
    async fn get_messages(&self, conversation_id: Uuid) -> DbResult<Vec<StoredMessage>>;
    async fn append_message(&self, message: &StoredMessage) -> DbResult<()>;
}
