use crate::dbs::{Credentials, Database, DbError, DbResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    Character, CharacterCategory, CommunicationStyle, Conversation, ConversationSummary,
    CustomCharacter, StoredMessage, SubscriptionTier, User, UserProfile, UserSettings,
};
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        avatar_url TEXT,
        subscription_status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_profiles (
        id BLOB PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        bio TEXT,
        language TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_settings (
        id BLOB PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        email_notifications INTEGER NOT NULL,
        marketing_notifications INTEGER NOT NULL,
        chat_notifications INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id BLOB PRIMARY KEY,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires_at TEXT NOT NULL,
        revoked INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS password_resets (
        token TEXT PRIMARY KEY,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS characters (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        image_url TEXT NOT NULL,
        category TEXT NOT NULL,
        system_prompt TEXT,
        is_premium INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS custom_characters (
        id BLOB PRIMARY KEY,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        image_url TEXT NOT NULL,
        personality TEXT NOT NULL,
        background TEXT NOT NULL,
        communication_style TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    // character_id points at either a built-in or a custom character, so no FK.
    "CREATE TABLE IF NOT EXISTS conversations (
        id BLOB PRIMARY KEY,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        character_id TEXT NOT NULL,
        title TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id BLOB PRIMARY KEY,
        conversation_id BLOB NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        is_user INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS conversations_owner ON conversations(user_id, character_id)",
    "CREATE INDEX IF NOT EXISTS messages_conversation ON messages(conversation_id)",
];

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    avatar_url: Option<String>,
    subscription_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar_url: row.avatar_url,
            subscription_status: SubscriptionTier::parse(&row.subscription_status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CharacterRow {
    id: String,
    name: String,
    description: String,
    image_url: String,
    category: String,
    system_prompt: Option<String>,
    is_premium: bool,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Character {
            id: row.id,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            category: CharacterCategory::parse(&row.category),
            system_prompt: row.system_prompt,
            is_premium: row.is_premium,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CustomCharacterRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: String,
    image_url: String,
    personality: String,
    background: String,
    communication_style: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomCharacterRow> for CustomCharacter {
    type Error = DbError;

    fn try_from(row: CustomCharacterRow) -> Result<Self, Self::Error> {
        let communication_style =
            CommunicationStyle::parse(&row.communication_style).ok_or_else(|| {
                DbError::Internal(format!(
                    "Unknown communication style {:?}",
                    row.communication_style
                ))
            })?;
        Ok(CustomCharacter {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            personality: row.personality,
            background: row.background,
            communication_style,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    character_id: String,
    character_name: Option<String>,
    title: String,
    created_at: DateTime<Utc>,
    last_message: Option<String>,
    message_count: i64,
}

const USER_COLUMNS: &str =
    "id, name, email, avatar_url, subscription_status, created_at, updated_at";
const CHARACTER_COLUMNS: &str =
    "id, name, description, image_url, category, system_prompt, is_premium";
const CUSTOM_CHARACTER_COLUMNS: &str = "id, user_id, name, description, image_url, personality, background, communication_style, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteDatabase {
    pool: Pool<Sqlite>,
}

impl SqliteDatabase {
    /// Opens (creating if needed) the database at `database_url` and brings the schema up.
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is its own database, so pin it to one.
        let mut pool_options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    pub async fn in_memory() -> DbResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn init(&self) -> DbResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn create_user(&self, user: &User, password_hash: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&user.email)
            .fetch_optional(&mut *tx)
            .await?;
        if taken.is_some() {
            return Err(DbError::Conflict(format!(
                "Email {} already registered",
                user.email
            )));
        }

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, avatar_url, subscription_status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(password_hash)
        .bind(&user.avatar_url)
        .bind(user.subscription_status.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_profiles (id, bio, language, created_at, updated_at) VALUES ($1, NULL, 'kk', $2, $2)",
        )
        .bind(user.id)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_settings (id, email_notifications, marketing_notifications, chat_notifications, created_at, updated_at) VALUES ($1, 1, 0, 1, $2, $2)",
        )
        .bind(user.id)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> DbResult<User> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::from)
            .ok_or_else(|| DbError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_credentials(&self, email: &str) -> DbResult<Option<Credentials>> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(user_id, password_hash)| Credentials {
            user_id,
            password_hash,
        }))
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        name: Option<String>,
        avatar_url: Option<String>,
    ) -> DbResult<User> {
        let result = sqlx::query(
            "UPDATE users SET name = COALESCE($1, name), avatar_url = COALESCE($2, avatar_url), updated_at = $3 WHERE id = $4",
        )
        .bind(name)
        .bind(avatar_url)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User {} not found", user_id)));
        }
        self.get_user(user_id).await
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(password_hash)
                .bind(Utc::now())
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> DbResult<UserProfile> {
        let row: Option<(Uuid, Option<String>, String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                "SELECT id, bio, language, created_at, updated_at FROM user_profiles WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some((id, bio, language, created_at, updated_at)) => Ok(UserProfile {
                id,
                bio,
                language,
                created_at,
                updated_at,
            }),
            None => Err(DbError::NotFound(format!(
                "Profile for user {} not found",
                user_id
            ))),
        }
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        bio: Option<String>,
        language: Option<String>,
    ) -> DbResult<UserProfile> {
        sqlx::query(
            "UPDATE user_profiles SET bio = COALESCE($1, bio), language = COALESCE($2, language), updated_at = $3 WHERE id = $4",
        )
        .bind(bio)
        .bind(language)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        self.get_profile(user_id).await
    }

    async fn get_settings(&self, user_id: Uuid) -> DbResult<UserSettings> {
        let row: Option<(Uuid, bool, bool, bool, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, email_notifications, marketing_notifications, chat_notifications, created_at, updated_at FROM user_settings WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some((id, email, marketing, chat, created_at, updated_at)) => Ok(UserSettings {
                id,
                email_notifications: email,
                marketing_notifications: marketing,
                chat_notifications: chat,
                created_at,
                updated_at,
            }),
            None => Err(DbError::NotFound(format!(
                "Settings for user {} not found",
                user_id
            ))),
        }
    }

    async fn update_settings(&self, settings: &UserSettings) -> DbResult<()> {
        sqlx::query(
            "UPDATE user_settings SET email_notifications = $1, marketing_notifications = $2, chat_notifications = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(settings.email_notifications)
        .bind(settings.marketing_notifications)
        .bind(settings.chat_notifications)
        .bind(settings.updated_at)
        .bind(settings.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_session(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at, revoked) VALUES ($1, $2, $3, 0)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_active(&self, session_id: Uuid) -> DbResult<bool> {
        let row: Option<(DateTime<Utc>, bool)> =
            sqlx::query_as("SELECT expires_at, revoked FROM sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(matches!(row, Some((expires_at, false)) if expires_at > Utc::now()))
    }

    async fn revoke_session(&self, session_id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE sessions SET revoked = 1 WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_password_reset(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("INSERT INTO password_resets (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn consume_password_reset(&self, token: &str) -> DbResult<Option<Uuid>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT user_id, expires_at FROM password_resets WHERE token = $1")
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?;
        sqlx::query("DELETE FROM password_resets WHERE token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(row.and_then(|(user_id, expires_at)| (expires_at > Utc::now()).then_some(user_id)))
    }

    async fn seed_characters(&self, characters: &[Character]) -> DbResult<()> {
        for character in characters {
            sqlx::query(
                "INSERT OR IGNORE INTO characters (id, name, description, image_url, category, system_prompt, is_premium) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&character.id)
            .bind(&character.name)
            .bind(&character.description)
            .bind(&character.image_url)
            .bind(character.category.as_str())
            .bind(&character.system_prompt)
            .bind(character.is_premium)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn get_characters(&self) -> DbResult<Vec<Character>> {
        let rows: Vec<CharacterRow> = sqlx::query_as(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Character::from).collect())
    }

    async fn get_character(&self, character_id: &str) -> DbResult<Character> {
        let row: Option<CharacterRow> = sqlx::query_as(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1"
        ))
        .bind(character_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Character::from).ok_or_else(|| {
            DbError::NotFound(format!("Character {} not found", character_id))
        })
    }

    async fn get_custom_characters(&self, user_id: Uuid) -> DbResult<Vec<CustomCharacter>> {
        let rows: Vec<CustomCharacterRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOM_CHARACTER_COLUMNS} FROM custom_characters WHERE user_id = $1 ORDER BY created_at, rowid"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CustomCharacter::try_from).collect()
    }

    async fn get_custom_character(
        &self,
        user_id: Uuid,
        character_id: Uuid,
    ) -> DbResult<CustomCharacter> {
        let row: Option<CustomCharacterRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOM_CHARACTER_COLUMNS} FROM custom_characters WHERE id = $1 AND user_id = $2"
        ))
        .bind(character_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => CustomCharacter::try_from(row),
            None => Err(DbError::NotFound(format!(
                "Character {} not found",
                character_id
            ))),
        }
    }

    async fn create_custom_character(&self, character: &CustomCharacter) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO custom_characters (id, user_id, name, description, image_url, personality, background, communication_style, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(character.id)
        .bind(character.user_id)
        .bind(&character.name)
        .bind(&character.description)
        .bind(&character.image_url)
        .bind(&character.personality)
        .bind(&character.background)
        .bind(character.communication_style.as_str())
        .bind(character.created_at)
        .bind(character.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_custom_character(&self, user_id: Uuid, character_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM custom_characters WHERE id = $1 AND user_id = $2")
            .bind(character_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "Character {} not found",
                character_id
            )));
        }
        Ok(())
    }

    async fn latest_conversation(
        &self,
        user_id: Uuid,
        character_id: &str,
    ) -> DbResult<Option<Conversation>> {
        let row: Option<(Uuid, Uuid, String, String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                "SELECT id, user_id, character_id, title, created_at, updated_at FROM conversations WHERE user_id = $1 AND character_id = $2 ORDER BY created_at DESC, rowid DESC LIMIT 1",
            )
            .bind(user_id)
            .bind(character_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(
            |(id, user_id, character_id, title, created_at, updated_at)| Conversation {
                id,
                user_id,
                character_id,
                title,
                created_at,
                updated_at,
            },
        ))
    }

    async fn create_conversation(&self, conversation: &Conversation) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO conversations (id, user_id, character_id, title, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(conversation.id)
        .bind(conversation.user_id)
        .bind(&conversation.character_id)
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> DbResult<Conversation> {
        let row: Option<(Uuid, Uuid, String, String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                "SELECT id, user_id, character_id, title, created_at, updated_at FROM conversations WHERE id = $1 AND user_id = $2",
            )
            .bind(conversation_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some((id, user_id, character_id, title, created_at, updated_at)) => Ok(Conversation {
                id,
                user_id,
                character_id,
                title,
                created_at,
                updated_at,
            }),
            None => Err(DbError::NotFound(format!(
                "Conversation {} not found",
                conversation_id
            ))),
        }
    }

    async fn get_conversations(&self, user_id: Uuid) -> DbResult<Vec<ConversationSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            "SELECT c.id, c.character_id, ch.name AS character_name, c.title, c.created_at,
                (SELECT m.content FROM messages m WHERE m.conversation_id = c.id
                    ORDER BY m.created_at DESC, m.rowid DESC LIMIT 1) AS last_message,
                (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count
             FROM conversations c
             LEFT JOIN characters ch ON ch.id = c.character_id
             WHERE c.user_id = $1
             ORDER BY c.created_at DESC, c.rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        // Custom character ids are stored as blobs, so their names are resolved here.
        let custom_names: HashMap<String, String> = if rows.iter().any(|r| r.character_name.is_none())
        {
            self.get_custom_characters(user_id)
                .await?
                .into_iter()
                .map(|c| (c.id.to_string(), c.name))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(rows
            .into_iter()
            .map(|row| {
                let character_name = row
                    .character_name
                    .or_else(|| custom_names.get(&row.character_id).cloned());
                ConversationSummary {
                    id: row.id,
                    character_id: row.character_id,
                    character_name,
                    title: row.title,
                    created_at: row.created_at,
                    last_message: row.last_message,
                    message_count: row.message_count,
                }
            })
            .collect())
    }

    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let owned: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM conversations WHERE id = $1 AND user_id = $2")
                .bind(conversation_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(DbError::NotFound(format!(
                "Conversation {} not found",
                conversation_id
            )));
        }
        sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_messages(&self, conversation_id: Uuid) -> DbResult<Vec<StoredMessage>> {
        let rows: Vec<(Uuid, Uuid, String, bool, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, conversation_id, content, is_user, created_at FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(
                |(id, conversation_id, content, is_user, created_at)| StoredMessage {
                    id,
                    conversation_id,
                    content,
                    is_user,
                    created_at,
                },
            )
            .collect())
    }

    async fn append_message(&self, message: &StoredMessage) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, content, is_user, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(&message.content)
        .bind(message.is_user)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(message.created_at)
            .bind(message.conversation_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
