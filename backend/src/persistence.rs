use crate::dbs::{Database, DbResult};
use shared::models::{ChatMessage, Character, Conversation, StoredMessage};
use uuid::Uuid;

/// Records the newest exchange of a chat session for `(user, character)`.
///
/// The most recently created conversation for the pair is reused, or a new one
/// is opened. Only the last two messages are written. Store errors are logged
/// and swallowed; the return value is the conversation id when the save went
/// through.
pub async fn save_exchange(
    db: &dyn Database,
    user_id: Uuid,
    character: &Character,
    messages: &[ChatMessage],
) -> Option<Uuid> {
    if messages.len() < 2 {
        return None;
    }

    match try_save_exchange(db, user_id, character, messages).await {
        Ok(conversation_id) => Some(conversation_id),
        Err(e) => {
            tracing::error!(
                user_id = %user_id,
                character = %character.id,
                "Error saving conversation: {:?}",
                e
            );
            None
        }
    }
}

async fn try_save_exchange(
    db: &dyn Database,
    user_id: Uuid,
    character: &Character,
    messages: &[ChatMessage],
) -> DbResult<Uuid> {
    let conversation_id = match db.latest_conversation(user_id, &character.id).await? {
        Some(existing) => existing.id,
        None => {
            let conversation = Conversation::new(user_id, character.id.clone(), &character.name);
            db.create_conversation(&conversation).await?;
            tracing::info!(
                conversation_id = %conversation.id,
                "Started conversation with {}",
                character.name
            );
            conversation.id
        }
    };

    for message in &messages[messages.len() - 2..] {
        db.append_message(&StoredMessage::from_chat(conversation_id, message))
            .await?;
    }

    Ok(conversation_id)
}
