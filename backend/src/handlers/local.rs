use crate::AppState;
use crate::auth::Claims;
use crate::dbs::{LocalStore, LocalStoreError};
use crate::handlers::resolve_character;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use shared::models::{SaveConversationRequest, SavedConversation};
use std::sync::Arc;
use uuid::Uuid;

/// Local store key holding one user's transcripts saved from the chat screen.
pub fn conversations_key(user_id: Uuid) -> String {
    format!("conversations:{}", user_id)
}

/// Runs a local store write on the blocking pool.
async fn write_local<R: Send + 'static>(
    local: Arc<LocalStore>,
    write: impl FnOnce(&LocalStore) -> Result<R, LocalStoreError> + Send + 'static,
) -> Result<R, StatusCode> {
    match tokio::task::spawn_blocking(move || write(&local)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!("Failed to write local store: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            tracing::error!("Local store task failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn list_saved_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<Vec<SavedConversation>> {
    Json(state.local.get(&conversations_key(claims.sub)).unwrap_or_default())
}

pub async fn save_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SaveConversationRequest>,
) -> Result<(StatusCode, Json<SavedConversation>), StatusCode> {
    if payload.messages.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let character = resolve_character(&state, claims.sub, &payload.character_id).await?;

    let saved = SavedConversation {
        id: Uuid::new_v4(),
        character_name: character.name,
        character_image: character.image_url,
        messages: payload.messages,
        timestamp: Utc::now(),
    };

    let key = conversations_key(claims.sub);
    let entry = saved.clone();
    write_local(state.local.clone(), move |local| {
        local.update(&key, |all: &mut Vec<SavedConversation>| all.push(entry))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn delete_saved_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let key = conversations_key(claims.sub);
    let removed = write_local(state.local.clone(), move |local| {
        local.update(&key, |all: &mut Vec<SavedConversation>| {
            let before = all.len();
            all.retain(|c| c.id != id);
            before != all.len()
        })
    })
    .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub async fn clear_saved_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, StatusCode> {
    let key = conversations_key(claims.sub);
    write_local(state.local.clone(), move |local| local.remove(&key)).await?;
    Ok(StatusCode::NO_CONTENT)
}
