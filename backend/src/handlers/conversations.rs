use crate::AppState;
use crate::auth::Claims;
use crate::handlers::{db_status, resolve_character};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{ConversationDetail, ConversationSummary, to_chat_messages};
use uuid::Uuid;

#[derive(Deserialize, Debug, Default)]
pub struct HistoryQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// The caller's conversations, newest first, optionally filtered by `q`.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ConversationSummary>>, StatusCode> {
    let mut summaries = state
        .db
        .get_conversations(claims.sub)
        .await
        .map_err(|e| db_status("list conversations", e))?;

    state.with_catalog(claims.sub, |catalog| {
        for summary in summaries.iter_mut().filter(|s| s.character_name.is_none()) {
            summary.character_name = catalog.get(&summary.character_id).map(|c| c.name.clone());
        }
    });

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        summaries.retain(|s| s.matches(q));
    }
    Ok(Json(summaries))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ConversationDetail>, StatusCode> {
    let conversation = state
        .db
        .get_conversation(claims.sub, conversation_id)
        .await
        .map_err(|e| db_status("get conversation", e))?;
    let stored = state
        .db
        .get_messages(conversation.id)
        .await
        .map_err(|e| db_status("get messages", e))?;

    // A character removed since the chat still leaves a readable history.
    let character = resolve_character(&state, claims.sub, &conversation.character_id)
        .await
        .ok();
    let messages = to_chat_messages(&stored, character.as_ref());

    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    state
        .db
        .delete_conversation(claims.sub, conversation_id)
        .await
        .map_err(|e| db_status("delete conversation", e))?;
    Ok(StatusCode::NO_CONTENT)
}
