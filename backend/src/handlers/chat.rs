use crate::AppState;
use crate::auth::Claims;
use crate::handlers::resolve_character;
use crate::persistence::save_exchange;
use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use shared::models::{
    ChatMessage, SendMessageRequest, SendMessageResponse, SpeechRequest, TranscriptRequest,
    transcript,
};

/// Generates the character's reply to `content`, then records the exchange.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, StatusCode> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let character = resolve_character(&state, claims.sub, &payload.character_id).await?;

    let message = ChatMessage::user(content);
    let mut messages = payload.history;
    messages.push(message.clone());

    let reply_text = state.generator.generate_reply(&messages, &character).await;
    let reply = ChatMessage::assistant(reply_text, &character);
    messages.push(reply.clone());

    let conversation_id = save_exchange(state.db.as_ref(), claims.sub, &character, &messages).await;

    Ok(Json(SendMessageResponse {
        message,
        reply,
        conversation_id,
    }))
}

pub async fn share_transcript(Json(payload): Json<TranscriptRequest>) -> String {
    transcript(&payload.messages)
}

fn audio_content_type(format: &str) -> &'static str {
    match format {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "opus" => "audio/ogg",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

pub async fn speak(State(state): State<AppState>, Json(payload): Json<SpeechRequest>) -> Response {
    if payload.text.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state.generator.synthesize_speech(&payload.text).await {
        Ok(audio) => {
            let content_type = audio_content_type(&state.generator.settings().audio_format);
            ([(header::CONTENT_TYPE, content_type)], audio).into_response()
        }
        Err(e) => {
            tracing::error!("Error generating speech: {}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
