use crate::AppState;
use crate::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::models::{
    AddCatalogCharacterRequest, CatalogView, Character, ChatMessage, SelectCharacterRequest,
};

pub async fn list_catalog(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<CatalogView> {
    Json(state.with_catalog(claims.sub, |catalog| catalog.view()))
}

pub async fn add_to_catalog(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddCatalogCharacterRequest>,
) -> Result<(StatusCode, Json<Character>), StatusCode> {
    if payload.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let character = state.with_catalog(claims.sub, |catalog| catalog.add(payload).clone());
    state.persist_catalog(claims.sub).await;
    tracing::info!(id = %character.id, "Added {} to the catalog", character.name);
    Ok((StatusCode::CREATED, Json(character)))
}

pub async fn remove_from_catalog(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> StatusCode {
    let status = state.with_catalog(claims.sub, |catalog| {
        if catalog.is_builtin(&id) {
            StatusCode::FORBIDDEN
        } else if catalog.remove(&id) {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    });
    if status == StatusCode::NO_CONTENT {
        state.persist_catalog(claims.sub).await;
    }
    status
}

/// Switches the active character and returns the greeting that opens a fresh chat with it.
pub async fn select_character(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SelectCharacterRequest>,
) -> Result<Json<ChatMessage>, StatusCode> {
    state
        .with_catalog(claims.sub, |catalog| {
            catalog.select(&payload.id).map(ChatMessage::greeting)
        })
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
