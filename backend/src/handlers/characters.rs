use crate::AppState;
use crate::auth::Claims;
use crate::dbs::DbError;
use crate::handlers::db_status;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use shared::models::{Character, CreateCharacterRequest, CustomCharacter};
use uuid::Uuid;

/// Built-in characters followed by the caller's own.
pub async fn list_characters(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Character>>, StatusCode> {
    let mut characters = state
        .db
        .get_characters()
        .await
        .map_err(|e| db_status("list characters", e))?;
    let custom = state
        .db
        .get_custom_characters(claims.sub)
        .await
        .map_err(|e| db_status("list custom characters", e))?;
    characters.extend(custom.iter().map(CustomCharacter::to_character));
    Ok(Json(characters))
}

pub async fn create_character(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<CustomCharacter>), StatusCode> {
    if let Err(reason) = payload.validate() {
        tracing::debug!("Rejected character: {}", reason);
        return Err(StatusCode::BAD_REQUEST);
    }

    let name = payload.name.trim().to_string();
    let image_url = payload
        .image_url
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| Character::avatar_for(&name));
    let now = Utc::now();
    let character = CustomCharacter {
        id: Uuid::new_v4(),
        user_id: claims.sub,
        name,
        description: payload.description,
        image_url,
        personality: payload.personality,
        background: payload.background,
        communication_style: payload.communication_style,
        created_at: now,
        updated_at: now,
    };

    state
        .db
        .create_custom_character(&character)
        .await
        .map_err(|e| db_status("create character", e))?;
    Ok((StatusCode::CREATED, Json(character)))
}

pub async fn delete_character(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(character_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    match state.db.get_character(&character_id).await {
        Ok(_) => return Err(StatusCode::FORBIDDEN),
        Err(DbError::NotFound(_)) => {}
        Err(e) => return Err(db_status("get character", e)),
    }

    let id = Uuid::parse_str(&character_id).map_err(|_| StatusCode::NOT_FOUND)?;
    state
        .db
        .delete_custom_character(claims.sub, id)
        .await
        .map_err(|e| db_status("delete character", e))?;
    Ok(StatusCode::NO_CONTENT)
}
