pub mod account;
pub mod auth;
pub mod catalog;
pub mod characters;
pub mod chat;
pub mod conversations;
pub mod local;

pub use account::*;
pub use auth::*;
pub use catalog::*;
pub use characters::*;
pub use chat::*;
pub use conversations::*;
pub use local::*;

use crate::AppState;
use crate::dbs::DbError;
use axum::http::StatusCode;
use shared::models::Character;
use uuid::Uuid;

/// Maps a store error to a response status, logging anything that is not the caller's fault.
pub(crate) fn db_status(action: &str, e: DbError) -> StatusCode {
    match e {
        DbError::NotFound(_) => StatusCode::NOT_FOUND,
        DbError::Conflict(_) => StatusCode::CONFLICT,
        e => {
            tracing::error!("Failed to {}: {:?}", action, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Looks a character up in the catalog, then the built-ins, then the user's own characters.
pub(crate) async fn resolve_character(
    state: &AppState,
    user_id: Uuid,
    character_id: &str,
) -> Result<Character, StatusCode> {
    let from_catalog = state.with_catalog(user_id, |catalog| catalog.get(character_id).cloned());
    if let Some(character) = from_catalog {
        return Ok(character);
    }

    match state.db.get_character(character_id).await {
        Ok(character) => return Ok(character),
        Err(DbError::NotFound(_)) => {}
        Err(e) => return Err(db_status("get character", e)),
    }

    let custom_id = Uuid::parse_str(character_id).map_err(|_| StatusCode::NOT_FOUND)?;
    state
        .db
        .get_custom_character(user_id, custom_id)
        .await
        .map(|c| c.to_character())
        .map_err(|e| db_status("get custom character", e))
}
