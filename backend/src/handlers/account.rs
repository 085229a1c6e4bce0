use crate::AppState;
use crate::auth::Claims;
use crate::handlers::db_status;
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use shared::models::{ProfileView, UpdateProfileRequest, UpdateSettingsRequest, UserSettings};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileView>, StatusCode> {
    let user = state
        .db
        .get_user(claims.sub)
        .await
        .map_err(|e| db_status("get user", e))?;
    let profile = state
        .db
        .get_profile(claims.sub)
        .await
        .map_err(|e| db_status("get profile", e))?;
    Ok(Json(ProfileView { user, profile }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileView>, StatusCode> {
    let name = payload.name.map(|n| n.trim().to_string());
    if name.as_ref().is_some_and(|n| n.chars().count() < 2) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = state
        .db
        .update_user(claims.sub, name, payload.avatar_url)
        .await
        .map_err(|e| db_status("update user", e))?;
    let profile = state
        .db
        .update_profile(claims.sub, payload.bio, payload.language)
        .await
        .map_err(|e| db_status("update profile", e))?;
    Ok(Json(ProfileView { user, profile }))
}

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserSettings>, StatusCode> {
    let settings = state
        .db
        .get_settings(claims.sub)
        .await
        .map_err(|e| db_status("get settings", e))?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<UserSettings>, StatusCode> {
    let mut settings = state
        .db
        .get_settings(claims.sub)
        .await
        .map_err(|e| db_status("get settings", e))?;

    if let Some(v) = payload.email_notifications {
        settings.email_notifications = v;
    }
    if let Some(v) = payload.marketing_notifications {
        settings.marketing_notifications = v;
    }
    if let Some(v) = payload.chat_notifications {
        settings.chat_notifications = v;
    }
    settings.updated_at = Utc::now();

    state
        .db
        .update_settings(&settings)
        .await
        .map_err(|e| db_status("update settings", e))?;
    Ok(Json(settings))
}
