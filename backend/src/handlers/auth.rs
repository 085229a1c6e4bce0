use crate::AppState;
use crate::auth::{Claims, RESET_TOKEN_TTL_MINUTES, hash_password, issue_session, verify_password};
use crate::dbs::DbError;
use crate::handlers::db_status;
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use chrono::{DateTime, Duration, Utc};
use shared::models::{
    PasswordResetConfirm, PasswordResetRequest, Session, SignInRequest, SignUpRequest,
    SubscriptionTier, UpdatePasswordRequest, User, validate_password,
};
use uuid::Uuid;

fn hash_or_500(password: &str) -> Result<String, StatusCode> {
    hash_password(password).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<Session>), StatusCode> {
    if let Err(reason) = payload.validate() {
        tracing::debug!("Rejected sign-up: {}", reason);
        return Err(StatusCode::BAD_REQUEST);
    }

    let password_hash = hash_or_500(&payload.password)?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        avatar_url: None,
        subscription_status: SubscriptionTier::Free,
        created_at: now,
        updated_at: now,
    };

    state
        .db
        .create_user(&user, &password_hash)
        .await
        .map_err(|e| db_status("create user", e))?;
    tracing::info!(user_id = %user.id, "Registered new user");

    let session = issue_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<Session>, StatusCode> {
    let email = payload.email.trim().to_lowercase();
    let credentials = state
        .db
        .get_credentials(&email)
        .await
        .map_err(|e| db_status("look up credentials", e))?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !verify_password(&payload.password, &credentials.password_hash) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = state
        .db
        .get_user(credentials.user_id)
        .await
        .map_err(|e| db_status("get user", e))?;
    Ok(Json(issue_session(&state, user).await?))
}

pub async fn sign_out(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, StatusCode> {
    state
        .db
        .revoke_session(claims.sid)
        .await
        .map_err(|e| db_status("revoke session", e))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<Json<Session>, StatusCode> {
    let access_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();
    let expires_at =
        DateTime::from_timestamp(claims.exp as i64, 0).ok_or(StatusCode::UNAUTHORIZED)?;

    let user = state.db.get_user(claims.sub).await.map_err(|e| match e {
        DbError::NotFound(_) => StatusCode::UNAUTHORIZED,
        e => db_status("get user", e),
    })?;

    Ok(Json(Session {
        access_token,
        expires_at,
        user,
    }))
}

pub async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, StatusCode> {
    payload.validate().map_err(|_| StatusCode::BAD_REQUEST)?;
    let password_hash = hash_or_500(&payload.new_password)?;
    state
        .db
        .set_password_hash(claims.sub, &password_hash)
        .await
        .map_err(|e| db_status("update password", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Always accepted, so the response does not reveal which emails are registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> StatusCode {
    let email = payload.email.trim().to_lowercase();
    let credentials = match state.db.get_credentials(&email).await {
        Ok(Some(credentials)) => credentials,
        Ok(None) => return StatusCode::ACCEPTED,
        Err(e) => {
            tracing::error!("Failed to look up credentials: {:?}", e);
            return StatusCode::ACCEPTED;
        }
    };

    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    if let Err(e) = state
        .db
        .create_password_reset(&token, credentials.user_id, expires_at)
        .await
    {
        tracing::error!("Failed to store password reset token: {:?}", e);
        return StatusCode::ACCEPTED;
    }

    tracing::info!(user_id = %credentials.user_id, "Password reset requested");
    tracing::debug!("Password reset link: /reset-password?token={}", token);
    StatusCode::ACCEPTED
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<StatusCode, StatusCode> {
    validate_password(&payload.new_password).map_err(|_| StatusCode::BAD_REQUEST)?;

    let user_id = state
        .db
        .consume_password_reset(&payload.token)
        .await
        .map_err(|e| db_status("consume password reset", e))?
        .ok_or(StatusCode::BAD_REQUEST)?;

    let password_hash = hash_or_500(&payload.new_password)?;
    state
        .db
        .set_password_hash(user_id, &password_hash)
        .await
        .map_err(|e| db_status("update password", e))?;
    tracing::info!(user_id = %user_id, "Password reset completed");
    Ok(StatusCode::NO_CONTENT)
}
