use crate::AppState;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::models::{Session, User};
use uuid::Uuid;

/// How long a password reset link stays usable.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// Server-side session row; revoking it invalidates the token.
    pub sid: Uuid,
    pub exp: usize,
}

#[derive(Clone)]
pub struct AuthKeys {
    secret: String,
    session_ttl: Duration,
}

impl AuthKeys {
    pub fn new(secret: impl Into<String>, session_ttl_days: i64) -> Self {
        Self {
            secret: secret.into(),
            session_ttl: Duration::days(session_ttl_days),
        }
    }

    pub fn create_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            exp: expires_at.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Records a new session for `user` and returns it with a signed token.
pub async fn issue_session(state: &AppState, user: User) -> Result<Session, StatusCode> {
    let session_id = Uuid::new_v4();
    let expires_at = Utc::now() + state.auth.session_ttl;

    state
        .db
        .create_session(session_id, user.id, expires_at)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create session: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let access_token = state
        .auth
        .create_token(user.id, session_id, expires_at)
        .map_err(|e| {
            tracing::error!("Failed to sign session token: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Session {
        access_token,
        expires_at,
        user,
    })
}

/// Validates the bearer token and its session row, then exposes the `Claims` to handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state
        .auth
        .decode_token(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let active = state.db.session_active(claims.sid).await.map_err(|e| {
        tracing::error!("Failed to look up session: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if !active {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("qwerty1").unwrap();
        assert!(verify_password("qwerty1", &hash));
        assert!(!verify_password("qwerty2", &hash));
        assert!(!verify_password("qwerty1", "not-a-hash"));
    }

    #[test]
    fn token_carries_user_and_session() {
        let keys = AuthKeys::new("secret", 30);
        let (user, session) = (Uuid::new_v4(), Uuid::new_v4());
        let token = keys
            .create_token(user, session, Utc::now() + Duration::hours(1))
            .unwrap();

        let claims = keys.decode_token(&token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.sid, session);

        assert!(AuthKeys::new("other", 30).decode_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = AuthKeys::new("secret", 30);
        let token = keys
            .create_token(Uuid::new_v4(), Uuid::new_v4(), Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(keys.decode_token(&token).is_err());
    }
}
