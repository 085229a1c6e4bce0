pub mod auth;
pub mod catalog;
pub mod config;
pub mod dbs;
mod handlers;
pub mod openai;
pub mod persistence;

use crate::auth::{AuthKeys, require_auth};
use crate::catalog::{CharacterCatalog, builtin_characters};
use crate::config::BackendConfig;
use crate::dbs::{Database, DbError, LocalStore, SqliteDatabase};
use crate::handlers::*;
use crate::openai::Generator;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub local: Arc<LocalStore>,
    /// Each user's catalog, loaded from `local` on first use.
    pub catalogs: Arc<RwLock<HashMap<Uuid, CharacterCatalog>>>,
    pub generator: Generator,
    pub auth: AuthKeys,
}

impl AppState {
    pub async fn from_config(config: &BackendConfig) -> Result<Self, InitError> {
        let db = SqliteDatabase::connect(&config.database_url).await?;
        let local = match &config.local_store_path {
            Some(path) => LocalStore::open(path),
            None => LocalStore::in_memory(),
        };
        let generator = Generator::new(config.generation.clone())?;
        let auth = AuthKeys::new(config.jwt_secret.clone(), config.session_ttl_days);
        Self::assemble(Arc::new(db), local, generator, auth).await
    }

    /// Seeds the built-in characters.
    pub async fn assemble(
        db: Arc<dyn Database>,
        local: LocalStore,
        generator: Generator,
        auth: AuthKeys,
    ) -> Result<Self, InitError> {
        db.seed_characters(&builtin_characters()).await?;
        tracing::info!(model = %generator.settings().model, "Backend state ready");
        Ok(Self {
            db,
            local: Arc::new(local),
            catalogs: Arc::new(RwLock::new(HashMap::new())),
            generator,
            auth,
        })
    }

    /// Runs `f` against the catalog of `user_id`. Keep `f` free of I/O.
    pub fn with_catalog<R>(&self, user_id: Uuid, f: impl FnOnce(&mut CharacterCatalog) -> R) -> R {
        let mut catalogs = self.catalogs.write().unwrap_or_else(PoisonError::into_inner);
        let catalog = catalogs
            .entry(user_id)
            .or_insert_with(|| CharacterCatalog::load(&self.local, user_id));
        f(catalog)
    }

    /// Writes the catalog of `user_id` to the local store on the blocking pool.
    /// Failures are logged only.
    pub async fn persist_catalog(&self, user_id: Uuid) {
        let state = self.clone();
        let written = tokio::task::spawn_blocking(move || {
            let catalogs = state.catalogs.read().unwrap_or_else(PoisonError::into_inner);
            match catalogs.get(&user_id) {
                Some(catalog) => catalog.persist(&state.local, user_id),
                None => Ok(()),
            }
        })
        .await;

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(user_id = %user_id, "Failed to save character catalog: {}", e),
            Err(e) => tracing::error!("Catalog save task failed: {}", e),
        }
    }
}

pub async fn init(router: Router<AppState>, config: &BackendConfig) -> Result<Router<()>, InitError> {
    let state = AppState::from_config(config).await?;
    Ok(with_state(router, state))
}

/// Mounts the `/api` routes on `router` and binds `state`.
pub fn with_state(router: Router<AppState>, state: AppState) -> Router<()> {
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/password-reset", post(request_password_reset))
        .route(
            "/api/auth/password-reset/confirm",
            post(confirm_password_reset),
        );

    let protected_routes = Router::new()
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/session", get(current_session))
        .route("/api/auth/password", put(update_password))
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/catalog", get(list_catalog).post(add_to_catalog))
        .route("/api/catalog/active", put(select_character))
        .route("/api/catalog/{id}", delete(remove_from_catalog))
        .route(
            "/api/characters",
            get(list_characters).post(create_character),
        )
        .route("/api/characters/{id}", delete(delete_character))
        .route("/api/chat", post(send_message))
        .route("/api/chat/transcript", post(share_transcript))
        .route("/api/speech", post(speak))
        .route("/api/conversations", get(list_conversations))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route(
            "/api/local/conversations",
            get(list_saved_conversations)
                .post(save_conversation)
                .delete(clear_saved_conversations),
        )
        .route(
            "/api/local/conversations/{id}",
            delete(delete_saved_conversation),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    router
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
