use shared::models::AppSettings;
use std::path::PathBuf;

/// Everything `init` needs to assemble the application state.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub database_url: String,
    /// `None` keeps the local store in memory.
    pub local_store_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub session_ttl_days: i64,
    pub generation: AppSettings,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://persona.db".to_string(),
            local_store_path: Some(PathBuf::from("local.json")),
            jwt_secret: "dev-secret-change-me".to_string(),
            session_ttl_days: 30,
            generation: AppSettings::default(),
        }
    }
}
