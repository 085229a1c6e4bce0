use backend::config::BackendConfig;
use clap::Parser;
use shared::models::AppSettings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "persona-launcher", about = "Serves the character chat API and web client")]
pub struct Cli {
    #[arg(long, env = "PERSONA_PORT", default_value_t = 8080)]
    pub port: u16,
    /// Built web client to serve next to the API.
    #[arg(long, env = "PERSONA_DIST_DIR", default_value = "dist")]
    pub dist_dir: PathBuf,
    #[arg(long, env = "PERSONA_DATABASE_URL", default_value = "sqlite://persona.db")]
    pub database_url: String,
    /// JSON store for per-user catalogs and saved transcripts.
    #[arg(long, env = "PERSONA_LOCAL_STORE", default_value = "local.json")]
    pub local_store: PathBuf,
    #[arg(long, env = "PERSONA_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,
    #[arg(long, env = "PERSONA_SESSION_DAYS", default_value_t = 30)]
    pub session_days: i64,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,
    #[arg(long, env = "OPENAI_API_BASE", default_value = "https://api.openai.com/v1")]
    pub api_base: String,
    #[arg(long, env = "PERSONA_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,
    #[arg(long, env = "PERSONA_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,
}

impl Cli {
    pub fn backend_config(&self) -> BackendConfig {
        if self.api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set; replies will fall back to the apology text");
        }
        BackendConfig {
            database_url: self.database_url.clone(),
            local_store_path: Some(self.local_store.clone()),
            jwt_secret: self.jwt_secret.clone(),
            session_ttl_days: self.session_days,
            generation: AppSettings {
                api_key: self.api_key.clone(),
                api_base: self.api_base.clone(),
                model: self.model.clone(),
                request_timeout_secs: self.request_timeout_secs,
                ..AppSettings::default()
            },
        }
    }
}
