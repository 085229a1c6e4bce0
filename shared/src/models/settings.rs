use serde::{Deserialize, Serialize};

/// Everything the generation helper needs to reach the completion and speech endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u16,
    pub speech_model: String,
    pub voice: String,
    pub audio_format: String,
    pub request_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            speech_model: "gpt-4o-mini-audio-preview".to_string(),
            voice: "alloy".to_string(),
            audio_format: "mp3".to_string(),
            request_timeout_secs: 60,
        }
    }
}
