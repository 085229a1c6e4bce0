use axum::body::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{AppSettings, ChatMessage, Character, ROLE_SYSTEM};
use std::time::Duration;
use thiserror::Error;

/// Shown in place of a reply when the request itself failed.
pub const APOLOGY: &str = "Кешіріңіз, қате орын алды. Әңгімелесуді кейінірек жалғастырыңыз.";
/// Shown when the endpoint answered with JSON whose `choices[0].message` is absent or not an object.
pub const UNEXPECTED_FORMAT: &str = "Жауап алу мүмкін болмады. API форматы күтілгеннен өзгеше.";
/// Shown when the message is there but carries no text.
pub const EMPTY_REPLY: &str = "Жауап алу мүмкін болмады.";

const LANGUAGE_DIRECTIVE: &str = "Respond in Kazakh language.";
const LENGTH_DIRECTIVE: &str = "Keep responses concise (1-3 paragraphs).";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Response body is not JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Response has no choices[0].message")]
    UnexpectedFormat(Value),
    #[error("Response message has no content")]
    EmptyContent,
}

impl GenerationError {
    /// Text the user sees instead of a reply.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            Self::UnexpectedFormat(_) => UNEXPECTED_FORMAT,
            Self::EmptyContent => EMPTY_REPLY,
            Self::Transport(_) | Self::Status { .. } | Self::Decode(_) => APOLOGY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub temperature: f32,
    pub max_tokens: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeechBody {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub response_format: String,
}

/// Persona, identity and the two fixed directives, in that order.
pub fn system_prompt(character: &Character) -> String {
    format!(
        "{}\n\nYou are {}. {}\n\n{} {}",
        character.persona_prompt(),
        character.name,
        character.description,
        LANGUAGE_DIRECTIVE,
        LENGTH_DIRECTIVE
    )
}

/// Build the completion conversation: one system turn, then the history as user/assistant turns.
pub fn build_conversation(
    messages: &[ChatMessage],
    character: &Character,
) -> Vec<CompletionMessage> {
    let mut conversation = Vec::with_capacity(messages.len() + 1);
    conversation.push(CompletionMessage {
        role: ROLE_SYSTEM.to_string(),
        content: system_prompt(character),
    });
    conversation.extend(messages.iter().map(|msg| CompletionMessage {
        role: msg.sender.role().to_string(),
        content: msg.content.clone(),
    }));
    conversation
}

/// Pulls `choices[0].message.content` out of a completion response body.
fn extract_reply(data: Value) -> Result<String, GenerationError> {
    if !data.pointer("/choices/0/message").is_some_and(Value::is_object) {
        return Err(GenerationError::UnexpectedFormat(data));
    }
    match data.pointer("/choices/0/message/content").and_then(Value::as_str) {
        Some(content) if !content.is_empty() => Ok(content.to_string()),
        _ => Err(GenerationError::EmptyContent),
    }
}

/// Client for the completion and speech endpoints.
#[derive(Clone)]
pub struct Generator {
    client: Client,
    settings: AppSettings,
}

impl Generator {
    pub fn new(settings: AppSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    pub fn completion_request(
        &self,
        messages: &[ChatMessage],
        character: &Character,
    ) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: build_conversation(messages, character),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// One completion round trip, with every failure mode kept distinct.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        character: &Character,
    ) -> Result<String, GenerationError> {
        let body = self.completion_request(messages, character);
        tracing::debug!(
            character = %character.name,
            messages = messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let text = response.text().await?;
        let data: Value = serde_json::from_str(&text)?;
        extract_reply(data)
    }

    /// The next assistant line for `character`. Never fails: errors become a fallback text.
    pub async fn generate_reply(&self, messages: &[ChatMessage], character: &Character) -> String {
        match self.complete(messages, character).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Error generating reply for {}: {}", character.name, e);
                e.fallback_text().to_string()
            }
        }
    }

    /// Audio for `text` in the configured voice and format.
    pub async fn synthesize_speech(&self, text: &str) -> Result<Bytes, GenerationError> {
        let body = SpeechBody {
            model: self.settings.speech_model.clone(),
            input: text.to_string(),
            voice: self.settings.voice.clone(),
            response_format: self.settings.audio_format.clone(),
        };

        let response = self
            .client
            .post(self.endpoint("audio/speech"))
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }
        Ok(response.bytes().await?)
    }
}
