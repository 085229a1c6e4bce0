use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value == "premium" {
            Self::Premium
        } else {
            Self::Free
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub subscription_status: SubscriptionTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub bio: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: Uuid,
    pub email_notifications: bool,
    pub marketing_notifications: bool,
    pub chat_notifications: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub user: User,
    pub profile: UserProfile,
}

// Request payloads
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().chars().count() < 2 {
            return Err("name must be at least 2 characters");
        }
        if !looks_like_email(&self.email) {
            return Err("email is not valid");
        }
        validate_password(&self.password)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UpdatePasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.new_password != self.confirm_password {
            return Err("passwords do not match");
        }
        validate_password(&self.new_password)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub email_notifications: Option<bool>,
    #[serde(default)]
    pub marketing_notifications: Option<bool>,
    #[serde(default)]
    pub chat_notifications: Option<bool>,
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Err("password must be at least 6 characters")
    } else {
        Ok(())
    }
}

/// Cheap shape check: one `@`, something before it, a dotted domain after it.
pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("aigerim@example.kz"));
        assert!(!looks_like_email("aigerim.example.kz"));
        assert!(!looks_like_email("@example.kz"));
        assert!(!looks_like_email("a@b@c.kz"));
        assert!(!looks_like_email("a@kz."));
    }

    #[test]
    fn sign_up_rules() {
        let mut req = SignUpRequest {
            name: "Айгерім".into(),
            email: "aigerim@example.kz".into(),
            password: "qwerty1".into(),
        };
        assert!(req.validate().is_ok());
        req.password = "short".into();
        assert_eq!(req.validate(), Err("password must be at least 6 characters"));
        req.password = "qwerty1".into();
        req.name = "А".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn password_update_requires_match() {
        let req = UpdatePasswordRequest {
            new_password: "secret12".into(),
            confirm_password: "secret13".into(),
        };
        assert_eq!(req.validate(), Err("passwords do not match"));
    }
}
