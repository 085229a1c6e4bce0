use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const AVATAR_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

/// Which shelf a character sits on. Drives the fallback persona prompt and the badge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterCategory {
    Historical,
    Celebrity,
    #[default]
    Custom,
}

impl CharacterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Celebrity => "celebrity",
            Self::Custom => "custom",
        }
    }

    /// Anything unrecognised is treated as a custom character.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "historical" => Self::Historical,
            "celebrity" => Self::Celebrity,
            _ => Self::Custom,
        }
    }

    /// Persona prompt used when a character carries none of its own.
    pub fn default_prompt(&self, name: &str) -> String {
        match self {
            Self::Historical => format!(
                "You are {name}, a historical figure from Kazakh history. Respond as if you are this person, with their knowledge, personality, and perspective. Use first-person perspective. Include historical facts and cultural context in your responses."
            ),
            Self::Celebrity => format!(
                "You are {name}, a modern Kazakh celebrity. Respond as if you are this person, with their public persona, interests, and perspective. Use first-person perspective. Reference your work and public life in your responses."
            ),
            Self::Custom => format!(
                "You are {name}, a custom AI character. Respond according to the personality traits and background information provided. Use first-person perspective and stay in character."
            ),
        }
    }

    pub fn badge(&self) -> Badge {
        let (background, foreground) = match self {
            Self::Historical => ("amber-100", "amber-800"),
            Self::Celebrity => ("purple-100", "purple-800"),
            Self::Custom => ("green-100", "green-800"),
        };
        Badge {
            label: self.as_str(),
            background,
            foreground,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub background: &'static str,
    pub foreground: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: CharacterCategory,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

impl Character {
    /// The character's own prompt, or the category fallback when it has none.
    pub fn persona_prompt(&self) -> String {
        match self.system_prompt.as_deref().map(str::trim) {
            Some(prompt) if !prompt.is_empty() => prompt.to_string(),
            _ => self.category.default_prompt(&self.name),
        }
    }

    pub fn avatar_for(name: &str) -> String {
        format!("{AVATAR_BASE}{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    Formal,
    Casual,
    Poetic,
    Humorous,
    Philosophical,
}

impl CommunicationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Casual => "casual",
            Self::Poetic => "poetic",
            Self::Humorous => "humorous",
            Self::Philosophical => "philosophical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "formal" => Some(Self::Formal),
            "casual" => Some(Self::Casual),
            "poetic" => Some(Self::Poetic),
            "humorous" => Some(Self::Humorous),
            "philosophical" => Some(Self::Philosophical),
            _ => None,
        }
    }
}

/// A character created and owned by one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomCharacter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub personality: String,
    pub background: String,
    pub communication_style: CommunicationStyle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomCharacter {
    pub fn to_character(&self) -> Character {
        let system_prompt = format!(
            "You are {}, a custom AI character.\nPersonality: {}\nBackground: {}\nCommunication style: {}",
            self.name,
            self.personality,
            self.background,
            self.communication_style.as_str()
        );
        Character {
            id: self.id.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            category: CharacterCategory::Custom,
            system_prompt: Some(system_prompt),
            is_premium: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateCharacterRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub personality: String,
    pub background: String,
    pub communication_style: CommunicationStyle,
}

impl CreateCharacterRequest {
    /// Returns the first rule the request breaks, if any.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().chars().count() < 2 {
            return Err("name must be at least 2 characters");
        }
        if self.personality.trim().chars().count() < 10 {
            return Err("personality must be at least 10 characters");
        }
        if self.background.trim().chars().count() < 20 {
            return Err("background must be at least 20 characters");
        }
        Ok(())
    }
}

/// A character as offered by the catalog, with its display treatment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub character: Character,
    pub badge: Badge,
    pub builtin: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogView {
    pub characters: Vec<CatalogEntry>,
    pub active_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AddCatalogCharacterRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: CharacterCategory,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SelectCharacterRequest {
    pub id: String,
}
