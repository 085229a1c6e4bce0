use crate::dbs::{LocalStore, LocalStoreError};
use shared::models::{
    AddCatalogCharacterRequest, CatalogEntry, CatalogView, Character, CharacterCategory,
};
use std::collections::HashSet;
use uuid::Uuid;

/// Local store key holding one user's saved character list.
pub fn characters_key(user_id: Uuid) -> String {
    format!("characters:{}", user_id)
}

/// Characters every installation starts with. They cannot be removed.
pub fn builtin_characters() -> Vec<Character> {
    vec![
        Character {
            id: "abai".to_string(),
            name: "Абай Құнанбаев".to_string(),
            description: "Абай Құнанбаев (1845-1904) - великий казахский поэт, композитор, просветитель, мыслитель и общественный деятель.".to_string(),
            image_url: Character::avatar_for("Abai"),
            category: CharacterCategory::Historical,
            system_prompt: Some("You are Abai Kunanbayev, a renowned Kazakh poet and philosopher from the 19th century. You wrote poetry and prose about Kazakh life and advocated for education and moral values.".to_string()),
            is_premium: false,
        },
        Character {
            id: "al-farabi".to_string(),
            name: "Әл-Фараби".to_string(),
            description: "Әл-Фараби (870-950) - средневековый философ, математик, музыкант и ученый. Один из крупнейших представителей средневековой восточной философии.".to_string(),
            image_url: Character::avatar_for("AlFarabi"),
            category: CharacterCategory::Historical,
            system_prompt: Some("You are Al-Farabi, a medieval philosopher and scientist known as 'The Second Teacher' after Aristotle. You made significant contributions to philosophy, logic, sociology, medicine, mathematics, and music.".to_string()),
            is_premium: false,
        },
        Character {
            id: "dimash".to_string(),
            name: "Димаш Құдайберген".to_string(),
            description: "Димаш Құдайберген - современный казахский певец с широким вокальным диапазоном, известный своими выступлениями на международной сцене.".to_string(),
            image_url: Character::avatar_for("Dimash"),
            category: CharacterCategory::Celebrity,
            system_prompt: Some("You are Dimash Kudaibergen, a contemporary Kazakh singer with a wide vocal range. You're known for your performances on international stages and your unique vocal abilities.".to_string()),
            is_premium: false,
        },
        Character {
            id: "teacher".to_string(),
            name: "Қазақ Мұғалімі".to_string(),
            description: "Қазақ тілі мен әдебиеті мұғалімі, қазақ тілін үйренушілерге көмектесуге дайын.".to_string(),
            image_url: Character::avatar_for("Teacher"),
            category: CharacterCategory::Custom,
            system_prompt: Some("You are a Kazakh language teacher. Your goal is to help people learn the Kazakh language. Provide explanations about grammar, vocabulary, and cultural context when appropriate.".to_string()),
            is_premium: false,
        },
    ]
}

/// The selectable characters plus the one currently chosen.
///
/// `active_id` is always `None` or the id of a member of `characters`.
#[derive(Clone, Debug)]
pub struct CharacterCatalog {
    characters: Vec<Character>,
    active_id: Option<String>,
    builtin_ids: HashSet<String>,
}

impl Default for CharacterCatalog {
    fn default() -> Self {
        Self::from_saved(None)
    }
}

impl CharacterCatalog {
    /// Builds a catalog from a previously saved list, or the built-ins when there is none.
    /// Built-ins missing from the saved list are put back at the front.
    pub fn from_saved(saved: Option<Vec<Character>>) -> Self {
        let builtins = builtin_characters();
        let builtin_ids: HashSet<String> = builtins.iter().map(|c| c.id.clone()).collect();

        let characters = match saved {
            Some(saved) => {
                let mut missing: Vec<Character> = builtins
                    .into_iter()
                    .filter(|b| !saved.iter().any(|c| c.id == b.id))
                    .collect();
                missing.extend(saved);
                missing
            }
            None => builtins,
        };

        let active_id = characters.first().map(|c| c.id.clone());
        Self {
            characters,
            active_id,
            builtin_ids,
        }
    }

    pub fn load(store: &LocalStore, user_id: Uuid) -> Self {
        Self::from_saved(store.get(&characters_key(user_id)))
    }

    /// Writes the character list through to the local store.
    pub fn persist(&self, store: &LocalStore, user_id: Uuid) -> Result<(), LocalStoreError> {
        store.set(&characters_key(user_id), &self.characters)
    }

    pub fn list(&self) -> &[Character] {
        &self.characters
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn active(&self) -> Option<&Character> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn is_builtin(&self, id: &str) -> bool {
        self.builtin_ids.contains(id)
    }

    /// Makes `id` the active character. Ids outside the catalog leave the selection alone.
    pub fn select(&mut self, id: &str) -> Option<&Character> {
        if self.get(id).is_some() {
            self.active_id = Some(id.to_string());
            self.active()
        } else {
            None
        }
    }

    /// Adds a user-defined character under a freshly generated id.
    pub fn add(&mut self, request: AddCatalogCharacterRequest) -> &Character {
        let image_url = request
            .image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| Character::avatar_for(&request.name));
        self.characters.push(Character {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            description: request.description,
            image_url,
            category: request.category,
            system_prompt: request.system_prompt,
            is_premium: false,
        });
        let last = self.characters.len() - 1;
        &self.characters[last]
    }

    /// Removes a user-defined character. Built-ins and unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.is_builtin(id) {
            return false;
        }
        let before = self.characters.len();
        self.characters.retain(|c| c.id != id);
        if self.characters.len() == before {
            return false;
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.characters.first().map(|c| c.id.clone());
        }
        true
    }

    pub fn view(&self) -> CatalogView {
        CatalogView {
            characters: self
                .characters
                .iter()
                .map(|c| CatalogEntry {
                    character: c.clone(),
                    badge: c.category.badge(),
                    builtin: self.is_builtin(&c.id),
                })
                .collect(),
            active_id: self.active_id.clone(),
        }
    }
}
