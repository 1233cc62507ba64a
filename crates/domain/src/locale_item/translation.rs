use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The text of a locale item in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub lang: String,
    pub content: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl TranslationItem {
    pub(crate) fn new(lang: String, content: String, user: &str, at: DateTime<Utc>) -> Self {
        Self {
            lang,
            content,
            created_by: user.to_string(),
            created_at: at,
            updated_by: user.to_string(),
            updated_at: at,
        }
    }

    pub(crate) fn update(&mut self, content: String, user: &str, at: DateTime<Utc>) {
        self.content = content;
        self.updated_by = user.to_string();
        self.updated_at = at;
    }
}
