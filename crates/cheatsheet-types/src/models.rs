use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: Uuid,
    pub content: String,
    pub language: String,
    pub translation_group_id: Uuid,
}

/// One concept, holding at most one word per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationGroup {
    pub id: Uuid,
    pub tags: Vec<String>,
    pub words: Vec<Word>,
}

impl TranslationGroup {
    pub fn word_in(&self, language: &str) -> Option<&Word> {
        self.words.iter().find(|w| w.language == language)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub id: Uuid,
    pub title: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: Uuid,
    pub from_language: String,
    pub to_language: String,
    pub translation_separator: String,
    pub group_separator: String,
    pub translation_groups: Vec<TranslationGroup>,
}

/// A source/target pair as it appears on the sheet and in exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordPair {
    pub from: String,
    pub to: String,
}

impl Sheet {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Pairs in the current group order. Missing words render as empty text.
    pub fn pairs(&self) -> Vec<WordPair> {
        self.translation_groups
            .iter()
            .map(|group| WordPair {
                from: group
                    .word_in(&self.from_language)
                    .map(|w| w.content.clone())
                    .unwrap_or_default(),
                to: group
                    .word_in(&self.to_language)
                    .map(|w| w.content.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Listing entry for the index pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSummary {
    pub id: Uuid,
    pub title: String,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
    pub word_count: usize,
}
