//! Database row types. These map directly to SQLite rows and stay separate
//! from the cheatsheet-types models.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct SheetRow {
    pub id: String,
    pub title: String,
    pub points: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
    pub from_language: String,
    pub to_language: String,
    pub translation_separator: String,
    pub group_separator: String,
}

pub struct SheetSummaryRow {
    pub id: String,
    pub title: String,
    pub points: i64,
    pub updated_at: String,
    pub word_count: i64,
}

/// A word of a group attached to some sheet, with its language name resolved.
pub struct WordRow {
    pub id: String,
    pub content: String,
    pub language: String,
    pub translation_group_id: String,
}

pub struct GroupTagRow {
    pub translation_group_id: String,
    pub tag: String,
}

/// Outcome of a write that may reference rows that do not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Done,
    /// The id of the referenced row that was not found.
    RowMissing(String),
}
