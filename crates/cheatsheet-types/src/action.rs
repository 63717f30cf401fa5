use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

/// Upper bound on the suggestions returned by `translation.find`.
pub const MAX_SUGGESTIONS: usize = 3;

/// Sheet mutations and queries submitted from the sheet page.
///
/// The form protocol carries the variant in a `type` field; the remaining
/// fields are variant-specific (see [`Action::parse`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    TitleUpdate {
        title: String,
    },
    LanguagesUpdate {
        from: String,
        to: String,
    },
    SeparatorsUpdate {
        translation_separator: String,
        group_separator: String,
    },
    WordAdd {
        from: String,
        to: String,
    },
    WordUpdate {
        from: String,
        to: String,
        from_id: Uuid,
        to_id: Uuid,
    },
    TranslationGroupDelete {
        translation_group_id: Uuid,
    },
    TranslationFind {
        word: String,
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing action type")]
    MissingType,

    #[error("unknown action type `{0}`")]
    UnknownType(String),

    #[error("field `{0}` is required")]
    MissingField(&'static str),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("field `{0}` is not a valid id")]
    InvalidId(&'static str),

    #[error("source and target language must differ")]
    SameLanguage,

    #[error("source and target word must differ")]
    SameWord,
}

impl ValidationError {
    /// Name of the submitted field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingType | Self::UnknownType(_) => "type",
            Self::SameLanguage => "to",
            Self::SameWord => "toId",
            Self::MissingField(field) | Self::EmptyField(field) | Self::InvalidId(field) => *field,
        }
    }
}

impl Action {
    pub fn parse(fields: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let kind = fields.get("type").ok_or(ValidationError::MissingType)?;

        let action = match kind.as_str() {
            "title.update" => Self::TitleUpdate {
                title: text(fields, "title")?,
            },
            "languages.update" => {
                let from = text(fields, "from")?;
                let to = text(fields, "to")?;
                if from == to {
                    return Err(ValidationError::SameLanguage);
                }
                Self::LanguagesUpdate { from, to }
            }
            "separators.update" => Self::SeparatorsUpdate {
                translation_separator: separator(fields, "translationSeparator")?,
                group_separator: separator(fields, "groupSeparator")?,
            },
            "word.add" => Self::WordAdd {
                from: text(fields, "from")?,
                to: text(fields, "to")?,
            },
            "word.update" => {
                let from_id = id(fields, "fromId")?;
                let to_id = id(fields, "toId")?;
                if from_id == to_id {
                    return Err(ValidationError::SameWord);
                }
                Self::WordUpdate {
                    from: text(fields, "from")?,
                    to: text(fields, "to")?,
                    from_id,
                    to_id,
                }
            }
            "translationGroup.delete" => Self::TranslationGroupDelete {
                translation_group_id: id(fields, "translationGroupId")?,
            },
            "translation.find" => Self::TranslationFind {
                word: text(fields, "word")?,
                from: text(fields, "from")?,
                to: text(fields, "to")?,
            },
            other => return Err(ValidationError::UnknownType(other.to_string())),
        };

        Ok(action)
    }

    /// The `type` discriminant as submitted by forms.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TitleUpdate { .. } => "title.update",
            Self::LanguagesUpdate { .. } => "languages.update",
            Self::SeparatorsUpdate { .. } => "separators.update",
            Self::WordAdd { .. } => "word.add",
            Self::WordUpdate { .. } => "word.update",
            Self::TranslationGroupDelete { .. } => "translationGroup.delete",
            Self::TranslationFind { .. } => "translation.find",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::TranslationFind { .. })
    }
}

fn required<'a>(
    fields: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or(ValidationError::MissingField(name))
}

fn text(fields: &HashMap<String, String>, name: &'static str) -> Result<String, ValidationError> {
    let value = required(fields, name)?.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    Ok(value.to_string())
}

// Separators keep their surrounding whitespace.
fn separator(
    fields: &HashMap<String, String>,
    name: &'static str,
) -> Result<String, ValidationError> {
    let value = required(fields, name)?;
    if value.is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    Ok(value.to_string())
}

fn id(fields: &HashMap<String, String>, name: &'static str) -> Result<Uuid, ValidationError> {
    let value = required(fields, name)?.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    value.parse().map_err(|_| ValidationError::InvalidId(name))
}
