use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions, Strength};
use thiserror::Error;

use crate::models::TranslationGroup;

#[derive(Debug, Error)]
#[error("collation data unavailable: {0}")]
pub struct CollationError(String);

/// Word list ordering selected by the `sort` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    None,
}

impl SortDirection {
    /// Unrecognized values fall back to no sorting.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("asc") => Self::Asc,
            Some("desc") => Self::Desc,
            _ => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::None => "none",
        }
    }

    pub const ALL: [SortDirection; 3] = [Self::None, Self::Asc, Self::Desc];
}

/// Orders groups by their word in `from_language`.
///
/// Words compare by Unicode collation at tertiary strength, so diacritics
/// sort next to their base letter and case still separates otherwise equal
/// words. Ties break on the group id so `Desc` is always the exact reverse
/// of `Asc`.
pub fn sort_groups(
    groups: &mut [TranslationGroup],
    from_language: &str,
    direction: SortDirection,
) -> Result<(), CollationError> {
    if direction == SortDirection::None {
        return Ok(());
    }

    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    let collator = Collator::try_new(&Default::default(), options)
        .map_err(|e| CollationError(e.to_string()))?;

    let ascending = |a: &TranslationGroup, b: &TranslationGroup| -> Ordering {
        collator
            .compare(source_text(a, from_language), source_text(b, from_language))
            .then_with(|| a.id.cmp(&b.id))
    };

    match direction {
        SortDirection::Asc => groups.sort_by(ascending),
        SortDirection::Desc => groups.sort_by(|a, b| ascending(b, a)),
        SortDirection::None => {}
    }
    Ok(())
}

fn source_text<'a>(group: &'a TranslationGroup, language: &str) -> &'a str {
    group
        .word_in(language)
        .map(|w| w.content.as_str())
        .unwrap_or("")
}
