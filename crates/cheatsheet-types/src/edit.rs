//! Inline-edit state for the sheet page.
//!
//! Every editable field is either displayed or being edited. The flag lives
//! in the page URL's query string, so it survives reloads and is dropped by
//! the redirect that follows a successful submit.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use uuid::Uuid;

use crate::action::Action;
use crate::sort::SortDirection;

// RFC 3986 unreserved characters stay readable.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Display,
    Editing,
}

/// Something on the sheet page that can be switched into edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Title,
    Languages,
    Separators,
    Row(Uuid),
}

impl EditTarget {
    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "edit_title",
            Self::Languages => "edit_languages",
            Self::Separators => "edit_separators",
            Self::Row(_) => "edit_row",
        }
    }

    fn value(self) -> String {
        match self {
            Self::Row(id) => id.to_string(),
            _ => "true".to_string(),
        }
    }
}

impl Action {
    /// Query key of the editor this action completes, if any.
    pub fn edit_key(&self) -> Option<&'static str> {
        match self {
            Action::TitleUpdate { .. } => Some(EditTarget::Title.key()),
            Action::LanguagesUpdate { .. } => Some(EditTarget::Languages.key()),
            Action::SeparatorsUpdate { .. } => Some(EditTarget::Separators.key()),
            Action::WordUpdate { .. } => Some("edit_row"),
            Action::WordAdd { .. }
            | Action::TranslationGroupDelete { .. }
            | Action::TranslationFind { .. } => None,
        }
    }
}

/// The query string of the sheet page, kept in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetLocation {
    params: Vec<(String, String)>,
}

impl SheetLocation {
    pub fn new(params: Vec<(String, String)>) -> Self {
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn sort(&self) -> SortDirection {
        SortDirection::parse(self.get("sort"))
    }

    pub fn mode(&self, target: EditTarget) -> EditMode {
        let editing = match (target, self.get(target.key())) {
            (_, None) => false,
            (EditTarget::Row(id), Some(value)) => value.parse::<Uuid>().is_ok_and(|v| v == id),
            (_, Some(value)) => !value.is_empty() && value != "false",
        };
        if editing {
            EditMode::Editing
        } else {
            EditMode::Display
        }
    }

    pub fn is_editing(&self, target: EditTarget) -> bool {
        self.mode(target) == EditMode::Editing
    }

    /// Display → Editing.
    pub fn begin_edit(&self, target: EditTarget) -> Self {
        self.with(target.key(), &target.value())
    }

    /// Editing → Display, by cancel or after a successful submit.
    pub fn end_edit(&self, target: EditTarget) -> Self {
        self.without(target.key())
    }

    pub fn with(&self, key: &str, value: &str) -> Self {
        let mut next = self.without(key);
        next.params.push((key.to_string(), value.to_string()));
        next
    }

    pub fn without(&self, key: &str) -> Self {
        Self {
            params: self
                .params
                .iter()
                .filter(|(k, _)| k != key)
                .cloned()
                .collect(),
        }
    }

    /// Location to return to once `action` has completed.
    pub fn after(&self, action: &Action) -> Self {
        match action.edit_key() {
            Some(key) => self.without(key),
            None => self.clone(),
        }
    }

    pub fn query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY),
                    utf8_percent_encode(v, QUERY)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// `path` with this location's query string appended.
    pub fn href(&self, path: &str) -> String {
        if self.params.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.query_string())
        }
    }
}
