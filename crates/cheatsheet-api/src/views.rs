//! Page templates and the view models that feed them.

use std::collections::HashMap;

use askama::Template;
use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;

use cheatsheet_types::auth::{CredentialsForm, FieldErrors};
use cheatsheet_types::edit::{EditTarget, SheetLocation};
use cheatsheet_types::models::{Sheet, SheetSummary};
use cheatsheet_types::sort::SortDirection;

pub fn time_ago(at: DateTime<Utc>) -> String {
    HumanTime::from(at).to_string()
}

fn display_title(title: &str) -> String {
    if title.is_empty() {
        "Untitled cheat sheet".to_string()
    } else {
        title.to_string()
    }
}

// -- Listings --

pub struct SheetCard {
    pub href: String,
    pub title: String,
    pub updated: String,
    pub word_count: usize,
    pub points: i64,
}

impl From<SheetSummary> for SheetCard {
    fn from(s: SheetSummary) -> Self {
        Self {
            href: format!("/sheets/{}", s.id),
            title: display_title(&s.title),
            updated: time_ago(s.updated_at),
            word_count: s.word_count,
            points: s.points,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav_user: Option<String>,
    pub user_sheets: Vec<SheetCard>,
    pub top_sheets: Vec<SheetCard>,
}

#[derive(Template)]
#[template(path = "all_sheets.html")]
pub struct AllSheetsTemplate {
    pub nav_user: Option<String>,
    pub sheets: Vec<SheetCard>,
}

// -- Auth forms --

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub nav_user: Option<String>,
    pub heading: &'static str,
    pub action: &'static str,
    pub alternative_prompt: &'static str,
    pub alternative_href: &'static str,
    pub alternative_label: &'static str,
    pub username: String,
    pub username_error: Option<String>,
    pub password_error: Option<String>,
    pub form_error: Option<String>,
}

impl AuthTemplate {
    pub fn register() -> Self {
        Self {
            nav_user: None,
            heading: "Sign up to Cheat Sheets",
            action: "/register",
            alternative_prompt: "Already have an account?",
            alternative_href: "/login",
            alternative_label: "Sign in",
            username: String::new(),
            username_error: None,
            password_error: None,
            form_error: None,
        }
    }

    pub fn login() -> Self {
        Self {
            heading: "Login to Cheat Sheets",
            action: "/login",
            alternative_prompt: "Don't have an account yet?",
            alternative_href: "/register",
            alternative_label: "Sign up",
            ..Self::register()
        }
    }

    /// Refills the username (never the password) and attaches errors.
    pub fn with_errors(
        mut self,
        form: &CredentialsForm,
        errors: FieldErrors,
        form_error: Option<String>,
    ) -> Self {
        self.username = form.username.clone();
        self.username_error = errors.get("username").map(str::to_string);
        self.password_error = errors.get("password").map(str::to_string);
        self.form_error = form_error;
        self
    }
}

// -- Sheet page --

pub struct SelectOption {
    pub name: String,
    pub selected: bool,
}

pub struct FieldInput {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    /// Non-empty for inputs rendered as a select.
    pub options: Vec<SelectOption>,
}

impl FieldInput {
    fn text(name: &'static str, label: &'static str, value: &str) -> Self {
        Self {
            name,
            label,
            value: value.to_string(),
            options: Vec::new(),
        }
    }

    fn select(name: &'static str, label: &'static str, value: &str, choices: &[String]) -> Self {
        Self {
            name,
            label,
            value: value.to_string(),
            options: choices
                .iter()
                .map(|c| SelectOption {
                    name: c.clone(),
                    selected: c == value,
                })
                .collect(),
        }
    }

    fn refill(&mut self, value: &str) {
        for option in &mut self.options {
            option.selected = option.name == value;
        }
        self.value = value.to_string();
    }
}

/// One entry of the actions panel: a labelled group of inputs that toggles
/// between display and edit mode and submits `action_type` when confirmed.
pub struct EditableField {
    pub label: &'static str,
    pub help: Option<&'static str>,
    pub action_type: &'static str,
    pub editing: bool,
    pub edit_href: String,
    pub cancel_href: String,
    pub inputs: Vec<FieldInput>,
}

impl EditableField {
    fn new(
        target: EditTarget,
        label: &'static str,
        action_type: &'static str,
        inputs: Vec<FieldInput>,
        location: &SheetLocation,
        path: &str,
    ) -> Self {
        Self {
            label,
            help: None,
            action_type,
            editing: location.is_editing(target),
            edit_href: location.begin_edit(target).href(path),
            cancel_href: location.end_edit(target).href(path),
            inputs,
        }
    }

    fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Puts a rejected submit of this field back into its inputs.
    fn refill(&mut self, submitted: &HashMap<String, String>) {
        if !self.editing || submitted.get("type").map(String::as_str) != Some(self.action_type) {
            return;
        }
        for input in &mut self.inputs {
            if let Some(value) = submitted.get(input.name) {
                input.refill(value);
            }
        }
    }
}

pub struct RowView {
    pub group_id: String,
    pub from_id: String,
    pub from_text: String,
    pub to_id: String,
    pub to_text: String,
    pub tags: Vec<String>,
    /// Both words exist, so the pair can be rewritten.
    pub complete: bool,
    pub editing: bool,
    pub edit_href: String,
    pub cancel_href: String,
}

pub struct SortLink {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// Error shown at the top of the sheet page after a rejected submit.
pub struct FormError {
    pub field: Option<&'static str>,
    pub message: String,
}

#[derive(Template)]
#[template(path = "sheet.html")]
pub struct SheetTemplate {
    pub nav_user: Option<String>,
    pub title: String,
    pub updated: String,
    pub points: i64,
    pub from_language: String,
    pub to_language: String,
    pub owner: bool,
    pub action_url: String,
    pub export_url: String,
    pub rows: Vec<RowView>,
    pub fields: Vec<EditableField>,
    pub sort_links: Vec<SortLink>,
    pub lookup_word: String,
    pub suggestions: Vec<String>,
    pub error: Option<FormError>,
}

/// What the last submit left behind for the page to show.
#[derive(Default)]
pub struct PageFeedback {
    pub error: Option<FormError>,
    pub lookup_word: String,
    pub suggestions: Vec<String>,
    /// Form fields of a rejected submit, shown again in place of the stored
    /// values.
    pub submitted: HashMap<String, String>,
}

impl SheetTemplate {
    pub fn build(
        sheet: &Sheet,
        languages: &[String],
        location: &SheetLocation,
        nav_user: Option<String>,
        owner: bool,
        feedback: PageFeedback,
    ) -> Self {
        let path = format!("/sheets/{}", sheet.id);

        let mut fields = vec![
            EditableField::new(
                EditTarget::Title,
                "Title",
                "title.update",
                vec![FieldInput::text("title", "Title", &sheet.title)],
                location,
                &path,
            ),
            EditableField::new(
                EditTarget::Languages,
                "Languages",
                "languages.update",
                vec![
                    FieldInput::select("from", "From", &sheet.from_language, languages),
                    FieldInput::select("to", "To", &sheet.to_language, languages),
                ],
                location,
                &path,
            ),
            EditableField::new(
                EditTarget::Separators,
                "Cheat sheet separators",
                "separators.update",
                vec![
                    FieldInput::text("translationSeparator", "Word Separator", &sheet.translation_separator),
                    FieldInput::text("groupSeparator", "Group Separator", &sheet.group_separator),
                ],
                location,
                &path,
            )
            .with_help(
                "Signs that separate words from their translations and pairs from each other \
                 in the exported document. Spaces matter here.",
            ),
        ];
        for field in &mut fields {
            field.refill(&feedback.submitted);
        }
        let rewritten = |row: &RowView, name: &str| -> Option<String> {
            let submitted = &feedback.submitted;
            let resubmitted = row.editing
                && submitted.get("type").map(String::as_str) == Some("word.update")
                && submitted.get("fromId") == Some(&row.from_id);
            resubmitted.then(|| submitted.get(name).cloned()).flatten()
        };

        let rows = sheet
            .translation_groups
            .iter()
            .map(|group| {
                let target = EditTarget::Row(group.id);
                let from = group.word_in(&sheet.from_language);
                let to = group.word_in(&sheet.to_language);
                let mut row = RowView {
                    group_id: group.id.to_string(),
                    from_id: from.map(|w| w.id.to_string()).unwrap_or_default(),
                    from_text: from.map(|w| w.content.clone()).unwrap_or_default(),
                    to_id: to.map(|w| w.id.to_string()).unwrap_or_default(),
                    to_text: to.map(|w| w.content.clone()).unwrap_or_default(),
                    tags: group.tags.clone(),
                    complete: from.is_some() && to.is_some(),
                    editing: location.is_editing(target),
                    edit_href: location.begin_edit(target).href(&path),
                    cancel_href: location.end_edit(target).href(&path),
                };
                if let Some(text) = rewritten(&row, "from") {
                    row.from_text = text;
                }
                if let Some(text) = rewritten(&row, "to") {
                    row.to_text = text;
                }
                row
            })
            .collect();

        let current = location.sort();
        let sort_links = SortDirection::ALL
            .into_iter()
            .map(|direction| SortLink {
                label: direction.as_str(),
                href: location.with("sort", direction.as_str()).href(&path),
                active: direction == current,
            })
            .collect();

        Self {
            nav_user,
            title: display_title(&sheet.title),
            updated: time_ago(sheet.updated_at),
            points: sheet.points,
            from_language: sheet.from_language.clone(),
            to_language: sheet.to_language.clone(),
            owner,
            action_url: location.href(&path),
            export_url: location.href(&format!("{path}/export")),
            rows,
            fields,
            sort_links,
            lookup_word: feedback.lookup_word,
            suggestions: feedback.suggestions,
            error: feedback.error,
        }
    }
}

// -- Errors --

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub nav_user: Option<String>,
    pub status: u16,
    pub message: String,
}
