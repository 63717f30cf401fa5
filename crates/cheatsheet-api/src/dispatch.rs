use tracing::debug;
use uuid::Uuid;

use cheatsheet_db::Database;
use cheatsheet_db::models::WriteOutcome;
use cheatsheet_types::action::{Action, MAX_SUGGESTIONS};

use crate::error::AppError;

/// Result of a dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Suggestions(Vec<String>),
}

/// Runs the single persistence operation behind `action` against `sheet_id`.
///
/// Callers are expected to have checked that the sheet exists and that the
/// user may change it.
pub fn dispatch(db: &Database, sheet_id: Uuid, action: Action) -> Result<Outcome, AppError> {
    let sheet = sheet_id.to_string();
    debug!(sheet_id = %sheet, action = action.type_name(), "Dispatching sheet action");

    match action {
        Action::TitleUpdate { title } => {
            found(db.update_sheet_title(&sheet, &title)?, &sheet)?;
        }
        Action::LanguagesUpdate { from, to } => {
            for (field, name) in [("from", &from), ("to", &to)] {
                if !db.language_exists(name)? {
                    return Err(AppError::UnknownLanguage {
                        field,
                        name: name.clone(),
                    });
                }
            }
            found(db.update_sheet_languages(&sheet, &from, &to)?, &sheet)?;
        }
        Action::SeparatorsUpdate {
            translation_separator,
            group_separator,
        } => {
            found(
                db.update_sheet_separators(&sheet, &translation_separator, &group_separator)?,
                &sheet,
            )?;
        }
        Action::WordAdd { from, to } => {
            db.add_word_pair(&sheet, &from, &to)?
                .ok_or_else(|| AppError::not_found("sheet", &sheet))?;
        }
        Action::WordUpdate {
            from,
            to,
            from_id,
            to_id,
        } => {
            let outcome = db.update_word_pair(
                &sheet,
                &from_id.to_string(),
                &from,
                &to_id.to_string(),
                &to,
            )?;
            written(outcome, "word")?;
        }
        Action::TranslationGroupDelete {
            translation_group_id,
        } => {
            let outcome = db.remove_translation_group(&sheet, &translation_group_id.to_string())?;
            written(outcome, "translation group")?;
        }
        Action::TranslationFind { word, from, to } => {
            let mut words = db.find_translations(&word, &from, &to, MAX_SUGGESTIONS)?;
            words.truncate(MAX_SUGGESTIONS);
            return Ok(Outcome::Suggestions(words));
        }
    }

    Ok(Outcome::Done)
}

fn found(updated: bool, sheet: &str) -> Result<(), AppError> {
    if updated {
        Ok(())
    } else {
        Err(AppError::not_found("sheet", sheet))
    }
}

fn written(outcome: WriteOutcome, entity: &'static str) -> Result<(), AppError> {
    match outcome {
        WriteOutcome::Done => Ok(()),
        WriteOutcome::RowMissing(id) => Err(AppError::not_found(entity, id)),
    }
}
