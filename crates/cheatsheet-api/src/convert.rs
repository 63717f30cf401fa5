//! Row → domain conversions. Corrupt values are logged and replaced with
//! defaults instead of failing the whole page.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use cheatsheet_db::models::{GroupTagRow, SheetRow, SheetSummaryRow, WordRow};
use cheatsheet_types::models::{Sheet, SheetSummary, TranslationGroup, Word};

pub fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

/// Assembles a sheet from its row, its group ids in sheet order, and the
/// words and tags of those groups.
pub fn sheet_from_rows(
    row: SheetRow,
    group_ids: Vec<String>,
    words: Vec<WordRow>,
    tags: Vec<GroupTagRow>,
) -> Sheet {
    let mut words_by_group: HashMap<String, Vec<Word>> = HashMap::new();
    for w in words {
        let word = Word {
            id: parse_id(&w.id, "word"),
            content: w.content,
            language: w.language,
            translation_group_id: parse_id(&w.translation_group_id, "translation group"),
        };
        words_by_group.entry(w.translation_group_id).or_default().push(word);
    }

    let mut tags_by_group: HashMap<String, Vec<String>> = HashMap::new();
    for t in tags {
        tags_by_group.entry(t.translation_group_id).or_default().push(t.tag);
    }

    let translation_groups = group_ids
        .into_iter()
        .map(|id| TranslationGroup {
            words: words_by_group.remove(&id).unwrap_or_default(),
            tags: tags_by_group.remove(&id).unwrap_or_default(),
            id: parse_id(&id, "translation group"),
        })
        .collect();

    Sheet {
        id: parse_id(&row.id, "sheet"),
        title: row.title,
        points: row.points,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
        owner_id: parse_id(&row.created_by, "user"),
        from_language: row.from_language,
        to_language: row.to_language,
        translation_separator: row.translation_separator,
        group_separator: row.group_separator,
        translation_groups,
    }
}

pub fn summary_from_row(row: SheetSummaryRow) -> SheetSummary {
    SheetSummary {
        id: parse_id(&row.id, "sheet"),
        title: row.title,
        points: row.points,
        updated_at: parse_timestamp(&row.updated_at),
        word_count: usize::try_from(row.word_count).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_timestamps() {
        let ts = parse_timestamp("2022-03-01 12:30:05");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2022, 3, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 30, 5));
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        assert_eq!(parse_id("nope", "sheet"), Uuid::default());
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
    }

    #[test]
    fn groups_keep_sheet_order() {
        let first = Uuid::new_v4().to_string();
        let second = Uuid::new_v4().to_string();
        let row = SheetRow {
            id: Uuid::new_v4().to_string(),
            title: "Animals".into(),
            points: 3,
            created_at: "2022-03-01 12:30:05".into(),
            updated_at: "2022-03-02 12:30:05".into(),
            created_by: Uuid::new_v4().to_string(),
            from_language: "polish".into(),
            to_language: "english".into(),
            translation_separator: " - ".into(),
            group_separator: "; ".into(),
        };
        let words = vec![
            WordRow {
                id: Uuid::new_v4().to_string(),
                content: "kot".into(),
                language: "polish".into(),
                translation_group_id: second.clone(),
            },
            WordRow {
                id: Uuid::new_v4().to_string(),
                content: "pies".into(),
                language: "polish".into(),
                translation_group_id: first.clone(),
            },
        ];
        let tags = vec![GroupTagRow {
            translation_group_id: first.clone(),
            tag: "animals".into(),
        }];

        let sheet = sheet_from_rows(row, vec![first.clone(), second.clone()], words, tags);
        assert_eq!(sheet.translation_groups.len(), 2);
        assert_eq!(sheet.translation_groups[0].id.to_string(), first);
        assert_eq!(sheet.translation_groups[0].tags, vec!["animals".to_string()]);
        assert_eq!(sheet.translation_groups[1].words[0].content, "kot");
    }
}
