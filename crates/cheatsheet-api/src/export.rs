use std::io::Cursor;

use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use docx_rs::{
    AlignmentType, BorderType, Docx, Paragraph, Run, RunFonts, Style, StyleType, Table, TableCell,
    TableCellBorder, TableCellBorderPosition, TableCellBorders, TableCellMargins, TableRow,
};
use tracing::info;

use cheatsheet_types::edit::SheetLocation;
use cheatsheet_types::models::Sheet;
use cheatsheet_types::sort::sort_groups;

use crate::error::AppError;
use crate::sheets::{load_sheet, parse_sheet_id};
use crate::state::{AppState, with_db};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Half-points, so 3.5pt.
const FONT_SIZE: usize = 7;
const FONT: &str = "Arial";
const COLUMNS: usize = 3;
const COLUMN_WIDTH: usize = 3000;
const STYLE_ID: &str = "cheat";
/// Twips.
const CELL_MARGIN: usize = 10;
/// Eighths of a point, so 0.5pt.
const BORDER_SIZE: usize = 4;

/// Downloads the sheet as a printable cheat sheet, in the order currently
/// selected on the page.
pub async fn export_sheet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let sheet_id = parse_sheet_id(&raw_id)?;
    let direction = SheetLocation::new(params).sort();

    let (name, bytes) = with_db(&state, move |db| {
        let mut sheet = load_sheet(db, sheet_id)?;
        sort_groups(&mut sheet.translation_groups, &sheet.from_language, direction)
            .map_err(anyhow::Error::from)?;
        Ok((file_name(&sheet.title), render_docx(&sheet)?))
    })
    .await?;

    info!("Exported sheet {} ({} bytes)", sheet_id, bytes.len());
    let disposition = format!("attachment; filename=\"{name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// One table row of identical justified cells, each holding every pair as
/// `from` (bold), separator, `to`, group separator.
pub fn render_docx(sheet: &Sheet) -> anyhow::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    build_document(sheet)
        .build()
        .pack(&mut buf)
        .map_err(|e| anyhow!("failed to pack docx: {e}"))?;
    Ok(buf.into_inner())
}

fn build_document(sheet: &Sheet) -> Docx {
    let pairs = sheet.pairs();
    let run = |text: &str| Run::new().add_text(text);

    let borders = [
        TableCellBorderPosition::Top,
        TableCellBorderPosition::Bottom,
        TableCellBorderPosition::Left,
        TableCellBorderPosition::Right,
    ]
    .into_iter()
    .fold(TableCellBorders::new(), |borders, position| {
        borders.set(
            TableCellBorder::new(position)
                .border_type(BorderType::Single)
                .size(BORDER_SIZE),
        )
    });

    let cell = || {
        let paragraph = pairs.iter().fold(
            Paragraph::new().style(STYLE_ID).align(AlignmentType::Both),
            |p, pair| {
                p.add_run(run(pair.from.as_str()).bold())
                    .add_run(run(sheet.translation_separator.as_str()))
                    .add_run(run(pair.to.as_str()))
                    .add_run(run(sheet.group_separator.as_str()))
            },
        );
        TableCell::new()
            .add_paragraph(paragraph)
            .set_borders(borders.clone())
    };

    let table = Table::new(vec![TableRow::new((0..COLUMNS).map(|_| cell()).collect())])
        .set_grid(vec![COLUMN_WIDTH; COLUMNS])
        .margins(TableCellMargins::new().margin(CELL_MARGIN, CELL_MARGIN, CELL_MARGIN, CELL_MARGIN));

    let style_name = if sheet.title.is_empty() {
        "Cheat text"
    } else {
        sheet.title.as_str()
    };
    let style = Style::new(STYLE_ID, StyleType::Paragraph)
        .name(style_name)
        .based_on("Normal")
        .size(FONT_SIZE)
        .fonts(RunFonts::new().ascii(FONT).hi_ansi(FONT));

    Docx::new().add_style(style).add_table(table)
}

/// `<title>.docx` with anything outside printable ASCII replaced, so the
/// name is safe inside a quoted header value.
pub fn file_name(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "sheet.docx".to_string()
    } else {
        format!("{cleaned}.docx")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cheatsheet_types::models::{TranslationGroup, Word};
    use uuid::Uuid;

    fn word(content: &str, language: &str, group: Uuid) -> Word {
        Word {
            id: Uuid::new_v4(),
            content: content.into(),
            language: language.into(),
            translation_group_id: group,
        }
    }

    fn sheet(title: &str) -> Sheet {
        let group = Uuid::new_v4();
        let now = Utc::now();
        Sheet {
            id: Uuid::new_v4(),
            title: title.into(),
            points: 0,
            created_at: now,
            updated_at: now,
            owner_id: Uuid::new_v4(),
            from_language: "polish".into(),
            to_language: "english".into(),
            translation_separator: " - ".into(),
            group_separator: "; ".into(),
            translation_groups: vec![TranslationGroup {
                id: group,
                tags: vec![],
                words: vec![word("pies", "polish", group), word("dog", "english", group)],
            }],
        }
    }

    #[test]
    fn produces_a_zip_package() {
        let bytes = render_docx(&sheet("Animals")).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn pairs_use_the_cheat_paragraph_style() {
        let json = build_document(&sheet("Animals")).json();
        assert!(json.contains("\"cheat\""));
        assert!(json.contains("\"Animals\""));
    }

    #[test]
    fn empty_sheet_still_exports() {
        let mut empty = sheet("");
        empty.translation_groups.clear();
        assert!(render_docx(&empty).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn file_name_falls_back_for_empty_title() {
        assert_eq!(file_name(""), "sheet.docx");
        assert_eq!(file_name("   "), "sheet.docx");
        assert_eq!(file_name("Animals"), "Animals.docx");
    }

    #[test]
    fn file_name_strips_header_breaking_characters() {
        assert_eq!(file_name("a\"b"), "a_b.docx");
        assert_eq!(file_name("Zwierzęta"), "Zwierz_ta.docx");
    }
}
