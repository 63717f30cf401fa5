use crate::models::{GroupTagRow, SheetRow, SheetSummaryRow, UserRow, WordRow, WriteOutcome};
use crate::Database;
use anyhow::{Result, bail};
use rusqlite::{Connection, Transaction};
use uuid::Uuid;

const SHEET_COLUMNS: &str = "s.id, s.title, s.points, s.created_at, s.updated_at, s.created_by,
     fl.name, tl.name, s.translation_separator, s.group_separator";

const SUMMARY_COLUMNS: &str = "s.id, s.title, s.points, s.updated_at,
     (SELECT COUNT(*) FROM sheet_translation_groups sg WHERE sg.sheet_id = s.id)";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    // -- Languages --

    pub fn language_names(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM languages ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(names)
        })
    }

    pub fn language_exists(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM languages WHERE name = ?1", [name], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Sheets --

    /// Creates an empty sheet owned by `owner_id`. Fails when either language is unknown.
    pub fn create_sheet(&self, id: &str, owner_id: &str, from: &str, to: &str) -> Result<()> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO sheets (id, created_by, from_language_id, to_language_id)
                 SELECT ?1, ?2, f.id, t.id
                 FROM languages f, languages t
                 WHERE f.name = ?3 AND t.name = ?4",
                (id, owner_id, from, to),
            )?;
            if inserted == 0 {
                bail!("Cannot create sheet: unknown language pair {} -> {}", from, to);
            }
            Ok(())
        })
    }

    pub fn get_sheet(&self, id: &str) -> Result<Option<SheetRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {SHEET_COLUMNS}
                 FROM sheets s
                 JOIN languages fl ON fl.id = s.from_language_id
                 JOIN languages tl ON tl.id = s.to_language_id
                 WHERE s.id = ?1"
            );
            let row = conn
                .query_row(&sql, [id], |row| {
                    Ok(SheetRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        points: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                        created_by: row.get(5)?,
                        from_language: row.get(6)?,
                        to_language: row.get(7)?,
                        translation_separator: row.get(8)?,
                        group_separator: row.get(9)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Group ids of a sheet, in the order they were added.
    pub fn get_sheet_group_ids(&self, sheet_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT translation_group_id FROM sheet_translation_groups
                 WHERE sheet_id = ?1
                 ORDER BY position",
            )?;
            let ids = stmt
                .query_map([sheet_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }

    /// Every word of every group attached to the sheet, in all languages.
    pub fn get_sheet_words(&self, sheet_id: &str) -> Result<Vec<WordRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT w.id, w.content, l.name, w.translation_group_id
                 FROM sheet_translation_groups sg
                 JOIN words w ON w.translation_group_id = sg.translation_group_id
                 JOIN languages l ON l.id = w.language_id
                 WHERE sg.sheet_id = ?1
                 ORDER BY sg.position",
            )?;
            let rows = stmt
                .query_map([sheet_id], |row| {
                    Ok(WordRow {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        language: row.get(2)?,
                        translation_group_id: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_sheet_tags(&self, sheet_id: &str) -> Result<Vec<GroupTagRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT gt.translation_group_id, t.name
                 FROM sheet_translation_groups sg
                 JOIN translation_group_tags gt ON gt.translation_group_id = sg.translation_group_id
                 JOIN tags t ON t.id = gt.tag_id
                 WHERE sg.sheet_id = ?1
                 ORDER BY t.name",
            )?;
            let rows = stmt
                .query_map([sheet_id], |row| {
                    Ok(GroupTagRow {
                        translation_group_id: row.get(0)?,
                        tag: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Most recently updated sheets of a user.
    pub fn recent_user_sheets(&self, owner_id: &str, limit: u32) -> Result<Vec<SheetSummaryRow>> {
        self.with_conn(|conn| {
            query_summaries(
                conn,
                "WHERE s.created_by = ?1 ORDER BY s.updated_at DESC LIMIT ?2",
                rusqlite::params![owner_id, limit],
            )
        })
    }

    /// All sheets of a user, least recently updated first.
    pub fn user_sheets(&self, owner_id: &str) -> Result<Vec<SheetSummaryRow>> {
        self.with_conn(|conn| {
            query_summaries(
                conn,
                "WHERE s.created_by = ?1 ORDER BY s.updated_at ASC",
                rusqlite::params![owner_id],
            )
        })
    }

    pub fn popular_sheets(&self, limit: u32) -> Result<Vec<SheetSummaryRow>> {
        self.with_conn(|conn| {
            query_summaries(
                conn,
                "ORDER BY s.points DESC, s.updated_at DESC LIMIT ?1",
                rusqlite::params![limit],
            )
        })
    }

    /// Returns false when the sheet does not exist.
    pub fn update_sheet_title(&self, id: &str, title: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE sheets SET title = ?2, updated_at = datetime('now') WHERE id = ?1",
                (id, title),
            )?;
            Ok(updated > 0)
        })
    }

    /// Languages are referenced by name; callers check that both exist first.
    pub fn update_sheet_languages(&self, id: &str, from: &str, to: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE sheets SET
                    from_language_id = (SELECT id FROM languages WHERE name = ?2),
                    to_language_id = (SELECT id FROM languages WHERE name = ?3),
                    updated_at = datetime('now')
                 WHERE id = ?1",
                (id, from, to),
            )?;
            Ok(updated > 0)
        })
    }

    pub fn update_sheet_separators(
        &self,
        id: &str,
        translation_separator: &str,
        group_separator: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE sheets SET
                    translation_separator = ?2,
                    group_separator = ?3,
                    updated_at = datetime('now')
                 WHERE id = ?1",
                (id, translation_separator, group_separator),
            )?;
            Ok(updated > 0)
        })
    }

    // -- Words & translation groups --

    /// Creates a group holding `from` and `to` in the sheet's languages and
    /// appends it to the sheet. Returns the new group id.
    pub fn add_word_pair(&self, sheet_id: &str, from: &str, to: &str) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let languages: Option<(String, String)> = tx
                .query_row(
                    "SELECT from_language_id, to_language_id FROM sheets WHERE id = ?1",
                    [sheet_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((from_language_id, to_language_id)) = languages else {
                return Ok(None);
            };

            let group_id = Uuid::new_v4().to_string();
            tx.execute("INSERT INTO translation_groups (id) VALUES (?1)", [&group_id])?;

            for (content, language_id) in [(from, &from_language_id), (to, &to_language_id)] {
                tx.execute(
                    "INSERT INTO words (id, content, language_id, translation_group_id)
                     VALUES (?1, ?2, ?3, ?4)",
                    (Uuid::new_v4().to_string(), content, language_id, &group_id),
                )?;
            }

            tx.execute(
                "INSERT INTO sheet_translation_groups (sheet_id, translation_group_id, position)
                 SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1
                 FROM sheet_translation_groups WHERE sheet_id = ?1",
                (sheet_id, &group_id),
            )?;
            touch_sheet(&tx, sheet_id)?;

            tx.commit()?;
            Ok(Some(group_id))
        })
    }

    /// Rewrites both words of a pair atomically. `from_id` must be the
    /// sheet's source-language word of a group attached to `sheet_id`, and
    /// `to_id` the target-language word of that same group; otherwise
    /// nothing is written.
    pub fn update_word_pair(
        &self,
        sheet_id: &str,
        from_id: &str,
        from: &str,
        to_id: &str,
        to: &str,
    ) -> Result<WriteOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let group_id: Option<String> = tx
                .query_row(
                    "SELECT w.translation_group_id
                     FROM words w
                     JOIN sheets s ON s.from_language_id = w.language_id
                     JOIN sheet_translation_groups sg
                       ON sg.sheet_id = s.id AND sg.translation_group_id = w.translation_group_id
                     WHERE s.id = ?1 AND w.id = ?2",
                    (sheet_id, from_id),
                    |row| row.get(0),
                )
                .optional()?;
            let Some(group_id) = group_id else {
                return Ok(WriteOutcome::RowMissing(from_id.to_string()));
            };

            let pairs_up = tx
                .query_row(
                    "SELECT 1
                     FROM words w
                     JOIN sheets s ON s.to_language_id = w.language_id
                     WHERE s.id = ?1 AND w.id = ?2 AND w.translation_group_id = ?3",
                    (sheet_id, to_id, &group_id),
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !pairs_up {
                return Ok(WriteOutcome::RowMissing(to_id.to_string()));
            }

            for (id, content) in [(from_id, from), (to_id, to)] {
                tx.execute("UPDATE words SET content = ?2 WHERE id = ?1", (id, content))?;
            }
            touch_sheet(&tx, sheet_id)?;

            tx.commit()?;
            Ok(WriteOutcome::Done)
        })
    }

    /// Detaches a group from a sheet. The group itself is deleted once no
    /// sheet references it.
    pub fn remove_translation_group(&self, sheet_id: &str, group_id: &str) -> Result<WriteOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let detached = tx.execute(
                "DELETE FROM sheet_translation_groups WHERE sheet_id = ?1 AND translation_group_id = ?2",
                (sheet_id, group_id),
            )?;
            if detached == 0 {
                return Ok(WriteOutcome::RowMissing(group_id.to_string()));
            }

            tx.execute(
                "DELETE FROM translation_groups
                 WHERE id = ?1
                 AND NOT EXISTS (SELECT 1 FROM sheet_translation_groups WHERE translation_group_id = ?1)",
                [group_id],
            )?;
            touch_sheet(&tx, sheet_id)?;

            tx.commit()?;
            Ok(WriteOutcome::Done)
        })
    }

    /// Target-language words of groups whose source-language word contains `word`.
    pub fn find_translations(
        &self,
        word: &str,
        from: &str,
        to: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.content
                 FROM words s
                 JOIN languages sl ON sl.id = s.language_id
                 JOIN words t ON t.translation_group_id = s.translation_group_id
                 JOIN languages tl ON tl.id = t.language_id
                 WHERE sl.name = ?2
                 AND tl.name = ?3
                 AND s.content LIKE '%' || ?1 || '%' ESCAPE '\\'
                 LIMIT ?4",
            )?;
            let words = stmt
                .query_map(
                    rusqlite::params![escape_like(word), from, to, limit as i64],
                    |row| row.get(0),
                )?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(words)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password_hash, created_at FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_summaries(
    conn: &Connection,
    clause: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<SheetSummaryRow>> {
    let sql = format!("SELECT {SUMMARY_COLUMNS} FROM sheets s {clause}");
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params, |row| {
            Ok(SheetSummaryRow {
                id: row.get(0)?,
                title: row.get(1)?,
                points: row.get(2)?,
                updated_at: row.get(3)?,
                word_count: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn touch_sheet(tx: &Transaction<'_>, sheet_id: &str) -> Result<()> {
    tx.execute(
        "UPDATE sheets SET updated_at = datetime('now') WHERE id = ?1",
        [sheet_id],
    )?;
    Ok(())
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
