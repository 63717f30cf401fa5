use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE languages (
                id      TEXT PRIMARY KEY,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE sheets (
                id                      TEXT PRIMARY KEY,
                title                   TEXT NOT NULL DEFAULT '',
                points                  INTEGER NOT NULL DEFAULT 0,
                created_at              TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at              TEXT NOT NULL DEFAULT (datetime('now')),
                created_by              TEXT NOT NULL REFERENCES users(id),
                from_language_id        TEXT NOT NULL REFERENCES languages(id),
                to_language_id          TEXT NOT NULL REFERENCES languages(id),
                translation_separator   TEXT NOT NULL DEFAULT ' - ',
                group_separator         TEXT NOT NULL DEFAULT '; '
            );

            CREATE INDEX idx_sheets_owner ON sheets(created_by, updated_at);
            CREATE INDEX idx_sheets_points ON sheets(points);

            CREATE TABLE translation_groups (
                id          TEXT PRIMARY KEY,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE words (
                id                      TEXT PRIMARY KEY,
                content                 TEXT NOT NULL,
                language_id             TEXT NOT NULL REFERENCES languages(id),
                translation_group_id    TEXT NOT NULL REFERENCES translation_groups(id) ON DELETE CASCADE,
                UNIQUE(translation_group_id, language_id)
            );

            CREATE INDEX idx_words_language ON words(language_id, content);

            CREATE TABLE sheet_translation_groups (
                sheet_id                TEXT NOT NULL REFERENCES sheets(id) ON DELETE CASCADE,
                translation_group_id    TEXT NOT NULL REFERENCES translation_groups(id) ON DELETE CASCADE,
                position                INTEGER NOT NULL,
                PRIMARY KEY (sheet_id, translation_group_id)
            );

            CREATE TABLE tags (
                id      TEXT PRIMARY KEY,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE translation_group_tags (
                translation_group_id    TEXT NOT NULL REFERENCES translation_groups(id) ON DELETE CASCADE,
                tag_id                  TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (translation_group_id, tag_id)
            );

            -- Seed the reference languages
            INSERT INTO languages (id, name)
                VALUES ('00000000-0000-0000-0000-000000000001', 'polish');
            INSERT INTO languages (id, name)
                VALUES ('00000000-0000-0000-0000-000000000002', 'english');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
