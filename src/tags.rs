use rusqlite::Connection;

use crate::error::DeckDbError;

/// Canonical tag table layout. Tags are interned once in `tags` and joined
/// to cards through `cardTags`; `src` records whether the association came
/// from the fact, the model, or the card itself.
pub const TAGS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    tag TEXT NOT NULL UNIQUE,
    priority INTEGER NOT NULL DEFAULT 0
);
"#;

pub const CARD_TAGS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS cardTags (
    cardId INTEGER NOT NULL,
    tagId INTEGER NOT NULL,
    src INTEGER NOT NULL,
    PRIMARY KEY (cardId, tagId)
);
"#;

/// Create empty tag tables if they don't already exist.
///
/// Shared between fresh deck creation and the schema upgrade, which drops
/// the legacy tag tables and repopulates these from staged copies.
pub fn init_tag_tables(conn: &Connection) -> Result<(), DeckDbError> {
    conn.execute_batch(TAGS_DDL)?;
    conn.execute_batch(CARD_TAGS_DDL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tag_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_tag_tables(&conn).unwrap();
        conn.execute("INSERT INTO tags (id, tag) VALUES (1, 'verb')", [])
            .unwrap();
        // A second call must not error or clobber existing rows
        init_tag_tables(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
