use std::path::Path;

use chrono::Utc;
use log::info;
use rusqlite::{params, Connection};

use crate::error::DeckDbError;
use crate::settings::Consolidated;
use crate::tags;

pub mod migration;
pub mod schema;

/// Handle to an open deck database.
///
/// Opening a path that holds no tables creates a fresh deck at the current
/// schema version. Opening an existing file leaves it untouched — deciding
/// whether to run the schema upgrade is the caller's job (see
/// [`migration::upgrade`]).
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self, DeckDbError> {
        let conn = Connection::open(db_path)?;
        let db = Self { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DeckDbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    /// Wrap an already-open connection. No schema check is performed; used
    /// by callers (and tests) that manage the schema lifecycle themselves.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    fn ensure_schema(&self) -> Result<(), DeckDbError> {
        let table_count: i64 = self.conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table'",
            [],
            |row| row.get(0),
        )?;
        if table_count == 0 {
            self.create_schema()?;
        }
        Ok(())
    }

    fn create_schema(&self) -> Result<(), DeckDbError> {
        info!("Creating deck schema at version {}", schema::DECK_VERSION);
        for ddl in schema::base::TABLE_DDLS {
            self.conn.execute_batch(ddl)?;
        }
        tags::init_tag_tables(&self.conn)?;

        let now = Utc::now().timestamp() as f64;
        let (limits, config, data) = Consolidated::default().to_json()?;
        self.conn.execute(
            "INSERT INTO deck (id, created, modified, schemaMod, version,
                               syncName, lastSync, utcOffset, limits, config, data)
             VALUES (1, ?1, ?1, ?1, ?2, '', 0, 0, ?3, ?4, ?5)",
            params![now, schema::DECK_VERSION, limits, config, data],
        )?;

        schema::catalog::reconcile(&self.conn)
    }

    /// Reclaim free pages and refresh the query planner's statistics.
    /// VACUUM is atomic from SQLite's perspective and cannot run inside a
    /// transaction, so this is invoked after the upgrade commits.
    pub fn compact(&self) -> Result<(), DeckDbError> {
        self.conn.execute_batch("VACUUM")?;
        self.conn.execute_batch("ANALYZE")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migration::version::read_version;

    #[test]
    fn test_fresh_database_is_created_at_current_version() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(read_version(db.conn()).unwrap(), schema::DECK_VERSION);
        // The deck singleton must exist with serialized settings blocks
        let config: String = db
            .conn()
            .query_row("SELECT config FROM deck", [], |row| row.get(0))
            .unwrap();
        assert!(config.contains("newCardOrder"));
    }

    #[test]
    fn test_open_existing_file_does_not_touch_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE decks (version INTEGER); INSERT INTO decks VALUES (65);")
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        // Still the legacy layout: no deck table was created
        assert_eq!(read_version(db.conn()).unwrap(), 65);
    }

    #[test]
    fn test_compact_runs_on_fresh_database() {
        let db = Database::open_in_memory().unwrap();
        db.compact().unwrap();
    }
}
