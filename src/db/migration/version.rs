//! Reading the schema version marker.
//!
//! The marker moved homes during the schema's history: current decks keep
//! it on the single-row `deck` table, older decks on the legacy `decks`
//! table. Only a missing table triggers the fallback; any other failure —
//! including a bootstrap table that exists but holds no row — is surfaced
//! rather than papered over.

use rusqlite::types::FromSql;
use rusqlite::Connection;

use crate::error::DeckDbError;

/// Bootstrap locations for the version marker, canonical location first.
const BOOTSTRAP_TABLES: &[&str] = &["deck", "decks"];

/// Read the deck's schema version, whichever bootstrap location holds it.
pub fn read_version(conn: &Connection) -> Result<i64, DeckDbError> {
    bootstrap_scalar(conn, "version")
}

/// Read the deck's modification timestamp from the bootstrap row. Used by
/// the orchestrator's postcondition check: an upgrade must not disturb it.
pub(super) fn read_modified(conn: &Connection) -> Result<f64, DeckDbError> {
    bootstrap_scalar(conn, "modified")
}

fn bootstrap_scalar<T: FromSql>(conn: &Connection, column: &str) -> Result<T, DeckDbError> {
    for table in BOOTSTRAP_TABLES {
        match scalar(conn, table, column)? {
            Some(value) => return Ok(value),
            None => continue,
        }
    }
    Err(DeckDbError::UnreadableVersion)
}

/// Scalar read from one bootstrap location. `Ok(None)` means the table
/// does not exist (the one condition that permits falling back); an empty
/// table is a corrupt marker, not a fallback trigger.
fn scalar<T: FromSql>(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<Option<T>, DeckDbError> {
    match conn.query_row(&format!("SELECT {column} FROM {table} LIMIT 1"), [], |row| {
        row.get(0)
    }) {
        Ok(value) => Ok(Some(value)),
        Err(ref e) if is_missing_table(e) => Ok(None),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DeckDbError::UnreadableVersion),
        Err(e) => Err(e.into()),
    }
}

fn is_missing_table(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_canonical_location() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE deck (version INTEGER, modified REAL); INSERT INTO deck VALUES (100, 5.0);")
            .unwrap();
        assert_eq!(read_version(&conn).unwrap(), 100);
    }

    #[test]
    fn test_falls_back_to_legacy_location() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE decks (version INTEGER); INSERT INTO decks VALUES (72);")
            .unwrap();
        assert_eq!(read_version(&conn).unwrap(), 72);
    }

    #[test]
    fn test_canonical_location_wins_over_legacy() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE deck (version INTEGER); INSERT INTO deck VALUES (100);
             CREATE TABLE decks (version INTEGER); INSERT INTO decks VALUES (65);",
        )
        .unwrap();
        assert_eq!(read_version(&conn).unwrap(), 100);
    }

    #[test]
    fn test_neither_location_is_unreadable() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            read_version(&conn),
            Err(DeckDbError::UnreadableVersion)
        ));
    }

    #[test]
    fn test_empty_bootstrap_table_is_unreadable_not_fallback() {
        let conn = Connection::open_in_memory().unwrap();
        // deck exists but holds no row; decks would answer, but an empty
        // canonical table means corruption and must not be masked
        conn.execute_batch(
            "CREATE TABLE deck (version INTEGER);
             CREATE TABLE decks (version INTEGER); INSERT INTO decks VALUES (65);",
        )
        .unwrap();
        assert!(matches!(
            read_version(&conn),
            Err(DeckDbError::UnreadableVersion)
        ));
    }
}
