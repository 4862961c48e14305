//! Generic table rebuild primitive.
//!
//! SQLite cannot reshape a table in place, so a layout change means: stage
//! the old rows under a temporary name, drop the original, create the new
//! layout under the original name, and copy the staged rows back through a
//! declarative row projection. The staging table is a transient artifact —
//! it never survives a successful rebuild, and the surrounding transaction
//! discards it on failure.
//!
//! The staging DDL is generated from the table's column list (via
//! `PRAGMA table_info`) rather than by rewriting the stored creation
//! statement, so no fragile string substitution is involved.

use log::info;
use rusqlite::Connection;

use crate::error::DeckDbError;

/// One target column of a projection: the column name in the new layout
/// and the SQL expression that produces it, evaluated against the staging
/// table. Expressions may reference the staging copy as `<table>_old`.
pub struct ColumnMap {
    pub column: &'static str,
    pub expr: &'static str,
}

/// Column-level mapping applied when copying staged rows into the new
/// layout. With `dedup` set the copy uses `INSERT OR IGNORE`, so rows that
/// collide on a unique constraint are intentionally filtered.
pub struct RowProjection {
    pub columns: &'static [ColumnMap],
    pub dedup: bool,
}

/// A complete rebuild description for one table.
pub struct TableRebuild {
    pub table: &'static str,
    pub new_ddl: &'static str,
    pub projection: RowProjection,
}

/// Name of the transient staging copy for `table`.
pub fn staging_name(table: &str) -> String {
    format!("{table}_old")
}

/// Copy `table` verbatim into its staging copy and drop the original,
/// freeing the canonical name. The staging table mirrors the original's
/// column list but carries none of its constraints; it only ever holds an
/// exact row copy.
pub fn stage_table(conn: &Connection, table: &str) -> Result<(), DeckDbError> {
    let staging = staging_name(table);
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(DeckDbError::Error(format!(
            "cannot stage {table}: table not found"
        )));
    }
    conn.execute_batch(&format!(
        "CREATE TABLE {staging} ({});
         INSERT INTO {staging} SELECT * FROM {table};
         DROP TABLE {table};",
        columns.join(", ")
    ))?;
    Ok(())
}

/// Rebuild `table` into a new layout, applying the projection to every
/// staged row exactly once. All-or-nothing at the statement-sequence
/// level: any failure propagates and the caller's transaction rolls the
/// half-built state back.
pub fn rebuild_table(conn: &Connection, rebuild: &TableRebuild) -> Result<(), DeckDbError> {
    let table = rebuild.table;
    let staging = staging_name(table);

    stage_table(conn, table)?;
    conn.execute_batch(rebuild.new_ddl)?;

    let column_list = rebuild
        .projection
        .columns
        .iter()
        .map(|m| m.column)
        .collect::<Vec<_>>()
        .join(", ");
    let select_list = rebuild
        .projection
        .columns
        .iter()
        .map(|m| m.expr)
        .collect::<Vec<_>>()
        .join(", ");
    let verb = if rebuild.projection.dedup {
        "INSERT OR IGNORE"
    } else {
        "INSERT"
    };
    let copied = conn.execute(
        &format!("{verb} INTO {table} ({column_list}) SELECT {select_list} FROM {staging}"),
        [],
    )?;
    info!("Rebuilt {table}: {copied} rows copied");

    conn.execute_batch(&format!("DROP TABLE {staging}"))?;
    Ok(())
}
