//! Gate 100: review history, checksums, and queue cleanup.
//!
//! Runs entirely as Rust code (the revlog DDL is shared with the base
//! schema, so there is no standalone pre-SQL batch):
//!   - moves `reviewHistory` into the millisecond-resolution `revlog`,
//!     clamping thinking time to 60s and folding the old ease 0 into 1
//!   - drops the `stats` table (the revlog supersedes it)
//!   - collapses the old suspended/buried queue ranges into single values
//!   - backfills the `fields.chksum` column for every row
//!
//! Obsolete index/view drops are not handled here; the catalog
//! reconciliation at finalization owns them.

use log::info;
use rusqlite::Connection;

use super::base;
use crate::checksum::field_checksum;
use crate::error::DeckDbError;

const REVIEW_HISTORY_SQL: &str = r#"
INSERT OR IGNORE INTO revlog
SELECT CAST(time * 1000 AS INT), cardId, ease, reps,
       lastInterval, nextInterval, nextFactor,
       CAST(MIN(thinkingTime, 60) * 1000 AS INT), 0
FROM reviewHistory;
DROP TABLE reviewHistory;

-- The old scheduler used ease 0 for failures; the revlog starts at 1.
UPDATE revlog SET ease = 1 WHERE ease = 0;

-- All per-day statistics live in the revlog now.
DROP TABLE IF EXISTS stats;

-- Suspended and buried cards no longer use ranges.
UPDATE cards SET queue = -1 WHERE queue BETWEEN -3 AND -1;
UPDATE cards SET queue = -2 WHERE queue BETWEEN 3 AND 5;
UPDATE cards SET queue = -3 WHERE queue BETWEEN 6 AND 8;
"#;

pub fn migrate_to_100(conn: &Connection) -> Result<(), DeckDbError> {
    info!("Gate 100: migrating review history to revlog");
    conn.execute_batch(base::REVLOG_DDL)?;
    conn.execute_batch(REVIEW_HISTORY_SQL)?;

    info!("Gate 100: computing field checksums");
    let count = update_all_field_checksums(conn)?;
    info!("Gate 100: checksummed {count} fields");
    Ok(())
}

/// Recompute the checksum of every field from its current value. There is
/// no prior value to carry over — the column is brand new — so every row
/// is written exactly once.
fn update_all_field_checksums(conn: &Connection) -> Result<usize, DeckDbError> {
    let mut select = conn.prepare("SELECT id, value FROM fields")?;
    let mut update = conn.prepare("UPDATE fields SET chksum = ?1 WHERE id = ?2")?;

    let rows = select.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
    })?;
    let mut count = 0;
    for row in rows {
        let (id, value) = row?;
        let value = value.unwrap_or_default();
        update.execute(rusqlite::params![field_checksum(&value), id])?;
        count += 1;
    }
    Ok(count)
}
