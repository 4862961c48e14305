//! Index and view catalog reconciliation.
//!
//! The catalog is fully determined by the current table layout, so
//! reconciliation is declarative: drop everything in the obsolete set,
//! create everything in the canonical set. Both directions tolerate the
//! object already being in the desired state, so `reconcile` may be called
//! any number of times. All drops run before any create, which keeps an
//! old and new index that share a name from colliding.

use log::debug;
use rusqlite::Connection;

use crate::error::DeckDbError;

/// Indexes from retired layouts. The interval/due/random entries are the
/// old dynamic scheduling indexes, kept in both their plain and `2`-suffixed
/// spellings because either may exist depending on when the deck was last
/// written.
pub const OBSOLETE_INDEXES: &[&str] = &[
    "ix_cards_intervalDesc2",
    "ix_cards_intervalDesc",
    "ix_cards_intervalAsc2",
    "ix_cards_intervalAsc",
    "ix_cards_randomOrder2",
    "ix_cards_randomOrder",
    "ix_cards_dueAsc2",
    "ix_cards_dueAsc",
    "ix_cards_dueDesc2",
    "ix_cards_dueDesc",
    "ix_fields_value",
    "ix_fields_fieldModelId",
    "ix_cards_factor",
    "ix_cards_priority",
];

/// Views from the pre-queue scheduler.
pub const OBSOLETE_VIEWS: &[&str] = &[
    "failedCards",
    "revCardsOld",
    "revCardsNew",
    "revCardsDue",
    "revCardsRandom",
    "acqCardsRandom",
    "acqCardsOld",
    "acqCardsNew",
];

/// The canonical index set for the current layout: (name, indexed columns).
pub const CANONICAL_INDEXES: &[(&str, &str)] = &[
    // due counts, failed card queue
    ("ix_cards_queueDue", "cards (queue, due, factId)"),
    // counting cards of a given type
    ("ix_cards_type", "cards (type)"),
    // sync summaries
    ("ix_cards_modified", "cards (modified)"),
    ("ix_facts_modified", "facts (modified)"),
    // card spacing
    ("ix_cards_factId", "cards (factId)"),
    // fields
    ("ix_fields_factId", "fields (factId)"),
    ("ix_fields_chksum", "fields (chksum)"),
    // media
    ("ix_media_chksum", "media (chksum)"),
    // deletion tracking
    ("ix_cardsDeleted_cardId", "cardsDeleted (cardId)"),
    ("ix_modelsDeleted_modelId", "modelsDeleted (modelId)"),
    ("ix_factsDeleted_factId", "factsDeleted (factId)"),
    ("ix_mediaDeleted_mediaId", "mediaDeleted (mediaId)"),
    // tags
    ("ix_cardTags_cardId", "cardTags (cardId)"),
];

/// Bring the index/view catalog in line with the current layout.
pub fn reconcile(conn: &Connection) -> Result<(), DeckDbError> {
    for name in OBSOLETE_INDEXES {
        conn.execute_batch(&format!("DROP INDEX IF EXISTS {name}"))?;
    }
    for name in OBSOLETE_VIEWS {
        conn.execute_batch(&format!("DROP VIEW IF EXISTS {name}"))?;
    }
    for (name, columns) in CANONICAL_INDEXES {
        debug!("Ensuring index {name}");
        conn.execute_batch(&format!("CREATE INDEX IF NOT EXISTS {name} ON {columns}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn catalog_snapshot(conn: &Connection) -> Vec<(String, String)> {
        let mut stmt = conn
            .prepare(
                "SELECT type, name FROM sqlite_master
                 WHERE type IN ('index', 'view') AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        reconcile(db.conn()).unwrap();
        let first = catalog_snapshot(db.conn());
        // A second pass must neither fail nor change the catalog
        reconcile(db.conn()).unwrap();
        assert_eq!(first, catalog_snapshot(db.conn()));
    }

    #[test]
    fn test_reconcile_drops_obsolete_objects() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch(
                "CREATE INDEX ix_cards_priority ON cards (flags);
                 CREATE VIEW failedCards AS SELECT * FROM cards WHERE queue = -1;",
            )
            .unwrap();
        reconcile(db.conn()).unwrap();
        let names: Vec<String> = catalog_snapshot(db.conn())
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert!(!names.contains(&"ix_cards_priority".to_string()));
        assert!(!names.contains(&"failedCards".to_string()));
    }

    #[test]
    fn test_reconcile_creates_canonical_set() {
        let db = Database::open_in_memory().unwrap();
        reconcile(db.conn()).unwrap();
        for (name, _) in CANONICAL_INDEXES {
            let found: i64 = db
                .conn()
                .query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
                    [name],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "index {name} missing");
        }
    }
}
