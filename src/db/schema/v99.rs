//! Gate 99: the structural restructure.
//!
//! Brings any supported legacy layout (65..98) to the version-99 table
//! set. Every entity table except `fields` is rebuilt through a staging
//! copy; `fields` only gains its checksum column (backfilled by gate 100,
//! once the new index exists to make it worthwhile).
//!
//! Phase 1 (pre-SQL): adds `chksum` to `fields`.
//! Phase 2 (Rust code): rebuilds cards/tags/facts/media, folds the legacy
//! `decks` + `deckVars` settings into the new single-row `deck` table, and
//! rebuilds `models` with a default configuration block.

use log::info;
use rusqlite::Connection;
use serde_json::{json, Value};

use super::base;
use crate::db::migration::rebuild::{
    rebuild_table, stage_table, staging_name, ColumnMap, RowProjection, TableRebuild,
};
use crate::error::DeckDbError;
use crate::settings;
use crate::tags;

pub const UPGRADE_TO_99_PRE_SQL: &str = r#"
-- Fields gain a content checksum; values are backfilled by gate 100.
ALTER TABLE fields ADD COLUMN chksum TEXT NOT NULL DEFAULT '';
"#;

/// Cards: the fact→model hop is flattened into a denormalized modelId,
/// relativeDelay becomes queue, and the new edit counter / flags / data
/// columns start at their defaults.
const CARDS_REBUILD: TableRebuild = TableRebuild {
    table: "cards",
    new_ddl: base::CARDS_DDL,
    projection: RowProjection {
        columns: &[
            ColumnMap { column: "id", expr: "id" },
            ColumnMap { column: "factId", expr: "factId" },
            ColumnMap {
                column: "modelId",
                expr: "ifnull((SELECT modelId FROM facts WHERE facts.id = cards_old.factId), 0)",
            },
            ColumnMap { column: "cardModelId", expr: "cardModelId" },
            ColumnMap { column: "created", expr: "created" },
            ColumnMap { column: "modified", expr: "modified" },
            ColumnMap { column: "question", expr: "ifnull(question, '')" },
            ColumnMap { column: "answer", expr: "ifnull(answer, '')" },
            ColumnMap { column: "ordinal", expr: "ifnull(ordinal, 0)" },
            ColumnMap { column: "edits", expr: "0" },
            ColumnMap { column: "queue", expr: "ifnull(relativeDelay, 0)" },
            ColumnMap { column: "type", expr: "ifnull(type, 2)" },
            ColumnMap { column: "due", expr: "ifnull(due, 0)" },
            ColumnMap { column: "interval", expr: "ifnull(interval, 0)" },
            ColumnMap { column: "factor", expr: "ifnull(factor, 2.5)" },
            ColumnMap { column: "reps", expr: "ifnull(reps, 0)" },
            ColumnMap { column: "streak", expr: "ifnull(successive, 0)" },
            ColumnMap { column: "lapses", expr: "ifnull(noCount, 0)" },
            ColumnMap { column: "flags", expr: "0" },
            ColumnMap { column: "data", expr: "''" },
        ],
        dedup: false,
    },
};

/// Facts: spaceUntil is repurposed as the render cache. Deduplicated on
/// id, matching the historical upgrade which tolerated duplicate rows in
/// damaged decks.
const FACTS_REBUILD: TableRebuild = TableRebuild {
    table: "facts",
    new_ddl: base::FACTS_DDL,
    projection: RowProjection {
        columns: &[
            ColumnMap { column: "id", expr: "id" },
            ColumnMap { column: "modelId", expr: "modelId" },
            ColumnMap { column: "created", expr: "created" },
            ColumnMap { column: "modified", expr: "modified" },
            ColumnMap { column: "tags", expr: "ifnull(tags, '')" },
            ColumnMap { column: "cache", expr: "ifnull(spaceUntil, '')" },
        ],
        dedup: true,
    },
};

const MEDIA_REBUILD: TableRebuild = TableRebuild {
    table: "media",
    new_ddl: base::MEDIA_DDL,
    projection: RowProjection {
        columns: &[
            ColumnMap { column: "id", expr: "id" },
            ColumnMap { column: "filename", expr: "filename" },
            ColumnMap { column: "size", expr: "ifnull(size, 0)" },
            ColumnMap { column: "created", expr: "created" },
            ColumnMap { column: "originalPath", expr: "ifnull(originalPath, '')" },
            ColumnMap { column: "chksum", expr: "''" },
        ],
        dedup: true,
    },
};

const MODELS_REBUILD: TableRebuild = TableRebuild {
    table: "models",
    new_ddl: base::MODELS_DDL,
    projection: RowProjection {
        columns: &[
            ColumnMap { column: "id", expr: "id" },
            ColumnMap { column: "created", expr: "created" },
            ColumnMap { column: "modified", expr: "modified" },
            ColumnMap { column: "name", expr: "ifnull(name, '')" },
            ColumnMap { column: "config", expr: "''" },
        ],
        dedup: true,
    },
};

/// Configuration block written to every migrated model. Legacy models had
/// no per-model configuration at all, so every field starts at its
/// default.
fn default_model_config() -> Value {
    json!({
        "cardOrder": 0,
        "typeAnswer": false,
        "genBackwards": false,
    })
}

pub fn migrate_to_99(conn: &Connection) -> Result<(), DeckDbError> {
    info!("Gate 99: rebuilding cards");
    rebuild_table(conn, &CARDS_REBUILD)?;

    // Tag tables are re-bootstrapped rather than rebuilt: stage both, let
    // the tags collaborator create the canonical layout, then copy the
    // staged rows back (deduplicating interned tags).
    info!("Gate 99: rebuilding tags");
    stage_table(conn, "tags")?;
    stage_table(conn, "cardTags")?;
    tags::init_tag_tables(conn)?;
    conn.execute_batch(&format!(
        "INSERT OR IGNORE INTO tags SELECT id, tag, 0 FROM {tags_old};
         INSERT OR IGNORE INTO cardTags SELECT cardId, tagId, src FROM {card_tags_old};
         DROP TABLE {tags_old};
         DROP TABLE {card_tags_old};",
        tags_old = staging_name("tags"),
        card_tags_old = staging_name("cardTags"),
    ))?;

    info!("Gate 99: rebuilding facts");
    rebuild_table(conn, &FACTS_REBUILD)?;

    info!("Gate 99: rebuilding media");
    rebuild_table(conn, &MEDIA_REBUILD)?;

    info!("Gate 99: migrating deck settings");
    migrate_deck(conn)?;

    info!("Gate 99: rebuilding models");
    rebuild_table(conn, &MODELS_REBUILD)?;
    let config = serde_json::to_string(&default_model_config())
        .map_err(|e| DeckDbError::Error(format!("Failed to serialize model config: {e}")))?;
    conn.execute("UPDATE models SET config = ?1", rusqlite::params![config])?;

    Ok(())
}

/// Replace the legacy `decks` table with the single-row `deck` table and
/// consolidate the scattered settings into its structured blocks. The
/// version column is written as 99 here; the orchestrator advances it to
/// the target as the final statement of the run.
fn migrate_deck(conn: &Connection) -> Result<(), DeckDbError> {
    conn.execute_batch(base::DECK_DDL)?;
    conn.execute(
        "INSERT INTO deck (id, created, modified, schemaMod, version,
                           syncName, lastSync, utcOffset, limits, config, data)
         SELECT id, created, modified, 0, 99,
                ifnull(syncName, ''), ifnull(lastSync, 0), ifnull(utcOffset, 0),
                '', '', ''
         FROM decks",
        [],
    )?;
    settings::migrate_legacy_settings(conn)
}
