//! Consolidation of legacy free-form deck settings into the structured
//! configuration blocks stored on the `deck` row.
//!
//! Historical decks kept their settings in two places: a handful of typed
//! columns on the `decks` table, and an open-ended `deckVars` key/value
//! table. The current layout stores three JSON blocks instead:
//!
//! - `limits`: the selective-study filters, a fixed set of fields
//! - `config`: scheduling configuration; also the catch-all for any legacy
//!   key this version doesn't recognize
//! - `data`: derived cache artifacts that are not user configuration
//!
//! Every legacy key lands in exactly one of the three blocks; nothing is
//! silently dropped.

use std::collections::BTreeMap;

use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeckDbError;

/// Keys routed to the `limits` block, with their canonical field names.
pub const LIMIT_KEYS: &[&str] = &["newActive", "newInactive", "revActive", "revInactive"];

/// Legacy `decks` columns routed to the `config` block.
pub const CONFIG_KEYS: &[&str] = &[
    "newCardOrder",
    "newCardSpacing",
    "newCardsPerDay",
    "revCardOrder",
    "sessionRepLimit",
    "sessionTimeLimit",
];

/// Opaque cache artifacts routed to the `data` block. These are derived
/// values, not configuration, and must not pollute `config`.
pub const DATA_KEYS: &[&str] = &["hexCache", "cssCache"];

/// Selective-study limits. The fields are tag filter expressions; empty
/// means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub new_active: String,
    pub new_inactive: String,
    pub rev_active: String,
    pub rev_inactive: String,
}

impl Limits {
    fn set(&mut self, key: &str, value: Value) {
        let value = value_to_string(value);
        match key {
            "newActive" => self.new_active = value,
            "newInactive" => self.new_inactive = value,
            "revActive" => self.rev_active = value,
            "revInactive" => self.rev_inactive = value,
            _ => unreachable!("key {key} is not a limits key"),
        }
    }
}

/// Scheduling configuration. Recognized legacy keys become typed fields;
/// anything else a legacy deck carried rides along in `extra` so it
/// survives the upgrade verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckConfig {
    pub new_card_order: i64,
    pub new_card_spacing: i64,
    pub new_cards_per_day: i64,
    pub rev_card_order: i64,
    pub session_rep_limit: i64,
    pub session_time_limit: i64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            new_card_order: 1,
            new_card_spacing: 0,
            new_cards_per_day: 20,
            rev_card_order: 0,
            session_rep_limit: 0,
            session_time_limit: 600,
            extra: BTreeMap::new(),
        }
    }
}

impl DeckConfig {
    fn set_known(&mut self, key: &str, value: Value) {
        match key {
            "newCardOrder" => self.new_card_order = value_to_i64(value, 1),
            "newCardSpacing" => self.new_card_spacing = value_to_i64(value, 0),
            "newCardsPerDay" => self.new_cards_per_day = value_to_i64(value, 20),
            "revCardOrder" => self.rev_card_order = value_to_i64(value, 0),
            "sessionRepLimit" => self.session_rep_limit = value_to_i64(value, 0),
            "sessionTimeLimit" => self.session_time_limit = value_to_i64(value, 600),
            _ => unreachable!("key {key} is not a recognized config key"),
        }
    }
}

/// The result of consolidating a flat legacy settings mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consolidated {
    pub limits: Limits,
    pub config: DeckConfig,
    pub data: BTreeMap<String, Value>,
}

impl Consolidated {
    /// Serialize the three blocks for storage in the `deck` row.
    pub fn to_json(&self) -> Result<(String, String, String), DeckDbError> {
        let limits = serde_json::to_string(&self.limits)
            .map_err(|e| DeckDbError::Error(format!("Failed to serialize limits: {e}")))?;
        let config = serde_json::to_string(&self.config)
            .map_err(|e| DeckDbError::Error(format!("Failed to serialize config: {e}")))?;
        let data = serde_json::to_string(&self.data)
            .map_err(|e| DeckDbError::Error(format!("Failed to serialize data: {e}")))?;
        Ok((limits, config, data))
    }
}

/// Partition a flat legacy settings mapping into the three structured
/// blocks. Absent or null recognized keys keep their documented defaults;
/// a passthrough key is carried even when its value is null, so no key is
/// ever dropped.
///
/// Routing, checked in order: limits keys → `limits`; recognized config
/// keys → `config`; opaque cache keys → `data`; everything else → `config`
/// as a passthrough extra field.
pub fn consolidate(flat: BTreeMap<String, Value>) -> Consolidated {
    let mut out = Consolidated::default();
    for (key, value) in flat {
        if LIMIT_KEYS.contains(&key.as_str()) {
            if !value.is_null() {
                out.limits.set(&key, value);
            }
        } else if CONFIG_KEYS.contains(&key.as_str()) {
            if !value.is_null() {
                out.config.set_known(&key, value);
            }
        } else if DATA_KEYS.contains(&key.as_str()) {
            out.data.insert(key, value);
        } else {
            out.config.extra.insert(key, value);
        }
    }
    out
}

/// Fold the legacy `decks` columns and `deckVars` rows into the structured
/// blocks on the (already populated) `deck` row, then drop the legacy
/// tables.
///
/// Expects the new `deck` table to exist with its single row in place and
/// the legacy `decks`/`deckVars` tables to still be present.
pub fn migrate_legacy_settings(conn: &Connection) -> Result<(), DeckDbError> {
    let mut flat = BTreeMap::new();

    // Settings columns on the legacy decks table. SQLite columns are
    // dynamically typed, so read whatever is stored and let consolidation
    // coerce it; read errors propagate.
    conn.query_row(
        &format!("SELECT {} FROM decks", CONFIG_KEYS.join(", ")),
        [],
        |row| {
            for (idx, key) in CONFIG_KEYS.iter().enumerate() {
                let value = row.get::<_, rusqlite::types::Value>(idx)?;
                flat.insert((*key).to_string(), sql_to_json(value));
            }
            Ok(())
        },
    )?;

    // Free-form deckVars rows, including the selective-study limits
    let mut stmt = conn.prepare("SELECT key, value FROM deckVars")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;
    for row in rows {
        let (key, value) = row?;
        let value = value.map_or(Value::Null, Value::String);
        flat.insert(key, value);
    }

    info!("Consolidating {} legacy deck settings", flat.len());
    let consolidated = consolidate(flat);
    let (limits, config, data) = consolidated.to_json()?;
    conn.execute(
        "UPDATE deck SET limits = ?1, config = ?2, data = ?3",
        rusqlite::params![limits, config, data],
    )?;

    conn.execute("DROP TABLE decks", [])?;
    conn.execute("DROP TABLE deckVars", [])?;
    Ok(())
}

fn sql_to_json(value: rusqlite::types::Value) -> Value {
    use rusqlite::types::Value as SqlValue;
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Value::from(f),
        SqlValue::Text(s) => Value::String(s),
        // Settings columns never hold blobs; treat one as absent
        SqlValue::Blob(_) => Value::Null,
    }
}

fn value_to_i64(value: Value, default: i64) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Value::String(s) => s.trim().parse().unwrap_or(default),
        Value::Bool(b) => i64::from(b),
        _ => default,
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
