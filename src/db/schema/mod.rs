pub mod base;
pub mod catalog;
mod v100;
mod v99;

use rusqlite::Connection;

use crate::error::DeckDbError;

/// The schema version this engine upgrades to.
pub const DECK_VERSION: i64 = 100;

/// Oldest version the upgrade engine can bridge. Decks below this need a
/// legacy tool; refusing them is fatal and happens before any mutation.
pub const MIN_SUPPORTED_VERSION: i64 = 65;

/// Function type for gate code that transforms data during schema upgrades.
pub type GateFn = fn(&Connection) -> Result<(), DeckDbError>;

/// A version gate: the fixed bundle of steps that brings any deck below
/// `version` up to exactly `version`, in 3 phases:
/// - pre_sql: SQL batch to run before Rust code (optional)
/// - code_fn: Rust function for complex transformations (optional)
/// - post_sql: SQL batch to run after Rust code (optional)
pub struct Gate {
    pub version: i64,
    pub label: &'static str,
    pub pre_sql: Option<&'static str>,
    pub code_fn: Option<GateFn>,
    pub post_sql: Option<&'static str>,
}

/// All gates, in strictly ascending version order. The orchestrator runs
/// every gate whose version exceeds the deck's current version; adding a
/// new schema version means appending a descriptor here, not editing
/// control flow.
pub const GATES: &[Gate] = &[
    Gate {
        version: 99,
        label: "Restructuring deck tables",
        pre_sql: Some(v99::UPGRADE_TO_99_PRE_SQL),
        code_fn: Some(v99::migrate_to_99),
        post_sql: None,
    },
    Gate {
        version: 100,
        label: "Migrating review history and checksums",
        pre_sql: None,
        code_fn: Some(v100::migrate_to_100),
        post_sql: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gates_are_strictly_ascending() {
        for pair in GATES.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn test_last_gate_reaches_target() {
        assert_eq!(GATES.last().unwrap().version, DECK_VERSION);
    }
}
