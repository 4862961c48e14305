//! Target table layouts.
//!
//! Each table's DDL is its own constant so the upgrade gates can recreate
//! a single table from the same template a fresh deck is built from. Tag
//! tables live in [`crate::tags`] because their bootstrap is shared with
//! the runtime.

/// Deck bootstrap row. Single row, id 1. `version` is the schema version
/// marker; `limits`/`config`/`data` hold the serialized settings blocks.
pub const DECK_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS deck (
    id INTEGER PRIMARY KEY,
    created REAL NOT NULL,
    modified REAL NOT NULL,
    schemaMod REAL NOT NULL DEFAULT 0,
    version INTEGER NOT NULL,
    syncName TEXT NOT NULL DEFAULT '',
    lastSync REAL NOT NULL DEFAULT 0,
    utcOffset REAL NOT NULL DEFAULT 0,
    limits TEXT NOT NULL DEFAULT '',
    config TEXT NOT NULL DEFAULT '',
    data TEXT NOT NULL DEFAULT ''
);
"#;

/// Cards carry a denormalized modelId so scheduling queries no longer hop
/// through facts. `queue` replaces the old relativeDelay/priority pair.
pub const CARDS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY,
    factId INTEGER NOT NULL,
    modelId INTEGER NOT NULL,
    cardModelId INTEGER NOT NULL,
    created REAL NOT NULL,
    modified REAL NOT NULL,
    question TEXT NOT NULL DEFAULT '',
    answer TEXT NOT NULL DEFAULT '',
    ordinal INTEGER NOT NULL DEFAULT 0,
    edits INTEGER NOT NULL DEFAULT 0,
    queue INTEGER NOT NULL DEFAULT 0,
    type INTEGER NOT NULL DEFAULT 2,
    due REAL NOT NULL DEFAULT 0,
    interval REAL NOT NULL DEFAULT 0,
    factor REAL NOT NULL DEFAULT 2.5,
    reps INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    lapses INTEGER NOT NULL DEFAULT 0,
    flags INTEGER NOT NULL DEFAULT 0,
    data TEXT NOT NULL DEFAULT ''
);
"#;

pub const FACTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS facts (
    id INTEGER PRIMARY KEY,
    modelId INTEGER NOT NULL,
    created REAL NOT NULL,
    modified REAL NOT NULL,
    tags TEXT NOT NULL DEFAULT '',
    cache TEXT NOT NULL DEFAULT ''
);
"#;

pub const FIELDS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS fields (
    id INTEGER PRIMARY KEY,
    factId INTEGER NOT NULL,
    fieldModelId INTEGER NOT NULL,
    ordinal INTEGER NOT NULL DEFAULT 0,
    value TEXT NOT NULL DEFAULT '',
    chksum TEXT NOT NULL DEFAULT ''
);
"#;

pub const MODELS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS models (
    id INTEGER PRIMARY KEY,
    created REAL NOT NULL,
    modified REAL NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    config TEXT NOT NULL DEFAULT ''
);
"#;

pub const MEDIA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    created REAL NOT NULL,
    originalPath TEXT NOT NULL DEFAULT '',
    chksum TEXT NOT NULL DEFAULT ''
);
"#;

/// Review log. `time` is epoch milliseconds and doubles as the primary
/// key; `taken` is answer time in milliseconds, clamped to 60s at the
/// source.
pub const REVLOG_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS revlog (
    time INTEGER NOT NULL PRIMARY KEY,
    cardId INTEGER NOT NULL,
    ease INTEGER NOT NULL,
    reps INTEGER NOT NULL,
    lastInterval REAL NOT NULL,
    nextInterval REAL NOT NULL,
    nextFactor REAL NOT NULL,
    taken INTEGER NOT NULL,
    flags INTEGER NOT NULL DEFAULT 0
);
"#;

// Deletion tracking, consumed by sync.
pub const CARDS_DELETED_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS cardsDeleted (
    cardId INTEGER NOT NULL,
    deletedTime REAL NOT NULL
);
"#;

pub const FACTS_DELETED_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS factsDeleted (
    factId INTEGER NOT NULL,
    deletedTime REAL NOT NULL
);
"#;

pub const MODELS_DELETED_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS modelsDeleted (
    modelId INTEGER NOT NULL,
    deletedTime REAL NOT NULL
);
"#;

pub const MEDIA_DELETED_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS mediaDeleted (
    mediaId INTEGER NOT NULL,
    deletedTime REAL NOT NULL
);
"#;

/// Every table a fresh deck needs, in creation order. Tag tables are
/// bootstrapped separately via [`crate::tags::init_tag_tables`].
pub const TABLE_DDLS: &[&str] = &[
    DECK_DDL,
    CARDS_DDL,
    FACTS_DDL,
    FIELDS_DDL,
    MODELS_DDL,
    MEDIA_DDL,
    REVLOG_DDL,
    CARDS_DELETED_DDL,
    FACTS_DELETED_DDL,
    MODELS_DELETED_DDL,
    MEDIA_DELETED_DDL,
];
