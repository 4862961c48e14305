use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckDbError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    /// Neither the current nor the legacy bootstrap location yielded a
    /// schema version. The deck file is missing or corrupt.
    #[error("unable to read the deck schema version from the database")]
    UnreadableVersion,

    /// The deck predates the oldest layout this engine can bridge. There
    /// is no automatic path forward; the caller must direct the user to a
    /// legacy upgrade tool.
    #[error("deck version {found} is below the supported floor ({floor}); it cannot be upgraded automatically")]
    UnsupportedLegacyVersion { found: i64, floor: i64 },

    /// An invariant check after the upgrade failed. Indicates a logic
    /// defect in a gate, not a problem with the deck.
    #[error("upgrade postcondition violated: {0}")]
    PostconditionViolation(String),

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}
