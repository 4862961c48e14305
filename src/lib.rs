//! deckdb — embedded SQLite storage for spaced-repetition decks, and the
//! schema upgrade engine that brings historical decks forward to the
//! current layout.
//!
//! The upgrade engine is the interesting part: old deck files predate
//! SQLite's richer ALTER TABLE support, so moving a deck to the current
//! schema means rebuilding tables through staging copies, renumbering and
//! deriving columns row by row, folding the legacy free-form `deckVars`
//! settings into structured configuration blocks, and reconciling the
//! index catalog — all inside a single transaction so an interrupted
//! upgrade leaves the deck exactly as it was.
//!
//! Entry point: [`db::migration::upgrade`].

pub mod checksum;
pub mod db;
pub mod error;
pub mod settings;
pub mod tags;

pub use db::Database;
pub use error::DeckDbError;
