//! Upgrade orchestration.
//!
//! A single entry point, [`upgrade`], takes a deck at any supported
//! historical version and brings it to [`schema::DECK_VERSION`] by running
//! the version gates in ascending order — no gate skipped, no downgrade
//! possible. The whole run executes inside one transaction: a crash or
//! failure at any point rolls the deck back to its pre-run state, and the
//! version marker update is the last statement before commit, so re-reading
//! the marker after an aborted run always answers "nothing happened".
//!
//! Callers must guarantee exclusive access to the deck for the duration of
//! the run; nothing here is safe against a concurrent writer.

pub mod progress;
pub mod rebuild;
pub mod version;

use chrono::Utc;
use log::info;
use rusqlite::params;

use crate::db::{schema, Database};
use crate::error::DeckDbError;

pub use progress::{LogProgress, ProgressSink};

/// Result of an upgrade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The deck was already at (or above) the target version; nothing ran.
    AlreadyCurrent(i64),
    /// The deck was upgraded from `from` to `to`.
    Upgraded { from: i64, to: i64 },
}

/// Upgrade the deck to the current schema version.
///
/// Fatal, non-retried failures: [`DeckDbError::UnreadableVersion`] when no
/// bootstrap location answers, [`DeckDbError::UnsupportedLegacyVersion`]
/// when the deck predates the supported floor. Both abort before any
/// mutation. Any failure inside a gate aborts the whole run and rolls
/// back.
pub fn upgrade(
    db: &mut Database,
    progress: &mut dyn ProgressSink,
) -> Result<UpgradeOutcome, DeckDbError> {
    let starting = version::read_version(db.conn())?;
    if starting >= schema::DECK_VERSION {
        info!("Deck already at version {starting}, nothing to do");
        return Ok(UpgradeOutcome::AlreadyCurrent(starting));
    }
    if starting < schema::MIN_SUPPORTED_VERSION {
        return Err(DeckDbError::UnsupportedLegacyVersion {
            found: starting,
            floor: schema::MIN_SUPPORTED_VERSION,
        });
    }

    info!(
        "Upgrading deck from version {starting} to {}",
        schema::DECK_VERSION
    );
    progress.start();
    let result = run(db, starting, progress);
    progress.finish();
    result
}

fn run(
    db: &mut Database,
    starting: i64,
    progress: &mut dyn ProgressSink,
) -> Result<UpgradeOutcome, DeckDbError> {
    let old_modified = version::read_modified(db.conn())?;

    let tx = db.conn_mut().transaction()?;
    let mut current = starting;
    for gate in schema::GATES {
        if current >= gate.version {
            continue;
        }
        progress.report(gate.label);
        info!("Running gate {} ({})", gate.version, gate.label);
        if let Some(sql) = gate.pre_sql {
            tx.execute_batch(sql)?;
        }
        if let Some(code_fn) = gate.code_fn {
            code_fn(&tx)?;
        }
        if let Some(sql) = gate.post_sql {
            tx.execute_batch(sql)?;
        }
        current = gate.version;
    }

    progress.report("Reconciling index catalog");
    schema::catalog::reconcile(&tx)?;

    // The deck's own modification time must survive the upgrade untouched;
    // a change here means a gate wrote where it shouldn't have.
    let new_modified = version::read_modified(&tx)?;
    if (new_modified - old_modified).abs() > f64::EPSILON {
        return Err(DeckDbError::PostconditionViolation(format!(
            "deck modification time changed during upgrade ({old_modified} -> {new_modified})"
        )));
    }

    tx.execute(
        "UPDATE deck SET schemaMod = ?1",
        params![Utc::now().timestamp() as f64],
    )?;
    // The version marker is the last statement before commit; an
    // interrupted run re-reads the old version.
    tx.execute(
        "UPDATE deck SET version = ?1",
        params![schema::DECK_VERSION],
    )?;
    tx.commit()?;

    progress.report("Compacting deck");
    db.compact()?;

    info!("Deck upgraded to version {}", schema::DECK_VERSION);
    Ok(UpgradeOutcome::Upgraded {
        from: starting,
        to: schema::DECK_VERSION,
    })
}
