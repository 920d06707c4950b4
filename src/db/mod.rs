pub mod backup;
pub mod connection;
pub mod journal;
pub mod migration_runner;
pub mod trades;

pub use connection::Database;

use std::sync::MutexGuard;

use rusqlite::Connection;

use crate::error::{JournalError, Result};

pub(crate) fn lock(db: &Database) -> Result<MutexGuard<'_, Connection>> {
    db.conn.lock().map_err(|_| JournalError::LockPoisoned)
}
