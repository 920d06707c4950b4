use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::Connection;

use crate::db::migration_runner::MigrationRunner;
use crate::error::Result;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the journal database at `db_path` and bring its
    /// schema up to date. An existing file is backed up before any pending
    /// migration touches it.
    pub fn open(db_path: &str) -> Result<Self> {
        let mut conn = Connection::open(db_path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        // WAL for better concurrency with readers
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let runner = MigrationRunner::new();
        log::info!("=== Starting database migration check ===");

        let current_version = runner.get_current_version(&conn)?;
        log::info!("Current schema version: {:?}", current_version);

        if current_version.is_some() && Path::new(db_path).exists() {
            backup_before_migration(db_path, &runner, &conn)?;
        }

        let applied = runner.run_pending_migrations(&mut conn)?;
        if applied > 0 {
            log::info!("Applied {} migrations", applied);
        } else {
            log::info!("Database schema is up to date");
        }

        runner.verify_migrations(&conn)?;
        log::info!("=== Migration check complete ===");

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, fully migrated. Used by tests and previews.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        let runner = MigrationRunner::new();
        runner.run_pending_migrations(&mut conn)?;
        runner.verify_migrations(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }
}

/// Copy the database file aside when migrations are about to run against
/// real data, so a failed migration never strands the only copy.
fn backup_before_migration(
    db_path: &str,
    runner: &MigrationRunner,
    conn: &Connection,
) -> Result<()> {
    let current = runner.get_current_version(conn)?;
    let pending_exist = match current {
        Some(v) => runner_has_newer(runner, v),
        None => true,
    };
    if !pending_exist {
        return Ok(());
    }

    let backup_path = format!("{}.bak-{}", db_path, Utc::now().timestamp());
    std::fs::copy(db_path, &backup_path)?;
    log::info!("Backed up database to {}", backup_path);
    Ok(())
}

fn runner_has_newer(runner: &MigrationRunner, version: u32) -> bool {
    runner.latest_version().map(|v| v > version).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_and_migrates_a_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();
        let conn = db.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM trades", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn reopening_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        drop(Database::open(path.to_str().unwrap()).unwrap());
        drop(Database::open(path.to_str().unwrap()).unwrap());
    }
}
