use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::error::{JournalError, Result};

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }

    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

pub struct MigrationRunner {
    migrations: Vec<Migration>,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: Self::collect_migrations(),
        }
    }

    fn collect_migrations() -> Vec<Migration> {
        vec![
            Migration::new(
                1,
                "initial_schema",
                include_str!("migrations/001_initial_schema.sql"),
            ),
            Migration::new(
                2,
                "add_trade_checklist",
                include_str!("migrations/002_add_trade_checklist.sql"),
            ),
            Migration::new(
                3,
                "add_news_events",
                include_str!("migrations/003_add_news_events.sql"),
            ),
        ]
    }

    pub fn latest_version(&self) -> Option<u32> {
        self.migrations.iter().map(|m| m.version).max()
    }

    fn ensure_migrations_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                checksum TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        self.ensure_migrations_table(conn)?;
        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();
        Ok(version)
    }

    /// Apply every migration newer than the current version, each inside
    /// its own transaction. Returns the number applied.
    pub fn run_pending_migrations(&self, conn: &mut Connection) -> Result<usize> {
        let current = self.get_current_version(conn)?;

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| match current {
                Some(v) => m.version > v,
                None => true,
            })
            .collect();

        if pending.is_empty() {
            return Ok(0);
        }

        let applied = pending.len();
        for migration in pending {
            log::info!(
                "Applying migration {} ({})",
                migration.version,
                migration.name
            );
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql).map_err(|e| {
                JournalError::Migration(format!(
                    "migration {} ({}) failed: {}",
                    migration.version, migration.name, e
                ))
            })?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name, checksum, applied_at)
                 VALUES (?, ?, ?, ?)",
                params![
                    migration.version,
                    migration.name,
                    migration.checksum(),
                    Utc::now().timestamp()
                ],
            )?;
            tx.commit()?;
        }

        Ok(applied)
    }

    /// Compare stored checksums against the compiled-in migration sources.
    /// A mismatch means the database was migrated by a different build of
    /// the schema and is not safe to run against.
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        self.ensure_migrations_table(conn)?;
        let mut stmt = conn.prepare("SELECT version, checksum FROM schema_migrations")?;
        let applied: Vec<(u32, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;

        for (version, stored) in applied {
            if let Some(migration) = self.migrations.iter().find(|m| m.version == version) {
                let expected = migration.checksum();
                if stored != expected {
                    return Err(JournalError::Migration(format!(
                        "checksum mismatch for migration {}: stored {} expected {}",
                        version, stored, expected
                    )));
                }
            }
        }
        Ok(())
    }
}
