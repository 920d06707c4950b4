use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Unsupported export version: {0}")]
    UnsupportedVersion(u32),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, JournalError>;
