//! Trading journal core: trade and journal storage on SQLite, derived
//! statistics (streaks, personal bests, achievements, period comparisons,
//! growth projections), CSV import, and versioned backup export/import.

pub mod db;
pub mod error;
pub mod import;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod report;
pub mod stats;

pub use db::Database;
pub use error::{JournalError, Result};
pub use report::DashboardReport;
