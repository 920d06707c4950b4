//! Journal-entry repository. The calendar date is the natural key: writing
//! an entry for a date that already has one replaces its content.

use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;

use crate::db::{lock, Database};
use crate::error::{JournalError, Result};
use crate::models::{JournalEntry, Mood, NewsEvent};

const ENTRY_COLUMNS: &str = "id, date, mood, notes, lessons, market_conditions, did_trade, \
     followed_system, is_news_day, news_events, created_at, updated_at";

fn mood_to_str(mood: Mood) -> &'static str {
    match mood {
        Mood::Excellent => "excellent",
        Mood::Good => "good",
        Mood::Neutral => "neutral",
        Mood::Poor => "poor",
        Mood::Terrible => "terrible",
    }
}

fn conversion_err(index: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn parse_mood(index: usize, text: String) -> rusqlite::Result<Mood> {
    match text.as_str() {
        "excellent" => Ok(Mood::Excellent),
        "good" => Ok(Mood::Good),
        "neutral" => Ok(Mood::Neutral),
        "poor" => Ok(Mood::Poor),
        "terrible" => Ok(Mood::Terrible),
        other => Err(conversion_err(
            index,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown mood: {other}"),
            ),
        )),
    }
}

fn map_row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<JournalEntry> {
    let date: String = row.get(1)?;
    let news_json: String = row.get(9)?;
    let news_events: Vec<NewsEvent> =
        serde_json::from_str(&news_json).map_err(|e| conversion_err(9, e))?;
    Ok(JournalEntry {
        id: row.get(0)?,
        date: date.parse().map_err(|e| conversion_err(1, e))?,
        mood: parse_mood(2, row.get(2)?)?,
        notes: row.get(3)?,
        lessons: row.get(4)?,
        market_conditions: row.get(5)?,
        did_trade: row.get(6)?,
        followed_system: row.get(7)?,
        is_news_day: row.get(8)?,
        news_events,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Insert or replace by date. A fresh id is only minted for new rows; an
/// existing row keeps its id and created_at.
pub fn upsert_entry(db: &Database, entry: &JournalEntry) -> Result<JournalEntry> {
    {
        let conn = lock(db)?;
        let now = Utc::now().timestamp();
        let id = if entry.id.is_empty() {
            format!("ENTRY-{}", uuid::Uuid::new_v4())
        } else {
            entry.id.clone()
        };

        conn.execute(
            &format!(
                "INSERT INTO journal_entries ({ENTRY_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(date) DO UPDATE SET
                     mood = excluded.mood,
                     notes = excluded.notes,
                     lessons = excluded.lessons,
                     market_conditions = excluded.market_conditions,
                     did_trade = excluded.did_trade,
                     followed_system = excluded.followed_system,
                     is_news_day = excluded.is_news_day,
                     news_events = excluded.news_events,
                     updated_at = excluded.updated_at"
            ),
            rusqlite::params![
                id,
                entry.date.to_string(),
                mood_to_str(entry.mood),
                entry.notes,
                entry.lessons,
                entry.market_conditions,
                entry.did_trade,
                entry.followed_system,
                entry.is_news_day,
                serde_json::to_string(&entry.news_events)?,
                now,
                now,
            ],
        )?;
    }

    get_entry(db, entry.date)
}

pub fn get_entry(db: &Database, date: NaiveDate) -> Result<JournalEntry> {
    let conn = lock(db)?;
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE date = ?"),
        [date.to_string()],
        map_row_to_entry,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            JournalError::NotFound(format!("journal entry for {date}"))
        }
        other => other.into(),
    })
}

pub fn list_entries(db: &Database) -> Result<Vec<JournalEntry>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM journal_entries ORDER BY date ASC"
    ))?;
    let entries = stmt
        .query_map([], map_row_to_entry)?
        .collect::<rusqlite::Result<Vec<JournalEntry>>>()?;
    Ok(entries)
}

pub fn delete_entry(db: &Database, date: NaiveDate) -> Result<()> {
    let conn = lock(db)?;
    conn.execute(
        "DELETE FROM journal_entries WHERE date = ?",
        [date.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn entry(day: u32, notes: &str) -> JournalEntry {
        JournalEntry {
            id: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            mood: Mood::Good,
            notes: notes.to_string(),
            lessons: "wait for confirmation".to_string(),
            market_conditions: "choppy".to_string(),
            did_trade: true,
            followed_system: true,
            is_news_day: false,
            news_events: vec![NewsEvent {
                name: "CPI".to_string(),
                time: "08:30".to_string(),
            }],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn upsert_then_get_roundtrips() {
        let db = db();
        let saved = upsert_entry(&db, &entry(1, "first")).unwrap();
        let fetched = get_entry(&db, saved.date).unwrap();
        assert_eq!(saved, fetched);
        assert_eq!(fetched.news_events.len(), 1);
    }

    #[test]
    fn second_upsert_replaces_content_but_keeps_identity() {
        let db = db();
        let first = upsert_entry(&db, &entry(1, "first")).unwrap();
        let second = upsert_entry(&db, &entry(1, "revised")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.notes, "revised");
        assert_eq!(list_entries(&db).unwrap().len(), 1);
    }

    #[test]
    fn entries_list_in_date_order() {
        let db = db();
        upsert_entry(&db, &entry(5, "later")).unwrap();
        upsert_entry(&db, &entry(2, "earlier")).unwrap();
        let entries = list_entries(&db).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].date < entries[1].date);
    }

    #[test]
    fn delete_by_date() {
        let db = db();
        let saved = upsert_entry(&db, &entry(1, "first")).unwrap();
        delete_entry(&db, saved.date).unwrap();
        assert!(get_entry(&db, saved.date).is_err());
    }
}
