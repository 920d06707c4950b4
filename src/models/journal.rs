use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excellent,
    Good,
    Neutral,
    Poor,
    Terrible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub name: String,
    pub time: String,
}

/// One journal entry per calendar date; `date` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(default)]
    pub id: String,
    pub date: NaiveDate,
    pub mood: Mood,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub lessons: String,
    #[serde(default)]
    pub market_conditions: String,
    #[serde(default)]
    pub did_trade: bool,
    #[serde(default)]
    pub followed_system: bool,
    #[serde(default)]
    pub is_news_day: bool,
    #[serde(default)]
    pub news_events: Vec<NewsEvent>,

    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl JournalEntry {
    /// An entry counts as complete once it has written notes. Mood is
    /// always present on a stored entry, so completeness reduces to this.
    pub fn is_complete(&self) -> bool {
        !self.notes.trim().is_empty()
    }
}
