//! Versioned backup-payload migration.
//!
//! Backups are loosely-typed JSON stamped with a schema version. Each
//! version transition is an explicit function over the raw JSON; after the
//! chain runs, the payload parses into fully-typed records. Version 1
//! predates the `status` field, commissions, the execution checklist, and
//! journal news events.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{JournalError, Result};
use crate::models::{JournalEntry, RawTrade, Trade};
use crate::normalize::normalize_trades;

pub const EXPORT_VERSION: u32 = 2;

/// A fully-migrated, normalized backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPayload {
    pub version: u32,
    pub exported_at: i64,
    pub trades: Vec<Trade>,
    pub journal_entries: Vec<JournalEntry>,
}

#[derive(Debug, Deserialize)]
struct LoosePayload {
    #[serde(default)]
    exported_at: i64,
    #[serde(default)]
    trades: Vec<RawTrade>,
    #[serde(default)]
    journal_entries: Vec<JournalEntry>,
}

fn payload_version(payload: &Value) -> u32 {
    payload
        .get("version")
        .and_then(|v| v.as_u64())
        .unwrap_or(1) as u32
}

/// v1 -> v2: make the implicit explicit. Status is inferred from exit-price
/// presence, value-level defaults are written out, and journal entries gain
/// an empty news-event list.
fn migrate_v1_to_v2(mut payload: Value) -> Value {
    if let Some(trades) = payload.get_mut("trades").and_then(|v| v.as_array_mut()) {
        for trade in trades {
            if let Some(obj) = trade.as_object_mut() {
                if !obj.contains_key("status") || obj["status"].is_null() {
                    let open = obj.get("exit_price").map(|v| v.is_null()).unwrap_or(true);
                    obj.insert(
                        "status".to_string(),
                        json!(if open { "open" } else { "closed" }),
                    );
                }
                obj.entry("commission").or_insert(json!(0.0));
                obj.entry("tags").or_insert(json!([]));
                obj.entry("notes").or_insert(json!(""));
                obj.entry("screenshots").or_insert(json!([]));
            }
        }
    }

    if let Some(entries) = payload
        .get_mut("journal_entries")
        .and_then(|v| v.as_array_mut())
    {
        for entry in entries {
            if let Some(obj) = entry.as_object_mut() {
                obj.entry("news_events").or_insert(json!([]));
                obj.entry("is_news_day").or_insert(json!(false));
            }
        }
    }

    if let Some(obj) = payload.as_object_mut() {
        obj.insert("version".to_string(), json!(2));
    }
    payload
}

/// Run the migration chain for whatever version the payload claims, then
/// parse and normalize into typed records.
pub fn migrate_payload(payload: Value) -> Result<ExportPayload> {
    let version = payload_version(&payload);
    let payload = match version {
        1 => migrate_v1_to_v2(payload),
        2 => payload,
        other => return Err(JournalError::UnsupportedVersion(other)),
    };

    let loose: LoosePayload = serde_json::from_value(payload)?;
    Ok(ExportPayload {
        version: EXPORT_VERSION,
        exported_at: loose.exported_at,
        trades: normalize_trades(loose.trades),
        journal_entries: loose.journal_entries,
    })
}
