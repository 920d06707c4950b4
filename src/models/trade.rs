use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

/// Which value family ranks and values derived metrics: realized P&L in
/// account currency, or the realized R multiple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    #[serde(rename = "pnl")]
    Pnl,
    #[serde(rename = "rr")]
    RMultiple,
}

/// A fully-normalized trade record. The statistics engine assumes every
/// trade has passed through `normalize` first: `status` is populated and
/// a closed trade carries a numeric pnl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
    pub symbol: String,
    pub direction: Direction,
    pub status: TradeStatus,

    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub pnl: Option<f64>,
    pub r_multiple: Option<f64>,
    pub commission: f64,

    pub setup: Option<String>,
    pub tags: Vec<String>,
    pub notes: String,

    // Execution checklist, surfaced by task detection
    pub target: Option<f64>,
    pub stop_loss: Option<f64>,
    pub entry_time: Option<String>,
    pub exit_time: Option<String>,
    pub screenshots: Vec<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Realized pnl of a closed trade; open trades contribute nothing.
    pub fn closed_pnl(&self) -> Option<f64> {
        if self.is_closed() {
            self.pnl
        } else {
            None
        }
    }

    /// The trade's value under the given display mode. Missing R multiples
    /// count as 0 for summation; averaging denominators exclude them.
    pub fn value(&self, mode: DisplayMode) -> Option<f64> {
        match mode {
            DisplayMode::Pnl => self.closed_pnl(),
            DisplayMode::RMultiple => {
                if self.is_closed() {
                    Some(self.r_multiple.unwrap_or(0.0))
                } else {
                    None
                }
            }
        }
    }
}

/// A loosely-typed trade as it arrives from imports, backups, or legacy
/// exports. `status` may be absent on legacy records; `normalize` infers it
/// from exit-price presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrade {
    #[serde(default)]
    pub id: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub exit_date: Option<NaiveDate>,
    pub symbol: String,
    pub direction: Direction,
    #[serde(default)]
    pub status: Option<TradeStatus>,

    pub entry_price: f64,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(default)]
    pub r_multiple: Option<f64>,
    #[serde(default)]
    pub commission: Option<f64>,

    #[serde(default)]
    pub setup: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeFilters {
    pub status: Option<TradeStatus>,
    pub symbol: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}
