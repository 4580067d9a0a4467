//! Wire types for the invest data API.
//!
//! Field names are camelCase on the wire; numeric fields the backend may omit
//! default to zero so a sparse payload still renders.

use serde::{Deserialize, Serialize};

/// Market-mover tab categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverCategory {
    Gainers,
    Losers,
}

impl MoverCategory {
    /// Query-string value for `/invest/api/market-movers?category=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoverCategory::Gainers => "gainers",
            MoverCategory::Losers => "losers",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gainers" => Some(MoverCategory::Gainers),
            "losers" => Some(MoverCategory::Losers),
            _ => None,
        }
    }
}

impl std::fmt::Display for MoverCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the market-movers table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketMover {
    pub symbol: String,
    pub name: String,
    pub last_price: f64,
    /// Percent change for the day; sign carries direction.
    pub change: f64,
}

/// One search hit from `/invest/api/search`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SearchHit {
    pub symbol: String,
    pub name: String,
}

/// Quote block for a company.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceInfo {
    pub last_price: f64,
    pub change: f64,
    pub p_change: f64,
    pub open: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub previous_close: f64,
    pub total_traded_volume: f64,
    pub week_high: f64,
    pub week_low: f64,
    pub market_cap: f64,
    pub pe: f64,
    pub eps: f64,
    pub dividend_yield: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    pub company_name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyMetadata {
    pub industry: Option<String>,
    pub indices: Option<String>,
    pub face_value: f64,
    pub listing_date: Option<String>,
    pub book_value: f64,
}

/// One historical daily bar.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoricalBar {
    /// ISO date string as sent by the backend (e.g. `2024-03-18`).
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One order-book level.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrderLevel {
    pub price: f64,
    pub quantity: f64,
    pub orders: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeInfo {
    pub buy_orders: Vec<OrderLevel>,
    pub sell_orders: Vec<OrderLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Announcement {
    pub date: String,
    pub title: String,
    pub url: Option<String>,
}

/// Full company payload from `/invest/api/company/{symbol}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyData {
    pub info: CompanyInfo,
    pub metadata: CompanyMetadata,
    pub price_info: PriceInfo,
    pub historical_data: Vec<HistoricalBar>,
    pub trade_info: TradeInfo,
    pub announcements: Vec<Announcement>,
}

// Response envelopes. The backend always carries `success` and, on failure,
// a human-readable `message`.

#[derive(Debug, Deserialize)]
pub(crate) struct CompanyResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<CompanyData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoversResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<MarketMover>,
}
