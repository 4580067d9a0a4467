//! Read-side helpers over a company payload: chart windows, order book sides
//! and the announcements feed.

use crate::models::{Announcement, CompanyData, HistoricalBar, OrderLevel};
use chrono::NaiveDate;

/// Chart range selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPeriod {
    M1,
    M3,
    M6,
    Y1,
    All,
}

impl ChartPeriod {
    /// Trailing calendar days covered, `None` meaning the full history.
    pub fn days(&self) -> Option<usize> {
        match self {
            ChartPeriod::M1 => Some(30),
            ChartPeriod::M3 => Some(90),
            ChartPeriod::M6 => Some(180),
            ChartPeriod::Y1 => Some(365),
            ChartPeriod::All => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1M" => Some(ChartPeriod::M1),
            "3M" => Some(ChartPeriod::M3),
            "6M" => Some(ChartPeriod::M6),
            "1Y" => Some(ChartPeriod::Y1),
            "ALL" => Some(ChartPeriod::All),
            _ => None,
        }
    }
}

/// Order-book side selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl CompanyData {
    /// The bars inside a chart period, oldest first. The window is a calendar
    /// cutoff from today, so a stale series empties rather than padding the
    /// chart with old bars. Bars with unparseable dates are dropped from
    /// dated windows.
    pub fn close_series(&self, period: ChartPeriod) -> Vec<HistoricalBar> {
        self.close_series_from(period, chrono::Utc::now().date_naive())
    }

    fn close_series_from(&self, period: ChartPeriod, today: NaiveDate) -> Vec<HistoricalBar> {
        let mut bars: Vec<HistoricalBar> = match period.days() {
            Some(days) => {
                let cutoff = today - chrono::Duration::days(days as i64);
                self.historical_data
                    .iter()
                    .filter(|b| parse_date(&b.date).is_some_and(|d| d >= cutoff))
                    .cloned()
                    .collect()
            }
            None => self.historical_data.clone(),
        };
        bars.sort_by_key(|b| parse_date(&b.date));
        bars
    }

    /// One side of the order book.
    pub fn orders(&self, side: OrderSide) -> &[OrderLevel] {
        match side {
            OrderSide::Buy => &self.trade_info.buy_orders,
            OrderSide::Sell => &self.trade_info.sell_orders,
        }
    }

    /// Up to `n` announcements, newest first. Entries with unparseable dates
    /// sort last so malformed rows never bury fresh news.
    pub fn recent_announcements(&self, n: usize) -> Vec<&Announcement> {
        let mut items: Vec<&Announcement> = self.announcements.iter().collect();
        items.sort_by_key(|a| std::cmp::Reverse(parse_date(&a.date)));
        items.truncate(n);
        items
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s.trim(), "%d-%b-%Y"))
        .ok()
}
