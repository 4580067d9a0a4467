//! Nivesh core: typed client for the invest data API plus the local state the
//! browser front end used to keep, persisted properly.
//!
//! - [`client::InvestApi`]: company, search and market-movers endpoints.
//! - [`recent::RecentSearches`]: capped most-recent-first search history.
//! - [`movers::MoversBoard`]: gainers/losers table with stale-on-failure rows.
//! - [`view`]: chart windows, order-book sides, announcement feed.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod movers;
pub mod recent;
pub mod view;

pub use client::InvestApi;
pub use config::{NiveshConfig, UserConfig};
pub use error::{CoreError, CoreResult};
pub use models::{
    Announcement, CompanyData, CompanyInfo, CompanyMetadata, HistoricalBar, MarketMover,
    MoverCategory, OrderLevel, PriceInfo, SearchHit, TradeInfo,
};
pub use movers::{MarketData, MoversBoard, DEFAULT_MOVER_COUNT};
pub use recent::{RecentEntry, RecentSearches, MAX_RECENT};
pub use view::{ChartPeriod, OrderSide};
