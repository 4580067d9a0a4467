//! Market-movers board: the gainers/losers table with tab switching.
//!
//! The board refreshes by full row replacement. A failed refresh keeps the
//! rows already on screen so a transient backend hiccup does not blank the
//! table.

use crate::client::InvestApi;
use crate::error::CoreResult;
use crate::models::{MarketMover, MoverCategory};
use async_trait::async_trait;
use tracing::warn;

/// Default number of rows shown per category.
pub const DEFAULT_MOVER_COUNT: usize = 10;

/// Source of mover rows. The board depends on this seam so tests can feed it
/// canned data.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn market_movers(
        &self,
        category: MoverCategory,
        count: usize,
    ) -> CoreResult<Vec<MarketMover>>;
}

#[async_trait]
impl MarketData for InvestApi {
    async fn market_movers(
        &self,
        category: MoverCategory,
        count: usize,
    ) -> CoreResult<Vec<MarketMover>> {
        InvestApi::market_movers(self, category, count).await
    }
}

/// Stateful view over one movers category.
#[derive(Debug)]
pub struct MoversBoard {
    category: MoverCategory,
    count: usize,
    rows: Vec<MarketMover>,
}

impl Default for MoversBoard {
    fn default() -> Self {
        Self::new(MoverCategory::Gainers, DEFAULT_MOVER_COUNT)
    }
}

impl MoversBoard {
    pub fn new(category: MoverCategory, count: usize) -> Self {
        Self {
            category,
            count,
            rows: Vec::new(),
        }
    }

    pub fn category(&self) -> MoverCategory {
        self.category
    }

    /// Rows from the last successful refresh.
    pub fn rows(&self) -> &[MarketMover] {
        &self.rows
    }

    /// Replace the rows with fresh data. On failure the existing rows stay in
    /// place and the error propagates to the caller.
    pub async fn refresh(&mut self, source: &dyn MarketData) -> CoreResult<()> {
        match source.market_movers(self.category, self.count).await {
            Ok(rows) => {
                self.rows = rows;
                Ok(())
            }
            Err(e) => {
                warn!("movers refresh failed, keeping stale rows: {}", e);
                Err(e)
            }
        }
    }

    /// Switch tabs and refresh. The category changes even when the fetch
    /// fails, so a retry hits the newly selected tab.
    pub async fn switch(
        &mut self,
        source: &dyn MarketData,
        category: MoverCategory,
    ) -> CoreResult<()> {
        self.category = category;
        self.refresh(source).await
    }
}
