//! Async client for the invest data API.
//!
//! One `reqwest::Client` built up front with the configured timeout; every
//! operation maps transport failures to [`CoreError::Network`] and non-2xx or
//! `success: false` envelopes to [`CoreError::Api`].

use crate::config::NiveshConfig;
use crate::error::{CoreError, CoreResult};
use crate::models::{
    CompanyData, CompanyResponse, MarketMover, MoverCategory, MoversResponse, SearchHit,
    SearchResponse,
};
use std::time::Duration;
use tracing::debug;

/// Queries shorter than this never hit the network (server echoes empty anyway).
pub const MIN_SEARCH_LEN: usize = 2;

/// Typed client for `/invest/api/...`.
#[derive(Debug, Clone)]
pub struct InvestApi {
    base_url: String,
    client: reqwest::Client,
}

impl InvestApi {
    /// Build a client for the given base URL with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(e.to_string()))?;
        Ok(Self {
            base_url: normalize_base(base_url.into()),
            client,
        })
    }

    /// Build from configuration.
    pub fn from_config(config: &NiveshConfig) -> CoreResult<Self> {
        Self::new(
            config.api_base.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full company payload. The symbol is uppercased to match the
    /// backend's path handling.
    pub async fn company(&self, symbol: &str) -> CoreResult<CompanyData> {
        let symbol = symbol.trim().to_uppercase();
        let url = format!("{}/invest/api/company/{}", self.base_url, symbol);
        debug!("fetching company data for {}", symbol);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            // A 404 still carries the envelope with a message; prefer it.
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CompanyResponse>(&body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or(body);
            return Err(CoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let envelope: CompanyResponse = resp.json().await?;
        if !envelope.success {
            return Err(api_failure(status.as_u16(), envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| CoreError::Decode("company envelope missing data".to_string()))
    }

    /// Search companies by name or symbol fragment. Short queries return an
    /// empty list without a request.
    pub async fn search(&self, query: &str) -> CoreResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.len() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        let url = format!("{}/invest/api/search", self.base_url);
        let resp = self.client.get(&url).query(&[("q", query)]).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        let envelope: SearchResponse = resp.json().await?;
        if !envelope.success {
            return Err(api_failure(status.as_u16(), envelope.message));
        }
        Ok(envelope.results)
    }

    /// Fetch top movers for a category.
    pub async fn market_movers(
        &self,
        category: MoverCategory,
        count: usize,
    ) -> CoreResult<Vec<MarketMover>> {
        let url = format!("{}/invest/api/market-movers", self.base_url);
        debug!("fetching {} movers ({})", count, category);
        let resp = self
            .client
            .get(&url)
            .query(&[("category", category.as_str()), ("count", &count.to_string())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        let envelope: MoversResponse = resp.json().await?;
        if !envelope.success {
            return Err(api_failure(status.as_u16(), envelope.message));
        }
        Ok(envelope.data)
    }
}

fn api_failure(status: u16, message: Option<String>) -> CoreError {
    CoreError::Api {
        status,
        message: message.unwrap_or_else(|| "request failed".to_string()),
    }
}

fn normalize_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let api = InvestApi::new("http://localhost:5000///", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn short_search_query_short_circuits() {
        // Unroutable base: a network attempt would fail, an empty result proves
        // no request was made.
        let api = InvestApi::new("http://127.0.0.1:1", Duration::from_millis(50)).unwrap();
        assert!(api.search("a").await.unwrap().is_empty());
        assert!(api.search("  ").await.unwrap().is_empty());
    }
}
