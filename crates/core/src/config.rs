//! Configuration structures for the barfeed system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum records a single Binance REST request may return.
pub const BINANCE_PAGE_LIMIT: usize = 1_000;

/// Main configuration: one venue section per market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spot market endpoints.
    pub spot: VenueConfig,
    /// USD-M perpetual futures endpoints.
    pub futures: VenueConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spot: VenueConfig::binance_spot(),
            futures: VenueConfig::binance_futures(),
        }
    }
}

impl Config {
    /// Parse a JSON document. Missing sections take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validate every venue section.
    pub fn validate(&self) -> Result<()> {
        self.spot.validate("spot")?;
        self.futures.validate("futures")
    }
}

/// Endpoints and request limits for one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// REST base URL (e.g., "https://api.binance.com").
    pub rest_base_url: String,
    /// WebSocket base URL; stream names are appended after a `/`.
    pub ws_base_url: String,
    /// Optional API key sent as `X-MBX-APIKEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
    /// Maximum klines per REST page.
    pub kline_page_limit: usize,
    /// Maximum funding records per REST page.
    pub funding_page_limit: usize,
    /// Upper bound for the recent-trades `limit` argument.
    pub max_trade_limit: usize,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self::binance_spot()
    }
}

impl VenueConfig {
    /// Binance spot defaults.
    pub fn binance_spot() -> Self {
        Self {
            rest_base_url: "https://api.binance.com".to_string(),
            ws_base_url: "wss://stream.binance.com:9443/ws".to_string(),
            api_key: None,
            timeout_ms: 10_000,
            kline_page_limit: BINANCE_PAGE_LIMIT,
            funding_page_limit: BINANCE_PAGE_LIMIT,
            max_trade_limit: BINANCE_PAGE_LIMIT,
        }
    }

    /// Binance USD-M futures defaults.
    pub fn binance_futures() -> Self {
        Self {
            rest_base_url: "https://fapi.binance.com".to_string(),
            ws_base_url: "wss://fstream.binance.com/ws".to_string(),
            ..Self::binance_spot()
        }
    }

    /// Attach an API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Check that URLs are set and limits are positive.
    pub fn validate(&self, section: &str) -> Result<()> {
        if self.rest_base_url.trim().is_empty() {
            return Err(Error::config(format!("{section}.rest_base_url is empty")));
        }
        if self.ws_base_url.trim().is_empty() {
            return Err(Error::config(format!("{section}.ws_base_url is empty")));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config(format!("{section}.timeout_ms must be > 0")));
        }
        if self.kline_page_limit == 0 || self.funding_page_limit == 0 {
            return Err(Error::config(format!("{section}: page limits must be > 0")));
        }
        if self.max_trade_limit == 0 {
            return Err(Error::config(format!("{section}.max_trade_limit must be > 0")));
        }
        Ok(())
    }
}
