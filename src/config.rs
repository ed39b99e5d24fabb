//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable support for the TwelveData API key. Every section is optional in
//! the file; missing sections and fields fall back to the public endpoints
//! and the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variables checked, in order, for the TwelveData API key
pub const TWELVEDATA_API_KEY_VARS: &[&str] = &["TWELVEDATA_API_KEY", "twelvedata_api_key"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub coingecko: CoinGeckoConfig,
    pub cryptocompare: CryptoCompareConfig,
    pub binance: BinanceConfig,
    pub twelvedata: TwelveDataConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env_with(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Defaults plus whatever the environment provides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_with(|name| std::env::var(name).ok());
        config
    }

    /// Override credentials from an environment lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let api_key = TWELVEDATA_API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty());

        if let Some(api_key) = api_key {
            self.twelvedata.api_key = Some(api_key);
        }
    }
}

/// Outbound HTTP settings shared by every importer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 30,
            user_agent: concat!("price-importers/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// CoinGecko configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinGeckoConfig {
    pub base_url: String,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        CoinGeckoConfig {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
        }
    }
}

/// CryptoCompare configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoCompareConfig {
    pub base_url: String,
}

impl Default for CryptoCompareConfig {
    fn default() -> Self {
        CryptoCompareConfig {
            base_url: "https://min-api.cryptocompare.com/data/v2".to_string(),
        }
    }
}

/// How the Binance cursor moves past the last kline of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorAdvance {
    /// Always one hour after the last open time, whatever the interval.
    /// Sub-hour intervals lose the klines inside that hour.
    #[default]
    OneHour,
    /// One requested interval after the last open time
    MatchInterval,
}

/// Binance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinanceConfig {
    pub base_url: String,
    /// Klines per page, capped at the exchange maximum of 1000
    pub page_size: u32,
    pub cursor_advance: CursorAdvance,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        BinanceConfig {
            base_url: "https://api.binance.com/api/v3".to_string(),
            page_size: 1000,
            cursor_advance: CursorAdvance::default(),
        }
    }
}

/// TwelveData configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwelveDataConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sent as the `timezone` parameter so returned datetimes are in that zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for TwelveDataConfig {
    fn default() -> Self {
        TwelveDataConfig {
            base_url: "https://api.twelvedata.com".to_string(),
            api_key: None,
            timezone: Some("UTC".to_string()),
        }
    }
}
