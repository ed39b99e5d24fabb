//! CryptoCompare historical OHLCV importer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::config::CryptoCompareConfig;
use crate::error::{ImportError, ImportResult};
use crate::http::{decode, HttpClient, HttpFetch};
use crate::series::PriceSeries;
use crate::types::{from_secs, Bar};

const ENDPOINT: &str = "cryptocompare/histo";

/// Candle granularity, one endpoint per granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoInterval {
    #[default]
    Day,
    Hour,
    Minute,
}

impl HistoInterval {
    pub fn endpoint(&self) -> &'static str {
        match self {
            HistoInterval::Day => "histoday",
            HistoInterval::Hour => "histohour",
            HistoInterval::Minute => "histominute",
        }
    }
}

impl FromStr for HistoInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "histoday" | "day" => Ok(HistoInterval::Day),
            "histohour" | "hour" => Ok(HistoInterval::Hour),
            "histominute" | "minute" => Ok(HistoInterval::Minute),
            _ => Err(format!(
                "Unknown interval: {}. Use 'histoday', 'histohour' or 'histominute'",
                s
            )),
        }
    }
}

impl fmt::Display for HistoInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Parameters of one CryptoCompare import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoCompareRequest {
    /// Base symbol, e.g. "HBAR"
    pub symbol: String,
    pub interval: HistoInterval,
    /// Candle size multiplier
    pub aggregate: u32,
    /// Quote currency, e.g. "USD" or "USDT"
    pub market: String,
    /// Number of candles
    pub limit: u32,
}

impl Default for CryptoCompareRequest {
    fn default() -> Self {
        CryptoCompareRequest {
            symbol: "HBAR".to_string(),
            interval: HistoInterval::Day,
            aggregate: 1,
            market: "USDT".to_string(),
            limit: 365,
        }
    }
}

impl CryptoCompareRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        CryptoCompareRequest {
            symbol: symbol.into(),
            ..Default::default()
        }
    }
}

/// One CryptoCompare candle with volume split by side of the pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CryptoCompareBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume in the base symbol (`volumefrom`)
    pub volume_base: f64,
    /// Volume in the quote market (`volumeto`)
    pub volume_quote: f64,
    pub conversion_type: Option<String>,
    pub conversion_symbol: Option<String>,
}

impl Bar for CryptoCompareBar {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn open(&self) -> f64 {
        self.open
    }
    fn high(&self) -> f64 {
        self.high
    }
    fn low(&self) -> f64 {
        self.low
    }
    fn close(&self) -> f64 {
        self.close
    }
    fn volume(&self) -> Option<f64> {
        Some(self.volume_base)
    }
}

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "Data", default)]
    data: Option<HistoData>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoData {
    #[serde(rename = "Data", default)]
    rows: Vec<HistoRow>,
}

#[derive(Debug, Deserialize)]
struct HistoRow {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volumefrom: f64,
    volumeto: f64,
    #[serde(rename = "conversionType", default)]
    conversion_type: Option<String>,
    #[serde(rename = "conversionSymbol", default)]
    conversion_symbol: Option<String>,
}

impl HistoRow {
    fn into_bar(self) -> ImportResult<CryptoCompareBar> {
        Ok(CryptoCompareBar {
            timestamp: from_secs(ENDPOINT, self.time)?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume_base: self.volumefrom,
            volume_quote: self.volumeto,
            conversion_type: self.conversion_type.filter(|s| !s.is_empty()),
            conversion_symbol: self.conversion_symbol.filter(|s| !s.is_empty()),
        })
    }
}

/// Imports OHLCV series from CryptoCompare's `data/v2/histo*` endpoints
#[derive(Debug, Clone)]
pub struct CryptoCompareImporter<H = HttpClient> {
    http: H,
    base_url: String,
}

impl<H: HttpFetch> CryptoCompareImporter<H> {
    pub fn new(http: H, config: &CryptoCompareConfig) -> Self {
        CryptoCompareImporter {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch candles in provider order
    ///
    /// An empty row list is reported as [`ImportError::Provider`] carrying
    /// the provider's `Message`.
    pub fn fetch(
        &self,
        request: &CryptoCompareRequest,
    ) -> ImportResult<PriceSeries<CryptoCompareBar>> {
        let url = format!("{}/{}", self.base_url, request.interval.endpoint());
        let params = [
            ("fsym", request.symbol.clone()),
            ("tsym", request.market.clone()),
            ("limit", request.limit.to_string()),
            ("aggregate", request.aggregate.to_string()),
        ];

        let response: HistoResponse = decode(ENDPOINT, self.http.get_json(&url, &params)?)?;
        let rows = response.data.unwrap_or_default().rows;

        if rows.is_empty() {
            let err = ImportError::provider(&request.symbol, response.message);
            warn!("{}", err);
            return Err(err);
        }

        let bars = rows
            .into_iter()
            .map(HistoRow::into_bar)
            .collect::<ImportResult<Vec<_>>>()?;

        info!(
            "Imported {} CryptoCompare {} candles for {}/{}",
            bars.len(),
            request.interval,
            request.symbol,
            request.market
        );

        Ok(PriceSeries::new(bars))
    }
}
