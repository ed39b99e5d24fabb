//! CoinGecko OHLC importer
//!
//! Candles come from `/coins/{id}/ohlc`. CoinGecko's OHLC endpoint carries
//! no volume, so when volume is requested the `total_volumes` series of
//! `/coins/{id}/market_chart` is asof-joined onto the candles.

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::CoinGeckoConfig;
use crate::error::ImportResult;
use crate::http::{decode, HttpClient, HttpFetch};
use crate::series::PriceSeries;
use crate::types::{from_millis, PriceBar, VolumePoint};

const OHLC_ENDPOINT: &str = "coingecko/ohlc";
const MARKET_CHART_ENDPOINT: &str = "coingecko/market_chart";

/// Parameters of one CoinGecko import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinGeckoRequest {
    /// CoinGecko coin id, e.g. "hedera-hashgraph"
    pub coin_id: String,
    /// Quote currency, e.g. "usd"
    pub vs_currency: String,
    pub days: u32,
    pub with_volume: bool,
}

impl Default for CoinGeckoRequest {
    fn default() -> Self {
        CoinGeckoRequest {
            coin_id: "hedera-hashgraph".to_string(),
            vs_currency: "usd".to_string(),
            days: 365,
            with_volume: true,
        }
    }
}

impl CoinGeckoRequest {
    pub fn new(coin_id: impl Into<String>) -> Self {
        CoinGeckoRequest {
            coin_id: coin_id.into(),
            ..Default::default()
        }
    }
}

/// `[timestamp_ms, open, high, low, close]`
type OhlcRow = (i64, f64, f64, f64, f64);

#[derive(Debug, Deserialize)]
struct MarketChart {
    /// `[timestamp_ms, volume]`
    total_volumes: Vec<(i64, f64)>,
}

/// Imports OHLC(V) series from CoinGecko
#[derive(Debug, Clone)]
pub struct CoinGeckoImporter<H = HttpClient> {
    http: H,
    base_url: String,
}

impl<H: HttpFetch> CoinGeckoImporter<H> {
    pub fn new(http: H, config: &CoinGeckoConfig) -> Self {
        CoinGeckoImporter {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch candles sorted by timestamp, with volume joined when requested
    pub fn fetch(&self, request: &CoinGeckoRequest) -> ImportResult<PriceSeries<PriceBar>> {
        let params = [
            ("vs_currency", request.vs_currency.clone()),
            ("days", request.days.to_string()),
        ];

        let mut series = self.fetch_ohlc(&request.coin_id, &params)?;
        debug!(
            "CoinGecko returned {} OHLC rows for {}",
            series.len(),
            request.coin_id
        );

        if request.with_volume {
            let volumes = self.fetch_volumes(&request.coin_id, &params)?;
            debug!(
                "CoinGecko returned {} volume points for {}",
                volumes.len(),
                request.coin_id
            );
            series.join_volume_asof(&volumes);
        }

        info!(
            "Imported {} CoinGecko candles for {}/{} ({} days)",
            series.len(),
            request.coin_id,
            request.vs_currency,
            request.days
        );

        Ok(series)
    }

    fn fetch_ohlc(
        &self,
        coin_id: &str,
        params: &[(&str, String)],
    ) -> ImportResult<PriceSeries<PriceBar>> {
        let url = format!("{}/coins/{}/ohlc", self.base_url, coin_id);
        let rows: Vec<OhlcRow> = decode(OHLC_ENDPOINT, self.http.get_json(&url, params)?)?;

        let bars = rows
            .into_iter()
            .map(|(ts, open, high, low, close)| {
                Ok(PriceBar::new(
                    from_millis(OHLC_ENDPOINT, ts)?,
                    open,
                    high,
                    low,
                    close,
                ))
            })
            .collect::<ImportResult<Vec<_>>>()?;

        Ok(PriceSeries::sorted(bars))
    }

    fn fetch_volumes(
        &self,
        coin_id: &str,
        params: &[(&str, String)],
    ) -> ImportResult<Vec<VolumePoint>> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, coin_id);
        let chart: MarketChart =
            decode(MARKET_CHART_ENDPOINT, self.http.get_json(&url, params)?)?;

        let mut points = chart
            .total_volumes
            .into_iter()
            .map(|(ts, volume)| {
                Ok(VolumePoint {
                    timestamp: from_millis(MARKET_CHART_ENDPOINT, ts)?,
                    volume,
                })
            })
            .collect::<ImportResult<Vec<_>>>()?;

        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}
