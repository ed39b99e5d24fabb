//! Binance kline importer
//!
//! No API key required for public market data endpoints. A window larger
//! than one page is collected by paging forward from the window start: each
//! page begins just after the last kline of the previous one, and the loop
//! stops on an empty page or once the cursor reaches the window end.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{BinanceConfig, CursorAdvance};
use crate::error::{ImportError, ImportResult};
use crate::http::{decode, HttpClient, HttpFetch};
use crate::series::PriceSeries;
use crate::types::{from_millis, Bar};

const ENDPOINT: &str = "binance/klines";

/// Maximum klines per request (Binance limit)
pub const MAX_KLINES_PER_REQUEST: u32 = 1000;

/// Lookback of historical mode
pub const HISTORICAL_DAYS: i64 = 5 * 365;

/// Length of one kline of `interval`.
///
/// `1M` maps to 28 days, the shortest month, so a cursor advanced by it
/// never steps over a monthly kline.
pub fn interval_duration(interval: &str) -> Option<Duration> {
    let duration = match interval {
        "1s" => Duration::seconds(1),
        "1m" => Duration::minutes(1),
        "3m" => Duration::minutes(3),
        "5m" => Duration::minutes(5),
        "15m" => Duration::minutes(15),
        "30m" => Duration::minutes(30),
        "1h" => Duration::hours(1),
        "2h" => Duration::hours(2),
        "4h" => Duration::hours(4),
        "6h" => Duration::hours(6),
        "8h" => Duration::hours(8),
        "12h" => Duration::hours(12),
        "1d" => Duration::days(1),
        "3d" => Duration::days(3),
        "1w" => Duration::weeks(1),
        "1M" => Duration::days(28),
        _ => return None,
    };
    Some(duration)
}

/// Span of klines to collect, ending now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinanceWindow {
    /// The last N hours
    RecentHours(u32),
    /// The last five years
    Historical,
}

impl Default for BinanceWindow {
    fn default() -> Self {
        BinanceWindow::RecentHours(10)
    }
}

impl BinanceWindow {
    /// Window from a `limit` in hours and a current-mode flag; historical
    /// mode ignores `limit`
    pub fn from_limit(limit: u32, current: bool) -> Self {
        if current {
            BinanceWindow::RecentHours(limit)
        } else {
            BinanceWindow::Historical
        }
    }

    pub fn lookback(&self) -> Duration {
        match self {
            BinanceWindow::RecentHours(hours) => Duration::hours(i64::from(*hours)),
            BinanceWindow::Historical => Duration::days(HISTORICAL_DAYS),
        }
    }
}

/// Parameters of one Binance import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinanceRequest {
    /// Trading pair, e.g. "HBARUSDT"
    pub symbol: String,
    /// Kline interval, e.g. "1h"
    pub interval: String,
    pub window: BinanceWindow,
}

impl Default for BinanceRequest {
    fn default() -> Self {
        BinanceRequest {
            symbol: "HBARUSDT".to_string(),
            interval: "1h".to_string(),
            window: BinanceWindow::default(),
        }
    }
}

impl BinanceRequest {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, window: BinanceWindow) -> Self {
        BinanceRequest {
            symbol: symbol.into(),
            interval: interval.into(),
            window,
        }
    }
}

/// Binance kline/candlestick data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinanceKline {
    /// Open time
    pub time_stamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Close time in epoch milliseconds, as sent by the exchange
    pub close_time: i64,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_base_volume: f64,
    pub taker_quote_volume: f64,
    pub ignore: String,
}

impl Bar for BinanceKline {
    fn timestamp(&self) -> DateTime<Utc> {
        self.time_stamp
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
        Some(self.volume)
    }
}

/// API returns an array: [open_time, open, high, low, close, volume, close_time,
///                        quote_volume, trades, taker_buy_base, taker_buy_quote, ignore]
type RawKline = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    u64,
    String,
    String,
    String,
);

fn parse_decimal(field: &str, value: &str) -> ImportResult<f64> {
    value
        .parse()
        .map_err(|_| ImportError::schema(ENDPOINT, format!("{field} is not a number: {value:?}")))
}

impl BinanceKline {
    fn from_raw(raw: RawKline) -> ImportResult<Self> {
        let (open_time, open, high, low, close, volume, close_time, quote_volume, trades, taker_base, taker_quote, ignore) =
            raw;

        Ok(BinanceKline {
            time_stamp: from_millis(ENDPOINT, open_time)?,
            open: parse_decimal("open", &open)?,
            high: parse_decimal("high", &high)?,
            low: parse_decimal("low", &low)?,
            close: parse_decimal("close", &close)?,
            volume: parse_decimal("volume", &volume)?,
            close_time,
            quote_volume: parse_decimal("quote_volume", &quote_volume)?,
            trades,
            taker_base_volume: parse_decimal("taker_base_volume", &taker_base)?,
            taker_quote_volume: parse_decimal("taker_quote_volume", &taker_quote)?,
            ignore,
        })
    }
}

/// Imports kline series from Binance, paging through the 1000-kline limit
#[derive(Debug, Clone)]
pub struct BinanceImporter<H = HttpClient> {
    http: H,
    base_url: String,
    page_size: u32,
    cursor_advance: CursorAdvance,
}

impl<H: HttpFetch> BinanceImporter<H> {
    pub fn new(http: H, config: &BinanceConfig) -> Self {
        BinanceImporter {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.clamp(1, MAX_KLINES_PER_REQUEST),
            cursor_advance: config.cursor_advance,
        }
    }

    /// Fetch one page of klines opening at or after `start_time`
    pub fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        start_time: DateTime<Utc>,
        limit: u32,
    ) -> ImportResult<Vec<BinanceKline>> {
        let url = format!("{}/klines", self.base_url);
        let limit = limit.min(MAX_KLINES_PER_REQUEST);
        let params = [
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("startTime", start_time.timestamp_millis().to_string()),
            ("limit", limit.to_string()),
        ];

        debug!(
            "Fetching klines: symbol={}, interval={}, start={}, limit={}",
            symbol, interval, start_time, limit
        );

        let raw: Vec<RawKline> = decode(ENDPOINT, self.http.get_json(&url, &params)?)?;
        raw.into_iter().map(BinanceKline::from_raw).collect()
    }

    /// Fetch the requested window ending now
    pub fn fetch(&self, request: &BinanceRequest) -> ImportResult<PriceSeries<BinanceKline>> {
        self.fetch_until(request, Utc::now())
    }

    /// Fetch the requested window ending at `end_time`
    pub fn fetch_until(
        &self,
        request: &BinanceRequest,
        end_time: DateTime<Utc>,
    ) -> ImportResult<PriceSeries<BinanceKline>> {
        let step = self.cursor_step(&request.interval)?;
        let mut start_time = end_time
            .checked_sub_signed(request.window.lookback())
            .ok_or(ImportError::WindowOutOfRange(request.window))?;

        info!(
            "Fetching {} {} data from Binance ({} to {})",
            request.symbol, request.interval, start_time, end_time
        );

        let mut all_klines = Vec::new();
        let mut pages = 0usize;

        while start_time < end_time {
            let klines =
                self.get_klines(&request.symbol, &request.interval, start_time, self.page_size)?;
            pages += 1;

            let Some(last) = klines.last() else {
                debug!("No more klines available from {}", start_time);
                break;
            };

            // Move start time past the last candle
            let next = last
                .time_stamp
                .checked_add_signed(step)
                .ok_or_else(|| ImportError::schema(ENDPOINT, "kline open time out of range"))?;
            if next <= start_time {
                warn!(
                    "Binance page ending {} did not move the cursor past {}, stopping",
                    last.time_stamp, start_time
                );
                break;
            }
            start_time = next;
            debug!(
                "  Fetched {} klines, next page from {}",
                klines.len(),
                start_time.format("%Y-%m-%d %H:%M")
            );

            all_klines.extend(klines);
        }

        info!(
            "Fetched {} klines for {} {} in {} requests",
            all_klines.len(),
            request.symbol,
            request.interval,
            pages
        );

        Ok(PriceSeries::new(all_klines))
    }

    fn cursor_step(&self, interval: &str) -> ImportResult<Duration> {
        match self.cursor_advance {
            CursorAdvance::OneHour => Ok(Duration::hours(1)),
            CursorAdvance::MatchInterval => interval_duration(interval)
                .ok_or_else(|| ImportError::UnsupportedInterval(interval.to_string())),
        }
    }
}
