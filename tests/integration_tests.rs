//! Integration tests for the price importers
//!
//! Every importer is driven through a fake transport that answers like the
//! real provider, so these tests exercise decoding, pagination and table
//! assembly end to end without network access.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;

use price_importers::{
    BinanceImporter, BinanceRequest, BinanceWindow, CoinGeckoImporter, CoinGeckoRequest, Config,
    CryptoCompareImporter, CryptoCompareRequest, HttpFetch, ImportError, ImportResult, Importers,
    TwelveDataImporter, TwelveDataRequest,
};

// =============================================================================
// Test Utilities
// =============================================================================

#[derive(Debug, Clone)]
struct Recorded {
    url: String,
    query: Vec<(String, String)>,
}

impl Recorded {
    fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport answering each request through a handler, recording every call
struct FakeProvider {
    handler: Box<dyn Fn(&Recorded) -> Value>,
    requests: RefCell<Vec<Recorded>>,
}

impl FakeProvider {
    fn new(handler: impl Fn(&Recorded) -> Value + 'static) -> Self {
        FakeProvider {
            handler: Box::new(handler),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Replay responses in order
    fn scripted(responses: Vec<Value>) -> Self {
        let queue = RefCell::new(VecDeque::from(responses));
        Self::new(move |_| queue.borrow_mut().pop_front().unwrap_or(Value::Null))
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }
}

impl HttpFetch for FakeProvider {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> ImportResult<Value> {
        let recorded = Recorded {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        let response = (self.handler)(&recorded);
        self.requests.borrow_mut().push(recorded);
        Ok(response)
    }
}

const HOUR_MS: i64 = 3_600_000;

fn end_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn kline(open_ms: i64) -> Value {
    json!([
        open_ms, "0.05", "0.06", "0.04", "0.055", "1000.0",
        open_ms + HOUR_MS - 1, "55.0", 7, "400.0", "22.0", "0"
    ])
}

/// Hourly klines from `startTime`, never past `end`, at most `limit` per page
fn kline_server(end: DateTime<Utc>) -> FakeProvider {
    let end_ms = end.timestamp_millis();
    FakeProvider::new(move |request| {
        let start: i64 = request.param("startTime").unwrap().parse().unwrap();
        let limit: i64 = request.param("limit").unwrap().parse().unwrap();
        let rows = (0..limit)
            .map(|i| start + i * HOUR_MS)
            .take_while(|open| *open < end_ms)
            .map(kline)
            .collect();
        Value::Array(rows)
    })
}

// =============================================================================
// CoinGecko
// =============================================================================

fn coingecko_provider() -> FakeProvider {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp_millis();
    FakeProvider::new(move |request| {
        if request.url.ends_with("/ohlc") {
            json!([
                [t0 + 8 * HOUR_MS, 0.07, 0.08, 0.06, 0.075],
                [t0, 0.05, 0.06, 0.04, 0.055],
                [t0 + 4 * HOUR_MS, 0.06, 0.07, 0.05, 0.065],
                [t0 + 12 * HOUR_MS, 0.075, 0.09, 0.07, 0.085]
            ])
        } else {
            json!({
                "prices": [],
                "market_caps": [],
                "total_volumes": [
                    [t0 + 9 * HOUR_MS, 900.0],
                    [t0 + 2 * HOUR_MS, 200.0],
                    [t0 + 4 * HOUR_MS, 400.0]
                ]
            })
        }
    })
}

#[test]
fn test_coingecko_sorted_and_join_keeps_rows() {
    let provider = coingecko_provider();
    let importer = CoinGeckoImporter::new(&provider, &Config::default().coingecko);

    let without = importer
        .fetch(&CoinGeckoRequest {
            with_volume: false,
            ..Default::default()
        })
        .unwrap();
    let with = importer.fetch(&CoinGeckoRequest::default()).unwrap();

    assert!(without.is_sorted());
    assert!(with.is_sorted());
    assert_eq!(with.len(), without.len());
    assert_eq!(with.timestamps(), without.timestamps());

    let volumes: Vec<Option<f64>> = with.iter().map(|b| b.volume).collect();
    assert_eq!(volumes, vec![None, Some(400.0), Some(400.0), Some(900.0)]);
    assert_eq!(provider.request_count(), 3);
}

// =============================================================================
// CryptoCompare
// =============================================================================

#[test]
fn test_cryptocompare_empty_payload_names_symbol() {
    let provider = FakeProvider::scripted(vec![
        json!({"Response": "Error", "Message": "There is no data for the symbol XYZ .", "Data": {"Data": []}}),
        json!({"Response": "Error", "Data": {}}),
    ]);
    let importer = CryptoCompareImporter::new(&provider, &Config::default().cryptocompare);
    let request = CryptoCompareRequest::new("XYZ");

    let err = importer.fetch(&request).unwrap_err();
    assert!(matches!(err, ImportError::Provider { .. }));
    let message = err.to_string();
    assert!(message.contains("XYZ"));
    assert!(message.contains("There is no data for the symbol"));

    let err = importer.fetch(&request).unwrap_err();
    assert_eq!(err.to_string(), "Error fetching data for XYZ: Unknown error");
}

// =============================================================================
// TwelveData
// =============================================================================

#[test]
fn test_twelvedata_missing_values_names_symbol() {
    let provider = FakeProvider::scripted(vec![json!({"status": "error"})]);
    let importer = TwelveDataImporter::new(&provider, &Config::default().twelvedata);

    let err = importer
        .fetch(&TwelveDataRequest::new("HBAR/USD"))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error fetching data for HBAR/USD: Unknown error"
    );
}

#[test]
fn test_twelvedata_single_row() {
    let provider = FakeProvider::scripted(vec![json!({
        "values": [{"datetime": "2023-01-01", "open": "1.0", "high": "2.0",
                    "low": "0.5", "close": "1.5", "volume": "100"}]
    })]);
    let importer = TwelveDataImporter::new(&provider, &Config::default().twelvedata);

    let series = importer.fetch(&TwelveDataRequest::new("AAPL")).unwrap();

    assert_eq!(series.len(), 1);
    let bar = series.first().unwrap();
    assert_eq!(bar.datetime, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
    assert_relative_eq!(bar.open, 1.0);
    assert_relative_eq!(bar.high, 2.0);
    assert_relative_eq!(bar.low, 0.5);
    assert_relative_eq!(bar.close, 1.5);
    assert_relative_eq!(bar.volume.unwrap(), 100.0);
}

// =============================================================================
// Binance pagination
// =============================================================================

#[test]
fn test_binance_stops_on_empty_page() {
    let start = end_time() - Duration::days(5 * 365);
    let page: Vec<Value> = (0..1000)
        .map(|i| kline(start.timestamp_millis() + i * HOUR_MS))
        .collect();
    let provider = FakeProvider::scripted(vec![Value::Array(page), json!([])]);
    let importer = BinanceImporter::new(&provider, &Config::default().binance);

    let request = BinanceRequest::new("HBARUSDT", "1h", BinanceWindow::Historical);
    let series = importer.fetch_until(&request, end_time()).unwrap();

    assert_eq!(provider.request_count(), 2);
    assert_eq!(series.len(), 1000);
    assert_eq!(series.first().unwrap().time_stamp, start);
    assert_eq!(
        series.last().unwrap().time_stamp,
        start + Duration::hours(999)
    );

    let requests = provider.requests();
    let second_start: i64 = requests[1].param("startTime").unwrap().parse().unwrap();
    assert_eq!(second_start, start.timestamp_millis() + 1000 * HOUR_MS);
}

#[test]
fn test_binance_pages_cover_window() {
    let provider = kline_server(end_time());
    let importer = BinanceImporter::new(&provider, &Config::default().binance);

    let request = BinanceRequest::new("HBARUSDT", "1h", BinanceWindow::RecentHours(2500));
    let series = importer.fetch_until(&request, end_time()).unwrap();

    // ceil(2500 / 1000) pages, the last one reaching the window end
    assert_eq!(provider.request_count(), 3);
    assert_eq!(series.len(), 2500);
    assert!(series.is_sorted());
    assert_eq!(
        series.last().unwrap().time_stamp,
        end_time() - Duration::hours(1)
    );

    let starts: Vec<i64> = provider
        .requests()
        .iter()
        .map(|r| r.param("startTime").unwrap().parse().unwrap())
        .collect();
    let window_start = (end_time() - Duration::hours(2500)).timestamp_millis();
    assert_eq!(
        starts,
        vec![
            window_start,
            window_start + 1000 * HOUR_MS,
            window_start + 2000 * HOUR_MS
        ]
    );
}

#[test]
fn test_binance_exact_multiple_of_page() {
    let provider = kline_server(end_time());
    let importer = BinanceImporter::new(&provider, &Config::default().binance);

    let request = BinanceRequest::new("HBARUSDT", "1h", BinanceWindow::RecentHours(2000));
    let series = importer.fetch_until(&request, end_time()).unwrap();

    // Cursor lands exactly on the window end, no trailing request
    assert_eq!(provider.request_count(), 2);
    assert_eq!(series.len(), 2000);
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_repeated_imports_are_identical() {
    let provider = coingecko_provider();
    let config = Config::default();
    let importers = Importers::with_http(&provider, &config);

    let first = importers.coingecko.fetch(&CoinGeckoRequest::default()).unwrap();
    let second = importers.coingecko.fetch(&CoinGeckoRequest::default()).unwrap();
    assert_eq!(first, second);

    let mut first_csv = Vec::new();
    let mut second_csv = Vec::new();
    first.write_csv(&mut first_csv).unwrap();
    second.write_csv(&mut second_csv).unwrap();
    assert_eq!(first_csv, second_csv);

    let klines = kline_server(end_time());
    let binance = BinanceImporter::new(&klines, &config.binance);
    let request = BinanceRequest::default();
    assert_eq!(
        binance.fetch_until(&request, end_time()).unwrap(),
        binance.fetch_until(&request, end_time()).unwrap()
    );
}
