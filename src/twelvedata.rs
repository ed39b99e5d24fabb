//! TwelveData time series importer (equities, forex and crypto)

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::config::TwelveDataConfig;
use crate::error::{ImportError, ImportResult};
use crate::http::{decode, HttpClient, HttpFetch};
use crate::series::PriceSeries;
use crate::types::Bar;

const ENDPOINT: &str = "twelvedata/time_series";

/// Parameters of one TwelveData import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwelveDataRequest {
    /// Instrument symbol, e.g. "AAPL" or "HBAR/USD"
    pub symbol: String,
    /// Bar interval, e.g. "1h" or "1day"
    pub interval: String,
    /// Maximum number of bars
    pub outputsize: u32,
}

impl TwelveDataRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        TwelveDataRequest {
            symbol: symbol.into(),
            interval: "1h".to_string(),
            outputsize: 1000,
        }
    }
}

/// One TwelveData bar, keyed by the provider's `datetime` column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwelveDataBar {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// None for forex pairs
    pub volume: Option<f64>,
}

impl Bar for TwelveDataBar {
    fn timestamp(&self) -> DateTime<Utc> {
        self.datetime
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
        self.volume
    }
}

/// Numeric field sent either as a JSON string or a JSON number
#[derive(Debug, Clone, Copy)]
struct Numeric(f64);

impl<'de> Deserialize<'de> for Numeric {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct NumericVisitor;

        impl<'de> Visitor<'de> for NumericVisitor {
            type Value = Numeric;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a number or a numeric string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.trim()
                    .parse()
                    .map(Numeric)
                    .map_err(|_| E::custom(format!("not a number: {v:?}")))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Numeric(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Numeric(v as f64))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Numeric(v as f64))
            }
        }

        deserializer.deserialize_any(NumericVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    values: Option<Vec<TimeSeriesRow>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesRow {
    datetime: String,
    open: Numeric,
    high: Numeric,
    low: Numeric,
    close: Numeric,
    /// Absent for forex pairs
    #[serde(default)]
    volume: Option<Numeric>,
}

impl TimeSeriesRow {
    fn into_bar(self) -> ImportResult<TwelveDataBar> {
        Ok(TwelveDataBar {
            datetime: parse_datetime(&self.datetime)?,
            open: self.open.0,
            high: self.high.0,
            low: self.low.0,
            close: self.close.0,
            volume: self.volume.map(|v| v.0),
        })
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (daily and longer bars)
fn parse_datetime(value: &str) -> ImportResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        .map_err(|_| ImportError::schema(ENDPOINT, format!("unparsable datetime {value:?}")))
}

/// Imports OHLCV series from TwelveData's `/time_series` endpoint
#[derive(Debug, Clone)]
pub struct TwelveDataImporter<H = HttpClient> {
    http: H,
    base_url: String,
    api_key: Option<String>,
    timezone: Option<String>,
}

impl<H: HttpFetch> TwelveDataImporter<H> {
    /// The API key comes from `config`; without one the provider rejects the
    /// request and the rejection surfaces as [`ImportError::Provider`]
    pub fn new(http: H, config: &TwelveDataConfig) -> Self {
        TwelveDataImporter {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timezone: config.timezone.clone(),
        }
    }

    /// Fetch bars sorted ascending by datetime
    pub fn fetch(
        &self,
        request: &TwelveDataRequest,
    ) -> ImportResult<PriceSeries<TwelveDataBar>> {
        let url = format!("{}/time_series", self.base_url);

        let mut params = vec![
            ("symbol", request.symbol.clone()),
            ("interval", request.interval.clone()),
            ("outputsize", request.outputsize.to_string()),
        ];
        if let Some(api_key) = &self.api_key {
            params.push(("apikey", api_key.clone()));
        }
        if let Some(timezone) = &self.timezone {
            params.push(("timezone", timezone.clone()));
        }

        let response: TimeSeriesResponse = decode(ENDPOINT, self.http.get_json(&url, &params)?)?;

        let Some(values) = response.values else {
            let err = ImportError::provider(&request.symbol, response.message);
            warn!("{}", err);
            return Err(err);
        };

        let bars = values
            .into_iter()
            .map(TimeSeriesRow::into_bar)
            .collect::<ImportResult<Vec<_>>>()?;

        info!(
            "Imported {} TwelveData {} bars for {}",
            bars.len(),
            request.interval,
            request.symbol
        );

        Ok(PriceSeries::sorted(bars))
    }
}
