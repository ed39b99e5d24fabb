//! Core data types shared by the importers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};

/// Common view over one row of any price series
pub trait Bar {
    fn timestamp(&self) -> DateTime<Utc>;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    /// Traded volume in the base asset, when the source reports one
    fn volume(&self) -> Option<f64> {
        None
    }

    fn to_price_bar(&self) -> PriceBar {
        PriceBar {
            timestamp: self.timestamp(),
            open: self.open(),
            high: self.high(),
            low: self.low(),
            close: self.close(),
            volume: self.volume(),
        }
    }
}

/// OHLC candlestick with optional volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        PriceBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

impl Bar for PriceBar {
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
        self.volume
    }
}

/// A (timestamp, volume) observation used for asof joins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub timestamp: DateTime<Utc>,
    pub volume: f64,
}

/// Epoch milliseconds to an instant
pub(crate) fn from_millis(endpoint: &'static str, millis: i64) -> ImportResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| ImportError::schema(endpoint, format!("timestamp out of range: {millis}ms")))
}

/// Epoch seconds to an instant
pub(crate) fn from_secs(endpoint: &'static str, secs: i64) -> ImportResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ImportError::schema(endpoint, format!("timestamp out of range: {secs}s")))
}
