//! Error types shared by all importers

use thiserror::Error;

use crate::binance::BinanceWindow;

/// Failure of a single import call
#[derive(Debug, Error)]
pub enum ImportError {
    /// Connection, timeout or body-read failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("{url} returned a body that is not JSON: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Response JSON does not have the expected shape
    #[error("unexpected response from {endpoint}: {message}")]
    Schema {
        endpoint: &'static str,
        message: String,
    },

    /// Provider answered with an error payload instead of data
    #[error("Error fetching data for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("unsupported interval '{0}'")]
    UnsupportedInterval(String),

    /// Lookback reaches before the earliest representable instant
    #[error("window {0:?} is out of range")]
    WindowOutOfRange(BinanceWindow),
}

impl ImportError {
    pub(crate) fn schema(endpoint: &'static str, message: impl Into<String>) -> Self {
        Self::Schema {
            endpoint,
            message: message.into(),
        }
    }

    /// Build a provider error, substituting `Unknown error` for a missing or blank message
    pub(crate) fn provider(symbol: &str, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());

        Self::Provider {
            symbol: symbol.to_string(),
            message,
        }
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
