//! Price Importers
//!
//! Small blocking clients that fetch historical price data and return it as
//! ordered time-series tables:
//! - **CoinGecko**: OHLC candles, optionally asof-joined with daily volume
//! - **CryptoCompare**: OHLCV with base/quote volume split
//! - **Binance**: klines, paged through the 1000-kline limit
//! - **TwelveData**: equities/forex bars (API key required)
//!
//! ## Example
//! ```no_run
//! use price_importers::{BinanceRequest, BinanceWindow, Config, Importers};
//!
//! fn main() -> anyhow::Result<()> {
//!     let importers = Importers::from_config(&Config::from_env())?;
//!     let request = BinanceRequest::new("BTCUSDT", "1h", BinanceWindow::RecentHours(48));
//!     let klines = importers.binance.fetch(&request)?;
//!     println!("Fetched {} klines", klines.len());
//!     Ok(())
//! }
//! ```

pub mod binance;
pub mod coingecko;
pub mod config;
pub mod cryptocompare;
pub mod error;
pub mod http;
pub mod importers;
pub mod series;
pub mod twelvedata;
pub mod types;

pub use binance::{BinanceImporter, BinanceKline, BinanceRequest, BinanceWindow};
pub use coingecko::{CoinGeckoImporter, CoinGeckoRequest};
pub use config::{Config, CursorAdvance};
pub use cryptocompare::{CryptoCompareBar, CryptoCompareImporter, CryptoCompareRequest, HistoInterval};
pub use error::{ImportError, ImportResult};
pub use http::{HttpClient, HttpFetch};
pub use importers::Importers;
pub use series::PriceSeries;
pub use twelvedata::{TwelveDataBar, TwelveDataImporter, TwelveDataRequest};
pub use types::*;
