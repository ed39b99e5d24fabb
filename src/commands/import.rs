//! Import commands: fetch one series and print it as CSV

use anyhow::{Context, Result};
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use price_importers::{
    Bar, BinanceRequest, BinanceWindow, CoinGeckoRequest, Config, CryptoCompareRequest,
    HistoInterval, Importers, PriceSeries, TwelveDataRequest,
};

/// Configuration from file, or defaults; both take the API key from the environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Loaded configuration from: {}", path.display());
            Ok(config)
        }
        None => Ok(Config::from_env()),
    }
}

fn importers(config: &Config) -> Result<Importers> {
    Importers::from_config(config).context("Failed to build HTTP client")
}

fn emit<B: Bar + Serialize>(series: &PriceSeries<B>) -> Result<()> {
    if series.is_empty() {
        warn!("No rows returned");
    }
    series
        .write_csv(io::stdout().lock())
        .context("Failed to write CSV to stdout")?;
    info!("Wrote {} rows", series.len());
    Ok(())
}

pub fn coingecko(
    config: &Config,
    coin_id: String,
    vs_currency: String,
    days: u32,
    with_volume: bool,
) -> Result<()> {
    let request = CoinGeckoRequest {
        coin_id,
        vs_currency,
        days,
        with_volume,
    };
    let series = importers(config)?.coingecko.fetch(&request)?;
    emit(&series)
}

pub fn cryptocompare(
    config: &Config,
    symbol: String,
    interval: HistoInterval,
    aggregate: u32,
    market: String,
    limit: u32,
) -> Result<()> {
    let request = CryptoCompareRequest {
        symbol,
        interval,
        aggregate,
        market,
        limit,
    };
    let series = importers(config)?.cryptocompare.fetch(&request)?;
    emit(&series)
}

pub fn binance(
    config: &Config,
    symbol: String,
    interval: String,
    limit: u32,
    current: bool,
) -> Result<()> {
    let request = BinanceRequest::new(symbol, interval, BinanceWindow::from_limit(limit, current));
    info!(
        "Binance window: {:?}, cursor advance: {:?}",
        request.window, config.binance.cursor_advance
    );
    let series = importers(config)?.binance.fetch(&request)?;
    emit(&series)
}

pub fn twelvedata(config: &Config, symbol: String, interval: String, outputsize: u32) -> Result<()> {
    if config.twelvedata.api_key.is_none() {
        warn!("No TwelveData API key configured, the request will be rejected");
    }
    let request = TwelveDataRequest {
        symbol,
        interval,
        outputsize,
    };
    let series = importers(config)?.twelvedata.fetch(&request)?;
    emit(&series)
}
