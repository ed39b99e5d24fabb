//! All four importers built from one configuration

use crate::binance::BinanceImporter;
use crate::coingecko::CoinGeckoImporter;
use crate::config::Config;
use crate::cryptocompare::CryptoCompareImporter;
use crate::error::ImportResult;
use crate::http::{HttpClient, HttpFetch};
use crate::twelvedata::TwelveDataImporter;

/// Importers sharing a single HTTP transport
#[derive(Debug, Clone)]
pub struct Importers<H = HttpClient> {
    pub coingecko: CoinGeckoImporter<H>,
    pub cryptocompare: CryptoCompareImporter<H>,
    pub binance: BinanceImporter<H>,
    pub twelvedata: TwelveDataImporter<H>,
}

impl Importers {
    /// Build the blocking HTTP client from `config.http` and every importer on top of it
    pub fn from_config(config: &Config) -> ImportResult<Self> {
        let http = HttpClient::new(&config.http)?;
        Ok(Self::with_http(http, config))
    }
}

impl<H: HttpFetch + Clone> Importers<H> {
    pub fn with_http(http: H, config: &Config) -> Self {
        Importers {
            coingecko: CoinGeckoImporter::new(http.clone(), &config.coingecko),
            cryptocompare: CryptoCompareImporter::new(http.clone(), &config.cryptocompare),
            binance: BinanceImporter::new(http.clone(), &config.binance),
            twelvedata: TwelveDataImporter::new(http, &config.twelvedata),
        }
    }
}
