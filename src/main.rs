//! Price importers - command line entry point
//!
//! One subcommand per provider. The fetched table is written to stdout as
//! CSV; logs go to stderr and to `logs/`.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use price_importers::{CursorAdvance, HistoInterval};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "price-importers")]
#[command(about = "Fetch historical prices from CoinGecko, CryptoCompare, Binance and TwelveData", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to JSON configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// OHLC candles from CoinGecko, optionally with volume
    Coingecko {
        /// CoinGecko coin id
        #[arg(long, default_value = "hedera-hashgraph")]
        coin: String,

        /// Quote currency
        #[arg(long, default_value = "usd")]
        vs_currency: String,

        /// Number of days of history
        #[arg(short, long, default_value = "365")]
        days: u32,

        /// Skip the market_chart volume request
        #[arg(long)]
        no_volume: bool,
    },

    /// OHLCV candles from CryptoCompare
    Cryptocompare {
        /// Base symbol. E.g., "HBAR"
        #[arg(short, long, default_value = "HBAR")]
        symbol: String,

        /// histoday, histohour or histominute
        #[arg(short, long, default_value = "histoday")]
        interval: HistoInterval,

        /// Candle size multiplier
        #[arg(short, long, default_value = "1")]
        aggregate: u32,

        /// Quote currency. E.g., "USD" or "USDT"
        #[arg(short, long, default_value = "USDT")]
        market: String,

        /// Number of candles
        #[arg(short, long, default_value = "365")]
        limit: u32,
    },

    /// Klines from Binance, paged through the whole window
    Binance {
        /// Trading pair. E.g., "HBARUSDT"
        #[arg(short, long, default_value = "HBARUSDT")]
        symbol: String,

        /// Kline interval. E.g., "1h", "4h", "1d"
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Window in hours (ignored with --historical)
        #[arg(short, long, default_value = "10")]
        limit: u32,

        /// Fetch the last five years instead of the last `limit` hours
        #[arg(long)]
        historical: bool,

        /// Cursor advance between pages (overrides config file)
        #[arg(long, value_enum)]
        cursor_advance: Option<CursorArg>,
    },

    /// Time series from TwelveData (needs TWELVEDATA_API_KEY)
    Twelvedata {
        /// Instrument symbol. E.g., "AAPL", "EUR/USD"
        #[arg(short, long)]
        symbol: String,

        /// Bar interval. E.g., "1h", "1day"
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Maximum number of bars
        #[arg(short, long, default_value = "1000")]
        outputsize: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CursorArg {
    OneHour,
    MatchInterval,
}

impl From<CursorArg> for CursorAdvance {
    fn from(arg: CursorArg) -> Self {
        match arg {
            CursorArg::OneHour => CursorAdvance::OneHour,
            CursorArg::MatchInterval => CursorAdvance::MatchInterval,
        }
    }
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Console on stderr, stdout carries the CSV table
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Coingecko { .. } => "coingecko",
        Commands::Cryptocompare { .. } => "cryptocompare",
        Commands::Binance { .. } => "binance",
        Commands::Twelvedata { .. } => "twelvedata",
    };

    setup_logging(cli.verbose, command_name)?;

    let mut config = commands::import::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Coingecko {
            coin,
            vs_currency,
            days,
            no_volume,
        } => commands::import::coingecko(&config, coin, vs_currency, days, !no_volume),

        Commands::Cryptocompare {
            symbol,
            interval,
            aggregate,
            market,
            limit,
        } => commands::import::cryptocompare(&config, symbol, interval, aggregate, market, limit),

        Commands::Binance {
            symbol,
            interval,
            limit,
            historical,
            cursor_advance,
        } => {
            if let Some(cursor_advance) = cursor_advance {
                config.binance.cursor_advance = cursor_advance.into();
            }
            commands::import::binance(&config, symbol, interval, limit, !historical)
        }

        Commands::Twelvedata {
            symbol,
            interval,
            outputsize,
        } => commands::import::twelvedata(&config, symbol, interval, outputsize),
    }
}
