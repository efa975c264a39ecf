//! ashare CLI: fetch A-share daily bars, list securities, draw candlestick charts.
//!
//! Commands:
//! - `bars` - fetch daily bars for one symbol, optionally writing a chart
//! - `list` - print exchange listings

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ashare::{
    AkToolsConfig, AkshareProvider, BarSeries, ChartConfig, DEFAULT_BASE_URL, DataError, Exchange,
    MarketDataProvider, Symbol, plot_candle,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

mod obs;

use obs::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "ashare", version, about = "A-share daily bars and candlestick charts")]
struct Cli {
    /// AKTools server address.
    #[arg(long, global = true, env = "AKTOOLS_URL", default_value = DEFAULT_BASE_URL)]
    aktools_url: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "AKTOOLS_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch daily bars for a symbol such as 000001.SZ.
    Bars(BarsArgs),
    /// List securities on the Shenzhen and Shanghai exchanges.
    List {
        /// Only this exchange (SZSE or SSE).
        #[arg(long)]
        exchange: Option<Exchange>,

        /// Print at most this many rows.
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Args)]
struct BarsArgs {
    /// Symbol in `<code>.<SZ|SH>` form.
    symbol: String,

    /// First trading date (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,

    /// Last trading date (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,

    /// Write a candlestick chart to this PNG path.
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Chart title. Defaults to "<SYMBOL> Candlestick (<start>..<end>)".
    #[arg(long)]
    title: Option<String>,

    /// Write the bars to this Parquet path.
    #[arg(long)]
    parquet: Option<PathBuf>,

    /// Fail if any upstream row had to be skipped.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = obs::init_tracing("info", cli.log_format) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AkToolsConfig::new(&cli.aktools_url)?
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let provider = AkshareProvider::with_config(&config)?;
    info!(aktools = %config.base_url, "Using AKTools server");

    match cli.command {
        Commands::Bars(args) => run_bars(&provider, &args),
        Commands::List { exchange, limit } => run_list(&provider, exchange, limit),
    }
}

fn run_bars(provider: &dyn MarketDataProvider, args: &BarsArgs) -> Result<()> {
    let symbol = Symbol::new(&args.symbol);
    let series = provider
        .daily_bars(&symbol, args.start, args.end)
        .with_context(|| format!("failed to fetch daily bars for {symbol}"))?;

    if args.strict {
        if let Some(first) = series.skipped().first() {
            let err: DataError = first.clone().into();
            bail!("{err} ({} rows skipped in total)", series.skipped().len());
        }
    }

    println!("{}", summarize(&series));
    for skip in series.skipped() {
        warn!(index = skip.index, reason = %skip.reason, "Skipped row");
    }

    if let Some(path) = &args.parquet {
        series
            .write_parquet(path)
            .with_context(|| format!("failed to write bars to {}", path.display()))?;
        println!("Bars written to {}", path.display());
    }

    if let Some(path) = &args.chart {
        let title = args
            .title
            .clone()
            .unwrap_or_else(|| default_title(&symbol, args.start, args.end));
        match plot_candle(&series, &title, path, &ChartConfig::from_env())
            .with_context(|| format!("failed to write chart to {}", path.display()))?
        {
            Some(written) => println!("Chart written to {}", written.display()),
            None => println!("No bars in range, chart not written"),
        }
    }

    Ok(())
}

fn run_list(
    provider: &AkshareProvider,
    exchange: Option<Exchange>,
    limit: Option<usize>,
) -> Result<()> {
    let securities = match exchange {
        Some(exchange) => provider.exchange_listing(exchange)?,
        None => provider.list_securities()?,
    };

    let total = securities.len();
    for security in securities.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{}\t{}\t{}",
            security.symbol(),
            security.exchange(),
            security.name()
        );
    }
    if limit.is_some_and(|n| n < total) {
        println!("... {} more", total - limit.unwrap_or(total));
    }
    info!(total, "Listed securities");
    Ok(())
}

fn summarize(series: &BarSeries) -> String {
    let mut out = format!(
        "{}: {} bars, {} skipped rows",
        series.symbol(),
        series.len(),
        series.skipped().len()
    );
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        out.push_str(&format!(
            "\n  first {} close {:.2}\n  last  {} close {:.2}",
            first.trading_date(),
            first.close(),
            last.trading_date(),
            last.close()
        ));
    }
    out
}

fn default_title(symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> String {
    format!("{symbol} Candlestick ({start}..{end})")
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {raw:?}: {e}"))
}
