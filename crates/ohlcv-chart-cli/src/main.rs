mod snapshot;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use ohlcv_chart_core::chart::ChartBuilder;
use ohlcv_chart_core::html::write_html;
use ohlcv_chart_core::interval::{INTERVAL_ALIASES, resolve_interval_alias};
use ohlcv_chart_core::locale::Locale;
use ohlcv_chart_core::marker::{Marker, MarkerKind};
use ohlcv_chart_core::output::{ArtifactPaths, DEFAULT_OUTPUT_DIR};
use ohlcv_chart_core::range::DateRange;
use ohlcv_chart_providers::cryptowatch::CryptowatchProvider;
use ohlcv_chart_providers::provider::fetch_chart_candles;
use rust_decimal::Decimal;
use tracing::info;

use crate::snapshot::{DEFAULT_WEBDRIVER_URL, WebDriverSnapshot, show_in_browser};

#[derive(Parser)]
#[command(
    name = "ohlcv-chart",
    about = "Render OHLCV candlestick charts with buy/sell markers"
)]
struct Cli {
    /// Directory for HTML and PNG output
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Language of chart labels: en, es
    #[arg(long, default_value = "en")]
    locale: Locale,

    /// Time zone dates are interpreted and drawn in
    #[arg(long, default_value = "Europe/Madrid")]
    timezone: String,

    /// Market-data API base URL
    #[arg(long, default_value = "https://api.cryptowat.ch")]
    base_url: String,

    /// Exchange to read candles from
    #[arg(long, default_value = "kraken")]
    exchange: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch candles for a pair and write the chart
    Render {
        /// Trading pair, e.g. btceur
        #[arg(short, long)]
        pair: String,

        /// Start date (dd/mm/YYYY, defaults to one day ago)
        #[arg(long)]
        start: Option<String>,

        /// End date (dd/mm/YYYY, defaults to now)
        #[arg(long)]
        end: Option<String>,

        /// Candle interval label or alias (60, 1h, ...); picked automatically if omitted
        #[arg(short, long)]
        interval: Option<String>,

        /// Buy/sell marker: KIND,QUANTITY,PRICE,dd/mm/YYYY HH:MM (repeatable)
        #[arg(short, long = "marker", value_parser = parse_marker_arg)]
        markers: Vec<MarkerArg>,

        /// Also capture a PNG screenshot through a WebDriver server
        #[arg(long)]
        png: bool,

        /// Open the written chart in the default browser
        #[arg(long)]
        show: bool,

        /// WebDriver server used for --png
        #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
        webdriver_url: String,
    },

    /// List interval aliases accepted by --interval
    Intervals,
}

/// A `--marker` value before its time is placed in the chart's time zone.
#[derive(Debug, Clone, PartialEq)]
struct MarkerArg {
    kind: MarkerKind,
    quantity: Decimal,
    price: Decimal,
    time: String,
}

impl MarkerArg {
    fn to_marker(&self, tz: Tz) -> Result<Marker> {
        Marker::parse(self.kind, self.quantity, self.price, &self.time, tz)
            .with_context(|| format!("invalid marker time '{}'", self.time))
    }
}

fn parse_marker_arg(s: &str) -> Result<MarkerArg, String> {
    let parts: Vec<&str> = s.splitn(4, ',').map(str::trim).collect();
    let [kind, quantity, price, time] = parts[..] else {
        return Err(format!(
            "expected KIND,QUANTITY,PRICE,dd/mm/YYYY HH:MM, got '{s}'"
        ));
    };

    Ok(MarkerArg {
        kind: kind.parse().map_err(|e| format!("{e}"))?,
        quantity: quantity
            .parse()
            .map_err(|e| format!("invalid quantity '{quantity}': {e}"))?,
        price: price
            .parse()
            .map_err(|e| format!("invalid price '{price}': {e}"))?,
        time: time.to_string(),
    })
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("invalid time zone '{name}': {e}"))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_render(
    cli: &Cli,
    pair: &str,
    start: Option<&str>,
    end: Option<&str>,
    interval: Option<&str>,
    markers: &[MarkerArg],
    png: bool,
    show: bool,
    webdriver_url: &str,
) -> Result<()> {
    let tz = parse_timezone(&cli.timezone)?;
    let range = DateRange::resolve(start, end, tz, Utc::now()).context("invalid date range")?;
    let markers = markers
        .iter()
        .map(|m| m.to_marker(tz))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "{pair}: charting {} to {} with {} marker(s)",
        range.start,
        range.end,
        markers.len()
    );

    let provider = CryptowatchProvider::with_base_url(cli.base_url.clone())
        .with_exchange(cli.exchange.as_str());
    let forced = interval.map(resolve_interval_alias);
    let (_, candles) = fetch_chart_candles(&provider, pair, &range, forced)
        .await
        .with_context(|| format!("failed to fetch candles for {pair}"))?;

    let builder = ChartBuilder::new(pair, range, candles)
        .locale(cli.locale)
        .markers(markers);
    let figure = builder.build().context("failed to build chart")?;

    let paths = ArtifactPaths::new(&cli.output_dir, builder.pair(), builder.range());
    paths
        .ensure_dir()
        .with_context(|| format!("failed to create {}", paths.dir().display()))?;

    let html = paths.html();
    write_html(&html, &figure).with_context(|| format!("failed to write {}", html.display()))?;
    info!(
        "{pair}: wrote {} candle(s), {} marker(s)",
        figure.candle_count(),
        figure.marker_count()
    );
    println!("{}", html.display());

    if show {
        show_in_browser(&html)?;
    }

    if png {
        let image = paths.png();
        WebDriverSnapshot::new(webdriver_url)
            .capture(&html, &image)
            .await?;
        println!("{}", image.display());
    }

    Ok(())
}

fn cmd_intervals() {
    for (alias, label) in INTERVAL_ALIASES {
        println!("{alias:>4}  {label}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    match &cli.command {
        Commands::Render {
            pair,
            start,
            end,
            interval,
            markers,
            png,
            show,
            webdriver_url,
        } => {
            cmd_render(
                &cli,
                &pair.to_lowercase(),
                start.as_deref(),
                end.as_deref(),
                interval.as_deref(),
                markers,
                *png,
                *show,
                webdriver_url,
            )
            .await?;
        }
        Commands::Intervals => cmd_intervals(),
    }

    Ok(())
}
