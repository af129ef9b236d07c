use async_trait::async_trait;
use ohlcv_chart_core::buckets::IntervalBuckets;
use ohlcv_chart_core::candle::Candle;
use ohlcv_chart_core::range::DateRange;
use tracing::info;

use crate::error::ProviderError;

/// Trait for fetching OHLCV data for a trading pair from an external source.
#[async_trait]
pub trait OhlcProvider: Send + Sync {
    /// Provider name (for logging/display).
    fn name(&self) -> &str;

    /// Fetch every interval granularity the source has between `after` and
    /// `before` (POSIX seconds). Candles in each bucket are sorted by timestamp.
    async fn fetch_buckets(
        &self,
        pair: &str,
        after: i64,
        before: i64,
    ) -> Result<IntervalBuckets, ProviderError>;
}

/// Fetch the candles to chart for `pair` over `range`.
///
/// Uses `forced` as the interval label when given, otherwise picks the
/// granularity with a readable number of candles. Returns the chosen label
/// alongside its candles.
pub async fn fetch_chart_candles(
    provider: &dyn OhlcProvider,
    pair: &str,
    range: &DateRange,
    forced: Option<&str>,
) -> Result<(String, Vec<Candle>), ProviderError> {
    let (after, before) = range.posix_bounds();
    let mut buckets = provider.fetch_buckets(pair, after, before).await?;
    info!(
        "{pair}: {} received {} interval bucket(s)",
        provider.name(),
        buckets.len()
    );

    let (label, candles) = buckets.take_optimal(forced)?;
    info!("{pair}: using interval {label} with {} candle(s)", candles.len());
    Ok((label, candles))
}
