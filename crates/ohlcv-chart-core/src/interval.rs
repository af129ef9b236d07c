use crate::error::ChartError;

/// Number of candles a chart should show before it starts to look dense.
pub const OPTIMAL_POINTS: usize = 500;

/// Human aliases for the interval labels used by the market-data endpoint.
/// Labels are the interval length in seconds.
pub const INTERVAL_ALIASES: &[(&str, &str)] = &[
    ("1m", "60"),
    ("3m", "180"),
    ("5m", "300"),
    ("15m", "900"),
    ("30m", "1800"),
    ("1h", "3600"),
    ("2h", "7200"),
    ("4h", "14400"),
    ("6h", "21600"),
    ("12h", "43200"),
    ("1d", "86400"),
    ("3d", "259200"),
    ("1w", "604800"),
];

/// Map an alias such as `1h` to its endpoint label (`3600`).
/// Anything that is not a known alias is returned unchanged.
pub fn resolve_interval_alias(interval: &str) -> &str {
    INTERVAL_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(interval))
        .map(|(_, label)| *label)
        .unwrap_or(interval)
}

/// Pick the interval bucket to chart.
///
/// A non-empty `forced` label wins and is returned as-is, even if it is not
/// one of `buckets`. Otherwise the bucket with the fewest candles that still
/// exceeds [`OPTIMAL_POINTS`] is chosen. When no bucket is that large, the
/// largest one is used, and `None` is returned if even that one is empty.
///
/// Buckets with the same count are ordered by label, so the result does not
/// depend on the iteration order of `buckets`.
pub fn select_interval<'a, I>(forced: Option<&str>, buckets: I) -> Result<Option<String>, ChartError>
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    if let Some(label) = forced
        && !label.is_empty()
    {
        return Ok(Some(label.to_string()));
    }

    let mut sorted: Vec<(&str, usize)> = buckets.into_iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    if let Some((label, _)) = sorted.iter().find(|(_, count)| *count > OPTIMAL_POINTS) {
        return Ok(Some(label.to_string()));
    }

    match sorted.last() {
        None => Err(ChartError::EmptyDataset),
        Some((_, 0)) => Ok(None),
        Some((label, _)) => Ok(Some(label.to_string())),
    }
}
