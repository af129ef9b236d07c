use std::collections::BTreeMap;

use crate::candle::Candle;
use crate::error::ChartError;
use crate::interval;

/// Every interval granularity returned by one market-data request,
/// keyed by interval label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalBuckets {
    buckets: BTreeMap<String, Vec<Candle>>,
}

impl IntervalBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bucket, sorting its candles by timestamp.
    pub fn insert(&mut self, label: impl Into<String>, mut candles: Vec<Candle>) {
        candles.sort_by_key(|c| c.timestamp);
        self.buckets.insert(label.into(), candles);
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Candle count per label.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.buckets.iter().map(|(label, c)| (label.as_str(), c.len()))
    }

    pub fn get(&self, label: &str) -> Option<&[Candle]> {
        self.buckets.get(label).map(Vec::as_slice)
    }

    /// Choose the interval to chart and take its candles out of the set.
    pub fn take_optimal(&mut self, forced: Option<&str>) -> Result<(String, Vec<Candle>), ChartError> {
        let label = interval::select_interval(forced, self.counts())?
            .ok_or(ChartError::EmptyDataset)?;
        let candles = self
            .buckets
            .remove(&label)
            .ok_or_else(|| ChartError::UnknownInterval(label.clone()))?;
        Ok((label, candles))
    }
}

impl FromIterator<(String, Vec<Candle>)> for IntervalBuckets {
    fn from_iter<T: IntoIterator<Item = (String, Vec<Candle>)>>(iter: T) -> Self {
        let mut buckets = Self::new();
        for (label, candles) in iter {
            buckets.insert(label, candles);
        }
        buckets
    }
}
