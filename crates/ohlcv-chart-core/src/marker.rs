use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::locale::Locale;

/// Format of marker times, in the chart's time zone.
pub const MARKER_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

pub const BUY_COLOR: &str = "#bbdc86";
pub const SELL_COLOR: &str = "#e70039";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Buy,
    Sell,
}

impl MarkerKind {
    pub fn color(&self) -> &'static str {
        match self {
            MarkerKind::Buy => BUY_COLOR,
            MarkerKind::Sell => SELL_COLOR,
        }
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        let strings = locale.strings();
        match self {
            MarkerKind::Buy => strings.buy,
            MarkerKind::Sell => strings.sell,
        }
    }
}

impl FromStr for MarkerKind {
    type Err = ChartError;

    /// Accepts English and Spanish words or their initials.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "b" | "buy" | "c" | "compra" => Ok(MarkerKind::Buy),
            "s" | "sell" | "v" | "venta" => Ok(MarkerKind::Sell),
            other => Err(ChartError::InvalidMarker(format!("unknown kind '{other}'"))),
        }
    }
}

/// A buy or sell event to overlay on the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Marker {
    pub fn new<T: TimeZone>(
        kind: MarkerKind,
        quantity: Decimal,
        price: Decimal,
        timestamp: DateTime<T>,
    ) -> Self {
        Self {
            kind,
            quantity,
            price,
            timestamp: timestamp.with_timezone(&Utc),
        }
    }

    /// Build a marker from a `dd/mm/YYYY HH:MM` time local to `tz`.
    pub fn parse(
        kind: MarkerKind,
        quantity: Decimal,
        price: Decimal,
        time: &str,
        tz: Tz,
    ) -> Result<Self, ChartError> {
        Ok(Self::new(kind, quantity, price, parse_marker_time(time, tz)?))
    }

    /// Callout text shown next to the point, e.g. `Buy 0.5 BTC at 40000 € <br> 01/02/2018 22:13`.
    pub fn callout(&self, pair: &str, locale: Locale, tz: Tz) -> String {
        format!(
            "{} {} {} {} {} € <br> {}",
            self.kind.label(locale),
            self.quantity,
            coin_symbol(pair),
            locale.strings().at,
            self.price,
            self.timestamp.with_timezone(&tz).format(MARKER_TIME_FORMAT),
        )
    }
}

pub fn parse_marker_time(s: &str, tz: Tz) -> Result<DateTime<Tz>, ChartError> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), MARKER_TIME_FORMAT)
        .map_err(|e| ChartError::InvalidMarker(format!("invalid time '{s}': {e}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ChartError::InvalidMarker(format!("time '{s}' does not exist in {tz}")))
}

/// Base coin of a pair quoted in a three-letter currency (`btceur` -> `BTC`).
pub fn coin_symbol(pair: &str) -> String {
    let end = pair.len().saturating_sub(3);
    pair.get(..end).unwrap_or(pair).to_uppercase()
}
