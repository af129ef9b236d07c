use chrono::{DateTime, Duration, NaiveDate, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ChartError;

/// Format accepted for chart start and end dates.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Format used for dates in file names and chart titles.
pub const FILE_DATE_FORMAT: &str = "%d-%m-%Y";
/// Time zone charts are drawn in unless told otherwise.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Madrid;

/// Inclusive time window a chart covers, in the chart's time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl DateRange {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self { start, end }
    }

    /// Build a range from optional `dd/mm/YYYY` strings.
    ///
    /// A missing start means one day before `now`, a missing end means `now`.
    /// Parsed dates are localized at midnight in `tz`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<Self, ChartError> {
        let now = now.with_timezone(&tz).trunc_subsecs(0);

        let start = match start {
            Some(s) if !s.is_empty() => parse_date(s, tz)?,
            _ => now - Duration::days(1),
        };
        let end = match end {
            Some(s) if !s.is_empty() => parse_date(s, tz)?,
            _ => now,
        };

        Ok(Self { start, end })
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    /// `(after, before)` bounds in POSIX seconds for the market-data query.
    pub fn posix_bounds(&self) -> (i64, i64) {
        (self.start.timestamp(), self.end.timestamp())
    }

    /// Whether `t` falls inside the range. Both ends are included.
    pub fn contains<T: TimeZone>(&self, t: &DateTime<T>) -> bool {
        let t = t.timestamp();
        t >= self.start.timestamp() && t <= self.end.timestamp()
    }

    /// The range widened on both sides by `fraction` of its length.
    pub fn padded(&self, fraction: f64) -> Self {
        let span_ms = (self.end - self.start).num_milliseconds() as f64;
        let pad = Duration::milliseconds((span_ms * fraction) as i64);
        Self {
            start: self.start - pad,
            end: self.end + pad,
        }
    }

    /// `(start, end)` formatted as `dd-mm-YYYY`.
    pub fn file_dates(&self) -> (String, String) {
        (
            self.start.format(FILE_DATE_FORMAT).to_string(),
            self.end.format(FILE_DATE_FORMAT).to_string(),
        )
    }
}

/// Parse a `dd/mm/YYYY` date and place it at local midnight in `tz`.
pub fn parse_date(s: &str, tz: Tz) -> Result<DateTime<Tz>, ChartError> {
    let date = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| ChartError::InvalidDate(format!("'{s}': {e}")))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ChartError::InvalidDate(format!("'{s}': no midnight")))?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .ok_or_else(|| ChartError::InvalidDate(format!("'{s}': does not exist in {tz}")))
}
