use chrono::{DateTime, TimeZone};

use crate::error::ChartError;

/// Horizontal callout offset for points in the first tenth of the range.
pub const NEAR_START_OFFSET: i32 = 100;
/// Horizontal callout offset for points in the last tenth of the range.
pub const NEAR_END_OFFSET: i32 = -100;
pub const DEFAULT_OFFSET: i32 = 20;

/// Pixel offset that keeps a callout box away from the nearest chart edge.
///
/// All times are POSIX seconds. The fraction of the range still remaining
/// after `point` decides the side: above 0.9 the box is pushed right, below
/// 0.1 it is pushed left.
pub fn annotation_offset(point: i64, start: i64, end: i64) -> Result<i32, ChartError> {
    let span = end - start;
    if span == 0 {
        return Err(ChartError::DegenerateRange);
    }

    let remaining = (end - point) as f64 / span as f64;
    if remaining > 0.9 {
        Ok(NEAR_START_OFFSET)
    } else if remaining < 0.1 {
        Ok(NEAR_END_OFFSET)
    } else {
        Ok(DEFAULT_OFFSET)
    }
}

/// [`annotation_offset`] over zoned timestamps, truncated to whole seconds.
pub fn annotation_offset_at<A, B>(
    point: &DateTime<A>,
    start: &DateTime<B>,
    end: &DateTime<B>,
) -> Result<i32, ChartError>
where
    A: TimeZone,
    B: TimeZone,
{
    annotation_offset(point.timestamp(), start.timestamp(), end.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn point_near_start_pushes_right() {
        assert_eq!(annotation_offset(50, 0, 1000).unwrap(), 100);
        assert_eq!(annotation_offset(0, 0, 1000).unwrap(), 100);
    }

    #[test]
    fn point_near_end_pushes_left() {
        assert_eq!(annotation_offset(950, 0, 1000).unwrap(), -100);
        assert_eq!(annotation_offset(1000, 0, 1000).unwrap(), -100);
    }

    #[test]
    fn point_in_middle_uses_default() {
        assert_eq!(annotation_offset(500, 0, 1000).unwrap(), 20);
    }

    #[test]
    fn thresholds_are_exclusive() {
        // remaining == 0.9 and remaining == 0.1 both fall in the middle band
        assert_eq!(annotation_offset(100, 0, 1000).unwrap(), 20);
        assert_eq!(annotation_offset(900, 0, 1000).unwrap(), 20);
    }

    #[test]
    fn zero_length_range_is_degenerate() {
        let result = annotation_offset(10, 10, 10);
        assert!(matches!(result, Err(ChartError::DegenerateRange)));
    }

    #[test]
    fn zoned_timestamps() {
        let start = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let end = Utc.timestamp_opt(1_600_001_000, 0).unwrap();
        let point = Utc.timestamp_opt(1_600_000_950, 0).unwrap();
        assert_eq!(annotation_offset_at(&point, &start, &end).unwrap(), -100);
    }
}
