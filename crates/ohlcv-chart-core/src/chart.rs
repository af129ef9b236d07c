use chrono::{DateTime, SecondsFormat, TimeZone};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::annotation::annotation_offset_at;
use crate::candle::Candle;
use crate::error::ChartError;
use crate::figure::{
    Annotation, Axis, BarMarker, BarTrace, CandlestickTrace, Figure, Font, Layout, Line,
    PointMarker, RangeSlider, ScatterTrace, Title, Trace,
};
use crate::locale::Locale;
use crate::marker::Marker;
use crate::range::{DateRange, FILE_DATE_FORMAT};

pub const VOLUME_COLOR: &str = "#EF553B";
pub const FONT_FAMILY: &str = "Courier New, monospace";

/// Share of the date range added on each side of the x axis.
const X_PADDING: f64 = 0.005;
const PRICE_ROW_HEIGHT: f64 = 0.7;
const VOLUME_ROW_HEIGHT: f64 = 0.2;
const ROW_SPACING: f64 = 0.03;

/// Immutable description of one chart: the candles, the window they are
/// drawn in, and any buy/sell markers.
///
/// Builder methods take `self` by value; [`ChartBuilder::build`] produces the
/// [`Figure`] without touching the builder's inputs.
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    pair: String,
    range: DateRange,
    candles: Vec<Candle>,
    markers: Vec<Marker>,
    locale: Locale,
}

impl ChartBuilder {
    pub fn new(pair: impl Into<String>, range: DateRange, candles: Vec<Candle>) -> Self {
        Self {
            pair: pair.into(),
            range,
            candles,
            markers: Vec::new(),
            locale: Locale::default(),
        }
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn markers(mut self, markers: impl IntoIterator<Item = Marker>) -> Self {
        self.markers.extend(markers);
        self
    }

    /// Drop every marker added so far.
    pub fn clear_markers(mut self) -> Self {
        self.markers.clear();
        self
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    /// Markers that fall inside the chart's date range, in insertion order.
    pub fn visible_markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| self.range.contains(&m.timestamp))
    }

    pub fn title(&self) -> String {
        format!(
            "{}: {} - {}",
            self.pair,
            self.range.start.format(FILE_DATE_FORMAT),
            self.range.end.format(FILE_DATE_FORMAT)
        )
    }

    pub fn build(&self) -> Result<Figure, ChartError> {
        if self.candles.is_empty() {
            return Err(ChartError::EmptyDataset);
        }

        let tz = self.range.timezone();
        let x: Vec<String> = self
            .candles
            .iter()
            .map(|c| plot_time(&c.timestamp, tz))
            .collect();

        let mut data = vec![
            Trace::Candlestick(CandlestickTrace {
                x: x.clone(),
                open: self.candles.iter().map(|c| to_f64(c.open)).collect(),
                high: self.candles.iter().map(|c| to_f64(c.high)).collect(),
                low: self.candles.iter().map(|c| to_f64(c.low)).collect(),
                close: self.candles.iter().map(|c| to_f64(c.close)).collect(),
                showlegend: false,
                xaxis: "x".into(),
                yaxis: "y".into(),
            }),
            Trace::Bar(BarTrace {
                x,
                y: self.candles.iter().map(|c| to_f64(c.volume)).collect(),
                showlegend: false,
                marker: BarMarker {
                    color: VOLUME_COLOR.into(),
                },
                xaxis: "x2".into(),
                yaxis: "y2".into(),
            }),
        ];

        let mut annotations = Vec::new();
        for marker in &self.markers {
            if !self.range.contains(&marker.timestamp) {
                debug!(
                    "dropping {:?} marker at {} outside {} - {}",
                    marker.kind, marker.timestamp, self.range.start, self.range.end
                );
                continue;
            }

            let when = plot_time(&marker.timestamp, tz);
            data.push(Trace::Scatter(ScatterTrace {
                x: vec![when.clone()],
                y: vec![to_f64(marker.price)],
                mode: "markers+text".into(),
                showlegend: false,
                marker: PointMarker {
                    color: marker.kind.color().into(),
                    line: Line { width: 1 },
                    size: 7,
                },
                xaxis: "x".into(),
                yaxis: "y".into(),
            }));
            annotations.push(self.callout(marker, when)?);
        }

        Ok(Figure {
            data,
            layout: self.layout(annotations),
        })
    }

    fn callout(&self, marker: &Marker, x: String) -> Result<Annotation, ChartError> {
        let ax = annotation_offset_at(&marker.timestamp, &self.range.start, &self.range.end)?;
        Ok(Annotation {
            x,
            y: to_f64(marker.price),
            xref: "x".into(),
            yref: "y".into(),
            text: marker.callout(&self.pair, self.locale, self.range.timezone()),
            showarrow: true,
            font: Font {
                family: FONT_FAMILY.into(),
                size: 12,
                color: Some("#000000".into()),
            },
            arrowhead: 2,
            arrowsize: 1.0,
            arrowwidth: 2.0,
            arrowcolor: "#636363".into(),
            ax,
            bordercolor: "#c7c7c7".into(),
            borderwidth: 1,
            borderpad: 1,
            bgcolor: "#ff7f0e".into(),
            opacity: 0.6,
        })
    }

    fn layout(&self, annotations: Vec<Annotation>) -> Layout {
        let strings = self.locale.strings();
        let tz = self.range.timezone();
        let padded = self.range.padded(X_PADDING);
        let (price_domain, volume_domain) = row_domains();

        Layout {
            title: Title {
                text: self.title(),
                x: Some(0.5),
                y: Some(0.94),
                xanchor: Some("center".into()),
                yanchor: Some("top".into()),
            },
            font: Font {
                family: FONT_FAMILY.into(),
                size: 15,
                color: None,
            },
            xaxis: Axis {
                anchor: Some("y".into()),
                matches: Some("x2".into()),
                range: Some([plot_time(&padded.start, tz), plot_time(&padded.end, tz)]),
                rangeslider: Some(RangeSlider { visible: false }),
                showticklabels: Some(false),
                ..Axis::default()
            },
            yaxis: Axis {
                title: Some(Title::plain(strings.price_axis)),
                domain: Some(price_domain),
                anchor: Some("x".into()),
                ..Axis::default()
            },
            xaxis2: Axis {
                title: Some(Title::plain(strings.time_axis)),
                anchor: Some("y2".into()),
                ..Axis::default()
            },
            yaxis2: Axis {
                title: Some(Title::plain(strings.volume_axis)),
                domain: Some(volume_domain),
                anchor: Some("x2".into()),
                ..Axis::default()
            },
            annotations,
        }
    }
}

/// Vertical domains of the price and volume rows, top row first.
fn row_domains() -> ([f64; 2], [f64; 2]) {
    let usable = 1.0 - ROW_SPACING;
    let total = PRICE_ROW_HEIGHT + VOLUME_ROW_HEIGHT;
    let volume_top = usable * VOLUME_ROW_HEIGHT / total;
    ([volume_top + ROW_SPACING, 1.0], [0.0, volume_top])
}

fn plot_time<T: TimeZone>(t: &DateTime<T>, tz: Tz) -> String {
    t.with_timezone(&tz).to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}
