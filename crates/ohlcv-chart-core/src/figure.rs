//! Render description handed to Plotly.js.
//!
//! Field names follow Plotly's figure schema so a [`Figure`] serializes
//! straight into the `data`/`layout` pair the library expects.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// Number of buy/sell points overlaid on the candlesticks.
    pub fn marker_count(&self) -> usize {
        self.data
            .iter()
            .filter(|t| matches!(t, Trace::Scatter(_)))
            .count()
    }

    pub fn callout_count(&self) -> usize {
        self.layout.annotations.len()
    }

    pub fn candle_count(&self) -> usize {
        self.data
            .iter()
            .find_map(|t| match t {
                Trace::Candlestick(c) => Some(c.x.len()),
                _ => None,
            })
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Candlestick(CandlestickTrace),
    Bar(BarTrace),
    Scatter(ScatterTrace),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickTrace {
    pub x: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub showlegend: bool,
    pub xaxis: String,
    pub yaxis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarTrace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub showlegend: bool,
    pub marker: BarMarker,
    pub xaxis: String,
    pub yaxis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarMarker {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterTrace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: String,
    pub showlegend: bool,
    pub marker: PointMarker,
    pub xaxis: String,
    pub yaxis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub color: String,
    pub line: Line,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Text callout attached to a point, with an arrow back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: String,
    pub y: f64,
    pub xref: String,
    pub yref: String,
    pub text: String,
    pub showarrow: bool,
    pub font: Font,
    pub arrowhead: u32,
    pub arrowsize: f64,
    pub arrowwidth: f64,
    pub arrowcolor: String,
    /// Horizontal offset of the box from the point, in pixels.
    pub ax: i32,
    pub bordercolor: String,
    pub borderwidth: u32,
    pub borderpad: u32,
    pub bgcolor: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
}

impl Title {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            x: None,
            y: None,
            xanchor: None,
            yanchor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[String; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showticklabels: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub font: Font,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub xaxis2: Axis,
    pub yaxis2: Axis,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}
