use std::path::Path;

use crate::error::ChartError;
use crate::figure::Figure;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const FIGURE_ELEMENT_ID: &str = "ohlcv-figure";

/// Render a standalone HTML page that draws `figure` with Plotly.js.
///
/// The figure is embedded as JSON so the page can be read back with
/// [`load_html`].
pub fn render_html(figure: &Figure) -> Result<String, ChartError> {
    // `<` only occurs inside JSON strings, so \u003c keeps the value intact
    // and leaves nothing the HTML parser can read as markup
    let json = serde_json::to_string(figure)?.replace('<', "\\u003c");
    let title = html_escape(&figure.layout.title.text);

    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <script src="{PLOTLY_CDN}"></script>
    <style>
        html, body {{ margin: 0; height: 100%; }}
        #chart {{ width: 100%; height: 100vh; }}
    </style>
</head>
<body>
    <div id="chart"></div>
    <script type="application/json" id="{FIGURE_ELEMENT_ID}">{json}</script>
    <script>
        const figure = JSON.parse(document.getElementById("{FIGURE_ELEMENT_ID}").textContent);
        Plotly.newPlot("chart", figure.data, figure.layout, {{ scrollZoom: true, responsive: true }});
    </script>
</body>
</html>
"##
    ))
}

/// Recover the figure embedded by [`render_html`].
pub fn load_html(html: &str) -> Result<Figure, ChartError> {
    let open_tag = format!(r#"<script type="application/json" id="{FIGURE_ELEMENT_ID}">"#);
    let start = html
        .find(&open_tag)
        .map(|i| i + open_tag.len())
        .ok_or_else(|| ChartError::InvalidData("no embedded figure in document".into()))?;
    let len = html[start..]
        .find("</script>")
        .ok_or_else(|| ChartError::InvalidData("unterminated figure element".into()))?;

    Ok(serde_json::from_str(&html[start..start + len])?)
}

pub fn write_html(path: &Path, figure: &Figure) -> Result<(), ChartError> {
    std::fs::write(path, render_html(figure)?)?;
    Ok(())
}

pub fn read_html(path: &Path) -> Result<Figure, ChartError> {
    load_html(&std::fs::read_to_string(path)?)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
