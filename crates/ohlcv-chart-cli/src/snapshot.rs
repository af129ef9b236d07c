use std::path::Path;

use anyhow::{Context, Result};
use fantoccini::ClientBuilder;
use fantoccini::error::CmdError;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Captures a rendered chart page as a PNG through a WebDriver server
/// (geckodriver or chromedriver).
pub struct WebDriverSnapshot {
    webdriver_url: String,
    width: u32,
    height: u32,
}

impl WebDriverSnapshot {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            width: 1920,
            height: 1080,
        }
    }

    /// Headless flags for both Firefox and Chrome; a driver ignores the
    /// vendor block it does not understand.
    fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    format!("--window-size={},{}", self.width, self.height),
                ]
            }),
        );
        caps
    }

    /// Open `html` in a headless browser and write a screenshot to `png`.
    pub async fn capture(&self, html: &Path, png: &Path) -> Result<()> {
        let url = file_url(html)?;
        debug!("connecting to WebDriver at {}", self.webdriver_url);

        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .with_context(|| format!("failed to start browser session at {}", self.webdriver_url))?;

        let shot = async {
            client.set_window_size(self.width, self.height).await?;
            client.goto(&url).await?;
            Ok::<_, CmdError>(client.screenshot().await?)
        }
        .await;
        // close the session even when the capture failed
        let closed = client.close().await;

        let bytes = shot.with_context(|| format!("failed to capture {url}"))?;
        closed.context("failed to close browser session")?;

        std::fs::write(png, &bytes)
            .with_context(|| format!("failed to write {}", png.display()))?;
        info!("wrote {} byte screenshot to {}", bytes.len(), png.display());
        Ok(())
    }
}

/// Open a written chart in the user's default browser.
pub fn show_in_browser(html: &Path) -> Result<()> {
    let url = file_url(html)?;
    webbrowser::open(&url).with_context(|| format!("failed to open {url} in a browser"))?;
    info!("opened {url}");
    Ok(())
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    Ok(format!("file://{}", absolute.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_request_headless_browsers() {
        let caps = WebDriverSnapshot::new(DEFAULT_WEBDRIVER_URL).capabilities();
        assert_eq!(caps["moz:firefoxOptions"]["args"][0], "-headless");
        assert_eq!(
            caps["goog:chromeOptions"]["args"][1],
            "--window-size=1920,1080"
        );
    }

    #[test]
    fn file_url_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.html");
        std::fs::write(&path, "<html></html>").unwrap();

        let url = file_url(&path).unwrap();
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("chart.html"));
    }

    #[test]
    fn file_url_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_url(&dir.path().join("missing.html")).is_err());
    }

    #[test]
    fn show_missing_chart_fails_before_launching() {
        let dir = tempfile::tempdir().unwrap();
        let err = show_in_browser(&dir.path().join("missing.html")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to resolve"));
    }
}
