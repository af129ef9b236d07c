use std::path::{Path, PathBuf};

use crate::error::ChartError;
use crate::range::DateRange;

/// Directory chart artifacts go to when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "archivos";

/// Where the HTML and PNG renderings of one chart are written.
///
/// Layout: `{dir}/{pair}_{dd-mm-YYYY}_{dd-mm-YYYY}.{html,png}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
    stem: String,
}

impl ArtifactPaths {
    pub fn new(dir: impl AsRef<Path>, pair: &str, range: &DateRange) -> Self {
        let (start, end) = range.file_dates();
        Self {
            dir: dir.as_ref().to_path_buf(),
            stem: format!("{pair}_{start}_{end}"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn html(&self) -> PathBuf {
        self.dir.join(format!("{}.html", self.stem))
    }

    pub fn png(&self) -> PathBuf {
        self.dir.join(format!("{}.png", self.stem))
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), ChartError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }
}
