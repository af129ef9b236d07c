use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no interval in the response has any data points")]
    EmptyDataset,

    #[error("date range has zero length")]
    DegenerateRange,

    #[error("interval {0} not present in the response")]
    UnknownInterval(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid marker: {0}")]
    InvalidMarker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
