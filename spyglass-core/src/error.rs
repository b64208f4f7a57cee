use spyglass_scanner::ScanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("No seed URLs to crawl")]
    EmptySeed,

    #[error("External tool not found: {0}")]
    ToolMissing(String),

    #[error("External tool {tool} exited with status {status}")]
    ToolFailed { tool: String, status: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
