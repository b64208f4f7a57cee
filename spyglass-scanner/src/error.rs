use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected content type {content_type:?} for {url}")]
    ContentTypeMismatch {
        url: String,
        content_type: Option<String>,
    },

    #[error("Empty document: {0}")]
    EmptyDocument(String),

    #[error("Rendering unavailable: {0}")]
    RenderingUnavailable(String),

    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    #[error("Empty seed set: nothing to crawl")]
    EmptySeed,

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
