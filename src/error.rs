use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid Settings: {0}")]
    Settings(String),
    #[error("Stream Error: {0}")]
    Stream(#[from] StreamError),
    #[error("Content Error: {0}")]
    Content(#[from] ContentError),
    #[error("Capture Error: {0}")]
    Capture(#[from] CaptureError),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task Error: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("UI Error: {0}")]
    Ui(String),
}

// Backend stream error type
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("Connection lost: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Patch channel closed, no consumer left")]
    ConsumerGone,
}

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content not found: {0}")]
    NotFound(String),
    #[error("Failed to read content {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to fetch content {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Content at {0} is not an image")]
    NotAnImage(String),
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No capture device available")]
    NoDevice,
    #[error("Capture device failed: {0}")]
    Device(String),
}
