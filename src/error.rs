// Error types for mediscan

use thiserror::Error;

/// Result type for mediscan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or sending an analysis request
#[derive(Error, Debug)]
pub enum Error {
    /// The endpoint answered with a non-success status. Carries the raw
    /// response body so the caller can show it verbatim.
    #[error("Error: {status} - {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A success response that does not contain `choices[0].message.content`
    #[error("Unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("Unsupported image type: {0} (expected jpg, jpeg or png)")]
    UnsupportedImage(String),

    #[error("No image uploaded yet")]
    NoImage,

    #[error("No analysis result to simplify yet")]
    NoResult,

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
