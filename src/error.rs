use thiserror::Error;

/// Errors that can occur while fetching, extracting or publishing a recipe
#[derive(Error, Debug)]
pub enum ImportError {
    /// Failed to fetch the recipe page
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// The URL is malformed or uses an unsupported scheme
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No extractor could produce a usable recipe from the page
    #[error("No extractor could parse the recipe from this webpage")]
    NoExtractorMatched,

    /// The tagging collaborator failed
    #[error("Tagging failed: {0}")]
    TaggingError(String),

    /// The publishing collaborator failed
    #[error("Publishing failed: {0}")]
    PublishError(String),

    /// Error parsing HTTP headers
    #[error("Header parse error: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Failed to render a record
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),
}
