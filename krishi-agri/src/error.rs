/// Error types for the agriculture services
#[derive(Debug, thiserror::Error)]
pub enum AgriError {
    /// Transport failure talking to an upstream API
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    /// Upstream answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Upstream payload or on-disk artifact could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Weather fetch failed outright
    #[error("Weather unavailable: {0}")]
    Weather(String),

    /// Crop model could not be loaded or evaluated
    #[error("Model error: {0}")]
    Model(String),

    #[error("GOOGLE_API_KEY is not set")]
    MissingApiKey,

    /// The language model answered without any text
    #[error("Language model returned an empty response")]
    EmptyResponse,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AgriError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

/// Result type for agriculture operations
pub type AgriResult<T> = Result<T, AgriError>;
