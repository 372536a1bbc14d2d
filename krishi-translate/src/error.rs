/// Error types for translation
///
/// Provider-level variants (`Network`, `Timeout`, `Api`, `Parse`,
/// `EmptyTranslation`) are absorbed by the orchestrator and only drive
/// fallback. Request-level variants (`BatchTooLarge`, `TextTooLong`,
/// `EmptyText`) are meant to reject a request outright.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// Identifier matches neither a language name nor a known code
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Transport failure talking to a provider
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// Provider did not answer within the per-call timeout
    #[error("Translation timeout")]
    Timeout,

    /// Provider answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Provider payload could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider answered successfully but without any text
    #[error("Provider returned an empty translation")]
    EmptyTranslation,

    #[error("All translation services failed")]
    AllProvidersFailed,

    #[error("Batch of {len} texts exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Text of {len} characters exceeds the maximum of {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("Text must not be empty")]
    EmptyText,

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

impl TranslateError {
    /// Whether this error is a caller-input problem rather than a degraded provider
    pub fn is_request_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage(_)
                | Self::BatchTooLarge { .. }
                | Self::TextTooLong { .. }
                | Self::EmptyText
        )
    }
}

/// Result type for translation operations
pub type TranslateResult<T> = Result<T, TranslateError>;
