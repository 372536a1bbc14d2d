//! Translation provider trait
//!
//! Each external translation service is wrapped in one adapter implementing
//! [`TranslationProvider`]. The orchestrator holds an ordered list of them and
//! never needs to know which concrete services are configured.
//!
//! # Example
//!
//! ```ignore
//! use krishi_translate::mymemory::DEFAULT_MYMEMORY_URL;
//! use krishi_translate::{MyMemoryProvider, TranslationProvider};
//! use std::time::Duration;
//!
//! let provider = MyMemoryProvider::new(DEFAULT_MYMEMORY_URL, None, Duration::from_secs(10))?;
//! let hi = provider.translate("Hello", "en", "hi").await?;
//! ```

use crate::error::TranslateResult;
use crate::language::{CodeScheme, Language};
use async_trait::async_trait;

/// One external translation service
///
/// Implementations perform a single attempt: no retries and no fallback.
/// Any failure, including an empty translation, is returned as an error so
/// the orchestrator can move on to the next provider.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` between two provider-specific language codes
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `source_code` - Source language code in [`Self::code_scheme`]
    /// * `target_code` - Target language code in [`Self::code_scheme`]
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Non-empty translated text
    /// * `Err(TranslateError)` - Transport, status, payload or empty-result failure
    async fn translate(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> TranslateResult<String>;

    /// Short identifier reported as provenance, e.g. `"mymemory"`
    fn name(&self) -> &str;

    /// Scheme this provider expects language codes in
    fn code_scheme(&self) -> CodeScheme {
        CodeScheme::Iso639
    }

    /// Resolve a canonical language to this provider's code
    fn code_for(&self, language: Language) -> &'static str {
        language.code(self.code_scheme())
    }
}

/// Treat blank provider output as a failed attempt
pub(crate) fn non_empty(text: Option<String>) -> TranslateResult<String> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(crate::error::TranslateError::EmptyTranslation),
    }
}
