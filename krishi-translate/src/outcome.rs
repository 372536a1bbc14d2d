//! Uniform translation result returned to callers

use serde::{Deserialize, Serialize};

/// Provenance value when no provider produced the text
pub const PROVIDER_NONE: &str = "none";

/// Result of one orchestrated translation
///
/// `translation` is never left empty by the orchestrator: on failure it
/// carries the original input so callers can render it as-is.
///
/// # Example
///
/// ```ignore
/// TranslationOutcome {
///     success: true,
///     translation: "नमस्ते",
///     provider: "mymemory",
///     error: None,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub success: bool,
    pub translation: String,
    /// Name of the provider that succeeded, or `"none"`
    pub provider: String,
    pub error: Option<String>,
}

impl TranslationOutcome {
    /// Source and target are the same language; nothing to do
    pub fn unchanged(text: &str) -> Self {
        Self {
            success: true,
            translation: text.to_string(),
            provider: PROVIDER_NONE.to_string(),
            error: None,
        }
    }

    pub fn translated(translation: String, provider: &str) -> Self {
        Self {
            success: true,
            translation,
            provider: provider.to_string(),
            error: None,
        }
    }

    /// Degraded result carrying the untranslated original
    pub fn failed(original: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            translation: original.to_string(),
            provider: PROVIDER_NONE.to_string(),
            error: Some(error.into()),
        }
    }

    /// Whether a provider actually produced the text
    pub fn was_translated(&self) -> bool {
        self.success && self.provider != PROVIDER_NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_failed_keeps_original_text() {
        let outcome = TranslationOutcome::failed("Hello", "All translation services failed");
        assert!(!outcome.success);
        assert_eq!(outcome.translation, "Hello");
        assert_eq!(outcome.provider, "none");
        assert!(!outcome.was_translated());
    }

    #[test]
    fn test_unchanged_is_success_without_provider() {
        let outcome = TranslationOutcome::unchanged("Hello");
        assert!(outcome.success);
        assert!(!outcome.was_translated());
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn test_serialized_shape() {
        let outcome = TranslationOutcome::translated("नमस्ते".to_string(), "mymemory");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "success": true,
                "translation": "नमस्ते",
                "provider": "mymemory",
                "error": null
            })
        );
    }
}
