//! Request limits and concurrent batch translation

use crate::error::{TranslateError, TranslateResult};
use crate::orchestrator::Translator;
use crate::outcome::TranslationOutcome;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_TEXT_CHARS: usize = 1000;

/// Input-validation boundaries for translation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranslationLimits {
    pub max_batch_size: usize,
    /// Counted in characters, not bytes
    pub max_text_chars: usize,
}

impl Default for TranslationLimits {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }
}

impl TranslationLimits {
    pub fn check_batch(&self, len: usize) -> TranslateResult<()> {
        if len > self.max_batch_size {
            return Err(TranslateError::BatchTooLarge {
                len,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }

    pub fn check_text(&self, text: &str) -> TranslateResult<()> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }
        let len = text.chars().count();
        if len > self.max_text_chars {
            return Err(TranslateError::TextTooLong {
                len,
                max: self.max_text_chars,
            });
        }
        Ok(())
    }
}

impl Translator {
    /// Translate several texts sharing one language pair
    ///
    /// All items run concurrently on the calling task; `result[i]` always
    /// belongs to `texts[i]`. A failing item degrades on its own and never
    /// affects its siblings.
    ///
    /// # Errors
    ///
    /// `TranslateError::BatchTooLarge` when `texts` exceeds the configured
    /// maximum. Nothing is sent to any provider in that case.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslateResult<Vec<TranslationOutcome>> {
        self.limits.check_batch(texts.len())?;
        debug!(count = texts.len(), source, target, "translating batch");

        let pending = texts
            .iter()
            .map(|text| self.translate(text, source, target));

        Ok(join_all(pending).await)
    }

    /// Translate a page of keyed strings, keeping every key
    ///
    /// Same contract as [`Translator::translate_batch`] with keys in place of
    /// positions: each key maps to the outcome for its own text.
    pub async fn translate_page(
        &self,
        strings: &BTreeMap<String, String>,
        source: &str,
        target: &str,
    ) -> TranslateResult<BTreeMap<String, TranslationOutcome>> {
        self.limits.check_batch(strings.len())?;
        debug!(count = strings.len(), source, target, "translating page");

        let pending = strings.iter().map(|(key, text)| async move {
            (key.clone(), self.translate(text, source, target).await)
        });

        Ok(join_all(pending).await.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockMode, MockTranslator};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ========== Limits ==========

    #[test]
    fn test_check_batch() {
        let limits = TranslationLimits::default();
        assert!(limits.check_batch(0).is_ok());
        assert!(limits.check_batch(10).is_ok());
        assert!(matches!(
            limits.check_batch(11),
            Err(TranslateError::BatchTooLarge { len: 11, max: 10 })
        ));
    }

    #[test]
    fn test_check_text_counts_characters() {
        let limits = TranslationLimits {
            max_batch_size: 10,
            max_text_chars: 5,
        };
        // 5 Devanagari characters, 15 bytes
        assert!(limits.check_text("नमस्त").is_ok());
        assert!(matches!(
            limits.check_text("abcdef"),
            Err(TranslateError::TextTooLong { len: 6, max: 5 })
        ));
        assert!(matches!(limits.check_text("   "), Err(TranslateError::EmptyText)));
    }

    // ========== Batch Coordination ==========

    #[tokio::test]
    async fn test_batch_preserves_order_with_item_failure() {
        let failing = HashSet::from(["b".to_string()]);
        let a = MockTranslator::named("A", MockMode::FailFor(failing.clone()));
        let b = MockTranslator::named("B", MockMode::FailFor(failing));
        let translator = Translator::new(vec![Arc::new(a), Arc::new(b)]);

        let results = translator
            .translate_batch(&texts(&["a", "b", "c"]), "english", "hindi")
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert_eq!(results[0].translation, "a_hi");
        assert!(!results[1].success);
        assert_eq!(results[1].translation, "b");
        assert_eq!(
            results[1].error.as_deref(),
            Some("All translation services failed")
        );
        assert!(results[2].success);
        assert_eq!(results[2].translation, "c_hi");
    }

    #[tokio::test]
    async fn test_batch_too_large_rejected_before_provider_call() {
        let a = MockTranslator::named("A", MockMode::Suffix);
        let translator = Translator::new(vec![Arc::new(a.clone())]);
        let many: Vec<String> = (0..11).map(|i| format!("text{i}")).collect();

        let result = translator.translate_batch(&many, "english", "hindi").await;

        assert!(matches!(
            result,
            Err(TranslateError::BatchTooLarge { len: 11, max: 10 })
        ));
        assert_eq!(a.call_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_respects_custom_limit() {
        let a = MockTranslator::named("A", MockMode::Suffix);
        let translator = Translator::new(vec![Arc::new(a)]).with_limits(TranslationLimits {
            max_batch_size: 2,
            max_text_chars: 1000,
        });

        assert!(
            translator
                .translate_batch(&texts(&["x", "y", "z"]), "en", "hi")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_batch_runs_items_concurrently() {
        let a = MockTranslator::named("A", MockMode::Suffix).with_delay(Duration::from_millis(200));
        let translator = Translator::new(vec![Arc::new(a)]);

        let start = Instant::now();
        let results = translator
            .translate_batch(&texts(&["one", "two", "three", "four"]), "en", "hi")
            .await
            .unwrap();

        assert!(results.iter().all(|r| r.success));
        // Sequential execution would need at least 800ms
        assert!(start.elapsed() < Duration::from_millis(600));
    }

    // ========== Page Translation ==========

    fn page(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_page_keeps_keys_with_item_failure() {
        let failing = HashSet::from(["Sow now".to_string()]);
        let a = MockTranslator::named("A", MockMode::FailFor(failing));
        let translator = Translator::new(vec![Arc::new(a)]);

        let results = translator
            .translate_page(
                &page(&[("title", "Crops"), ("advice", "Sow now"), ("footer", "Help")]),
                "english",
                "hindi",
            )
            .await
            .unwrap();

        assert_eq!(
            results.keys().collect::<Vec<_>>(),
            vec!["advice", "footer", "title"]
        );
        assert_eq!(results["title"].translation, "Crops_hi");
        assert_eq!(results["footer"].translation, "Help_hi");
        assert!(!results["advice"].success);
        assert_eq!(results["advice"].translation, "Sow now");
    }

    #[tokio::test]
    async fn test_page_too_large_rejected_before_provider_call() {
        let a = MockTranslator::named("A", MockMode::Suffix);
        let translator = Translator::new(vec![Arc::new(a.clone())]).with_limits(TranslationLimits {
            max_batch_size: 1,
            max_text_chars: 1000,
        });

        let result = translator
            .translate_page(&page(&[("a", "x"), ("b", "y")]), "en", "hi")
            .await;

        assert!(matches!(
            result,
            Err(TranslateError::BatchTooLarge { len: 2, max: 1 })
        ));
        assert_eq!(a.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let translator = Translator::new(Vec::new());
        let results = translator.translate_batch(&[], "en", "hi").await.unwrap();
        assert!(results.is_empty());
    }
}
