//! Mock translation provider for testing
//!
//! Deterministic, network-free provider used to exercise the fallback chain
//! and the batch coordinator, and by the CLI's `--mock` flag.
//!
//! # Example
//!
//! ```
//! use krishi_translate::{MockMode, MockTranslator, TranslationProvider};
//!
//! let mock = MockTranslator::named("A", MockMode::Suffix);
//! assert_eq!(mock.name(), "A");
//! assert_eq!(mock.call_count(), 0);
//! ```

use crate::error::{TranslateError, TranslateResult};
use crate::language::CodeScheme;
use crate::provider::TranslationProvider;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target code: "hello" → "hello_hi"
    Suffix,

    /// (text, target_code) → translation; unknown pairs fall back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Fail for the listed texts, `Suffix` for everything else
    FailFor(HashSet<String>),

    /// Every call fails with a transport-style error
    Error(String),

    /// Every call "succeeds" with an empty string
    Empty,

    /// Every call panics with the given message
    Panic(String),

    /// Return input unchanged
    NoOp,
}

/// Mock provider with a shared call counter
#[derive(Debug, Clone)]
pub struct MockTranslator {
    name: String,
    mode: MockMode,
    scheme: CodeScheme,
    /// Simulated network delay
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self::named("mock", mode)
    }

    /// Create a mock reporting `name` as its provenance
    pub fn named(name: impl Into<String>, mode: MockMode) -> Self {
        Self {
            name: name.into(),
            mode,
            scheme: CodeScheme::Iso639,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep for `delay` before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_code_scheme(mut self, scheme: CodeScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Number of `translate` calls so far, shared across clones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn apply_translation(&self, text: &str, target: &str) -> TranslateResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{text}_{target}")),
            MockMode::Mappings(map) => Ok(map
                .get(&(text.to_string(), target.to_string()))
                .cloned()
                .unwrap_or_else(|| format!("{text}_{target}"))),
            MockMode::FailFor(texts) if texts.contains(text) => {
                Err(TranslateError::Api {
                    status: 503,
                    message: format!("{} refused {text:?}", self.name),
                })
            }
            MockMode::FailFor(_) => Ok(format!("{text}_{target}")),
            MockMode::Error(msg) => Err(TranslateError::Api {
                status: 500,
                message: msg.clone(),
            }),
            MockMode::Empty => Err(TranslateError::EmptyTranslation),
            MockMode::Panic(msg) => panic!("{msg}"),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_code: &str,
        target_code: &str,
    ) -> TranslateResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.apply_translation(text, target_code)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn code_scheme(&self) -> CodeScheme {
        self.scheme
    }
}
