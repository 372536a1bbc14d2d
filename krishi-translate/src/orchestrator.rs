//! Fallback orchestration over an ordered provider chain
//!
//! [`Translator::translate`] is total: whatever happens below it, the caller
//! gets a [`TranslationOutcome`]. The flow is
//!
//! 1. normalize source and target language
//! 2. same language → return the text untouched, no network
//! 3. try each provider in order under a per-call timeout; the first
//!    non-empty answer wins
//! 4. nothing worked → degraded outcome carrying the original text
//!
//! Provider errors are logged and swallowed. Anything that escapes the
//! per-provider handling, including a panicking provider, is converted into
//! the same degraded outcome at the top level.

use crate::batch::TranslationLimits;
use crate::error::{TranslateError, TranslateResult};
use crate::language::{Language, normalize};
use crate::outcome::TranslationOutcome;
use crate::provider::TranslationProvider;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Per-provider call budget
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Translation entry point shared by the HTTP layer and the CLI
#[derive(Clone)]
pub struct Translator {
    providers: Vec<Arc<dyn TranslationProvider>>,
    timeout: Duration,
    pub(crate) limits: TranslationLimits,
}

impl Translator {
    /// Create a translator trying `providers` in the given order
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>) -> Self {
        Self {
            providers,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            limits: TranslationLimits::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_limits(mut self, limits: TranslationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &TranslationLimits {
        &self.limits
    }

    /// Provider names in fallback order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Translate `text` between two language identifiers
    ///
    /// Identifiers may be names or codes (see [`normalize`]). Never fails:
    /// unsupported languages, exhausted providers and unexpected panics all
    /// come back as an outcome with `success == false`, the original text in
    /// `translation`, and the reason in `error`.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        let attempt = AssertUnwindSafe(self.try_translate(text, source, target)).catch_unwind();

        match attempt.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(source, target, error = %e, "translation degraded to original text");
                TranslationOutcome::failed(text, e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(source, target, %message, "translation aborted unexpectedly");
                TranslationOutcome::failed(text, message)
            }
        }
    }

    async fn try_translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> TranslateResult<TranslationOutcome> {
        let source = normalize(source)?;
        let target = normalize(target)?;

        if source == target {
            debug!(%source, "same source and target language, skipping providers");
            return Ok(TranslationOutcome::unchanged(text));
        }

        for provider in &self.providers {
            if let Some(translated) = self.attempt(provider.as_ref(), text, source, target).await {
                debug!(provider = provider.name(), %source, %target, "translated");
                return Ok(TranslationOutcome::translated(translated, provider.name()));
            }
        }

        Err(TranslateError::AllProvidersFailed)
    }

    /// One bounded provider call; every failure becomes `None`
    async fn attempt(
        &self,
        provider: &dyn TranslationProvider,
        text: &str,
        source: Language,
        target: Language,
    ) -> Option<String> {
        let source_code = provider.code_for(source);
        let target_code = provider.code_for(target);
        debug!(
            provider = provider.name(),
            source_code, target_code, "attempting translation"
        );

        let call = provider.translate(text, source_code, target_code);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(translated)) if !translated.trim().is_empty() => Some(translated),
            Ok(Ok(_)) => {
                warn!(provider = provider.name(), "provider returned empty text");
                None
            }
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "provider failed");
                None
            }
            Err(_) => {
                warn!(
                    provider = provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "provider timed out"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("providers", &self.provider_names())
            .field("timeout", &self.timeout)
            .field("limits", &self.limits)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected translation failure".to_string()
    }
}
