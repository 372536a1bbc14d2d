//! Environment-driven translation configuration
//!
//! | variable                     | default                                    |
//! |------------------------------|--------------------------------------------|
//! | `TRANSLATION_PROVIDERS`      | `mymemory,libretranslate` (+`indictrans`)  |
//! | `MYMEMORY_URL`               | `https://api.mymemory.translated.net/get`  |
//! | `MYMEMORY_EMAIL`             | unset                                      |
//! | `LIBRETRANSLATE_URL`         | `https://libretranslate.com/translate`     |
//! | `LIBRETRANSLATE_API_KEY`     | unset                                      |
//! | `INDICTRANS_URL`             | unset                                      |
//! | `TRANSLATION_TIMEOUT_SECS`   | `10`                                       |
//! | `TRANSLATION_MAX_BATCH`      | `10`                                       |
//! | `TRANSLATION_MAX_TEXT_CHARS` | `1000`                                     |
//!
//! `indictrans` joins the default chain (last) only when `INDICTRANS_URL` is
//! set and `TRANSLATION_PROVIDERS` is not.

use crate::batch::TranslationLimits;
use crate::error::{TranslateError, TranslateResult};
use crate::indictrans::IndicTransProvider;
use crate::libretranslate::{DEFAULT_LIBRETRANSLATE_URL, LibreTranslateProvider};
use crate::mymemory::{DEFAULT_MYMEMORY_URL, MyMemoryProvider};
use crate::orchestrator::{DEFAULT_PROVIDER_TIMEOUT, Translator};
use crate::provider::TranslationProvider;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Which adapter to place at a given position in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    MyMemory,
    LibreTranslate,
    IndicTrans,
}

impl FromStr for ProviderKind {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mymemory" => Ok(Self::MyMemory),
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            "indictrans" | "indictrans2" => Ok(Self::IndicTrans),
            other => Err(TranslateError::Config(format!(
                "Unknown translation provider: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Fallback order
    pub providers: Vec<ProviderKind>,
    pub mymemory_url: String,
    pub mymemory_email: Option<String>,
    pub libretranslate_url: String,
    pub libretranslate_api_key: Option<String>,
    pub indictrans_url: Option<String>,
    /// Per-provider call timeout
    pub timeout: Duration,
    pub limits: TranslationLimits,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderKind::MyMemory, ProviderKind::LibreTranslate],
            mymemory_url: DEFAULT_MYMEMORY_URL.to_string(),
            mymemory_email: None,
            libretranslate_url: DEFAULT_LIBRETRANSLATE_URL.to_string(),
            libretranslate_api_key: None,
            indictrans_url: None,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            limits: TranslationLimits::default(),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: Option<String>, default: T) -> TranslateResult<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TranslateError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}

/// Like [`parse_number`], rejecting an explicit zero
fn parse_positive<T>(key: &str, value: Option<String>, default: T) -> TranslateResult<T>
where
    T: FromStr + Default + PartialEq,
{
    let parsed = parse_number(key, value, default)?;
    if parsed == T::default() {
        return Err(TranslateError::Config(format!("{key} must be at least 1")));
    }
    Ok(parsed)
}

impl TranslationConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> TranslateResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> TranslateResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let indictrans_url = get("INDICTRANS_URL");

        let providers = match get("TRANSLATION_PROVIDERS") {
            Some(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(ProviderKind::from_str)
                .collect::<TranslateResult<Vec<_>>>()?,
            None => {
                let mut providers = defaults.providers.clone();
                if indictrans_url.is_some() {
                    providers.push(ProviderKind::IndicTrans);
                }
                providers
            }
        };

        if providers.is_empty() {
            return Err(TranslateError::Config(
                "TRANSLATION_PROVIDERS must name at least one provider".to_string(),
            ));
        }
        if providers.contains(&ProviderKind::IndicTrans) && indictrans_url.is_none() {
            return Err(TranslateError::Config(
                "indictrans provider requires INDICTRANS_URL".to_string(),
            ));
        }

        let timeout_secs = parse_positive(
            "TRANSLATION_TIMEOUT_SECS",
            get("TRANSLATION_TIMEOUT_SECS"),
            defaults.timeout.as_secs(),
        )?;

        Ok(Self {
            providers,
            mymemory_url: get("MYMEMORY_URL").unwrap_or(defaults.mymemory_url),
            mymemory_email: get("MYMEMORY_EMAIL"),
            libretranslate_url: get("LIBRETRANSLATE_URL").unwrap_or(defaults.libretranslate_url),
            libretranslate_api_key: get("LIBRETRANSLATE_API_KEY"),
            indictrans_url,
            timeout: Duration::from_secs(timeout_secs),
            limits: TranslationLimits {
                max_batch_size: parse_positive(
                    "TRANSLATION_MAX_BATCH",
                    get("TRANSLATION_MAX_BATCH"),
                    defaults.limits.max_batch_size,
                )?,
                max_text_chars: parse_positive(
                    "TRANSLATION_MAX_TEXT_CHARS",
                    get("TRANSLATION_MAX_TEXT_CHARS"),
                    defaults.limits.max_text_chars,
                )?,
            },
        })
    }

    fn provider(&self, kind: ProviderKind) -> TranslateResult<Arc<dyn TranslationProvider>> {
        let provider: Arc<dyn TranslationProvider> = match kind {
            ProviderKind::MyMemory => Arc::new(MyMemoryProvider::new(
                self.mymemory_url.clone(),
                self.mymemory_email.clone(),
                self.timeout,
            )?),
            ProviderKind::LibreTranslate => Arc::new(LibreTranslateProvider::new(
                self.libretranslate_url.clone(),
                self.libretranslate_api_key.clone(),
                self.timeout,
            )?),
            ProviderKind::IndicTrans => {
                let url = self.indictrans_url.clone().ok_or_else(|| {
                    TranslateError::Config("indictrans provider requires INDICTRANS_URL".to_string())
                })?;
                Arc::new(IndicTransProvider::new(url, self.timeout)?)
            }
        };
        Ok(provider)
    }

    /// Build the orchestrator with the configured chain
    pub fn build(&self) -> TranslateResult<Translator> {
        let providers = self
            .providers
            .iter()
            .map(|kind| self.provider(*kind))
            .collect::<TranslateResult<Vec<_>>>()?;

        let translator = Translator::new(providers)
            .with_timeout(self.timeout)
            .with_limits(self.limits);
        info!(providers = ?translator.provider_names(), "translation chain ready");
        Ok(translator)
    }
}
