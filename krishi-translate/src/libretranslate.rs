//! LibreTranslate provider
//!
//! ```text
//! POST https://libretranslate.com/translate
//! q=Hello&source=en&target=hi&format=text[&api_key=...]
//! ```
//!
//! Success is HTTP 200 with a non-empty `translatedText`.

use crate::error::{TranslateError, TranslateResult};
use crate::provider::{TranslationProvider, non_empty};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_LIBRETRANSLATE_URL: &str = "https://libretranslate.com/translate";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreTranslateResponse {
    translated_text: Option<String>,
}

/// LibreTranslate REST adapter
#[derive(Clone)]
pub struct LibreTranslateProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslateProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

impl std::fmt::Debug for LibreTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreTranslateProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> TranslateResult<String> {
        let mut form = vec![
            ("q", text),
            ("source", source_code),
            ("target", target_code),
            ("format", "text"),
        ];
        if let Some(key) = &self.api_key {
            form.push(("api_key", key.as_str()));
        }

        let response = self.client.post(&self.base_url).form(&form).send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api { status, message });
        }

        let body: LibreTranslateResponse = response.json().await.map_err(|e| {
            TranslateError::Parse(format!("Invalid LibreTranslate response: {e}"))
        })?;

        non_empty(body.translated_text)
    }

    fn name(&self) -> &str {
        "libretranslate"
    }
}
