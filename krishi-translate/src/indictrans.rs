//! Self-hosted IndicTrans2 provider
//!
//! Talks to a small inference service exposing
//! `POST /translate_text {text, src_lang, tgt_lang} -> {translation}` where
//! languages are passed by canonical name ("english", "santali").
//! Only enabled when `INDICTRANS_URL` is configured.

use crate::error::{TranslateError, TranslateResult};
use crate::language::CodeScheme;
use crate::provider::{TranslationProvider, non_empty};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct IndicTransRequest<'a> {
    text: &'a str,
    src_lang: &'a str,
    tgt_lang: &'a str,
}

#[derive(Deserialize)]
struct IndicTransResponse {
    translation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndicTransProvider {
    client: reqwest::Client,
    base_url: String,
}

impl IndicTransProvider {
    /// `base_url` is the service root; `/translate_text` is appended
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl TranslationProvider for IndicTransProvider {
    async fn translate(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> TranslateResult<String> {
        let url = format!("{}/translate_text", self.base_url.trim_end_matches('/'));
        let request = IndicTransRequest {
            text,
            src_lang: source_code,
            tgt_lang: target_code,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api { status, message });
        }

        let body: IndicTransResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(format!("Invalid IndicTrans response: {e}")))?;

        non_empty(body.translation)
    }

    fn name(&self) -> &str {
        "indictrans"
    }

    fn code_scheme(&self) -> CodeScheme {
        CodeScheme::Name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_translate_posts_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate_text"))
            .and(body_json(json!({
                "text": "Hello",
                "src_lang": "english",
                "tgt_lang": "santali"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "translation": "ᱡᱳᱦᱟᱨ" })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            IndicTransProvider::new(format!("{}/", server.uri()), Duration::from_secs(2)).unwrap();
        let src = provider.code_for(Language::English);
        let tgt = provider.code_for(Language::Santali);
        assert_eq!(provider.translate("Hello", src, tgt).await.unwrap(), "ᱡᱳᱦᱟᱨ");
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = IndicTransProvider::new(server.uri(), Duration::from_secs(2)).unwrap();
        assert!(matches!(
            provider.translate("Hello", "english", "hindi").await,
            Err(TranslateError::Api { status: 500, .. })
        ));
    }
}
