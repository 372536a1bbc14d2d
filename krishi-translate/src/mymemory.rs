//! MyMemory translation provider
//!
//! Public GET endpoint, no key required:
//!
//! ```text
//! GET https://api.mymemory.translated.net/get?q=Hello&langpair=en|hi
//! ```
//!
//! A usable answer is HTTP 200 whose body carries `responseStatus == 200`
//! (MyMemory sometimes sends it as a string) and a non-empty
//! `responseData.translatedText`. Anything else is a failed attempt.

use crate::error::{TranslateError, TranslateResult};
use crate::provider::{TranslationProvider, non_empty};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_MYMEMORY_URL: &str = "https://api.mymemory.translated.net/get";

/// MyMemory REST adapter
#[derive(Clone)]
pub struct MyMemoryProvider {
    client: reqwest::Client,
    base_url: String,
    /// Optional contact address; raises the anonymous daily quota
    email: Option<String>,
}

impl MyMemoryProvider {
    /// Create a provider against `base_url` with a per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        email: Option<String>,
        timeout: Duration,
    ) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            email: email.filter(|e| !e.trim().is_empty()),
        })
    }

    fn extract_translation(body: &Value) -> TranslateResult<String> {
        let status = match &body["responseStatus"] {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        if status != Some(200) {
            let details = body["responseDetails"]
                .as_str()
                .unwrap_or("missing responseStatus")
                .to_string();
            return Err(TranslateError::Api {
                status: status.and_then(|s| u16::try_from(s).ok()).unwrap_or(0),
                message: details,
            });
        }

        non_empty(
            body["responseData"]["translatedText"]
                .as_str()
                .map(str::to_string),
        )
    }
}

impl std::fmt::Debug for MyMemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyMemoryProvider")
            .field("base_url", &self.base_url)
            .field("email", &self.email.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
    async fn translate(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> TranslateResult<String> {
        let langpair = format!("{source_code}|{target_code}");
        let mut query = vec![("q", text), ("langpair", langpair.as_str())];
        if let Some(email) = &self.email {
            query.push(("de", email.as_str()));
        }

        let response = self.client.get(&self.base_url).query(&query).send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api { status, message });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(format!("Invalid MyMemory response: {e}")))?;

        Self::extract_translation(&body)
    }

    fn name(&self) -> &str {
        "mymemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> MyMemoryProvider {
        MyMemoryProvider::new(
            format!("{}/get", server.uri()),
            None,
            Duration::from_secs(2),
        )
        .unwrap()
    }

    // ========== Payload Extraction ==========

    #[test]
    fn test_extract_numeric_status() {
        let body = json!({
            "responseData": { "translatedText": "नमस्ते" },
            "responseStatus": 200
        });
        assert_eq!(MyMemoryProvider::extract_translation(&body).unwrap(), "नमस्ते");
    }

    #[test]
    fn test_extract_string_status() {
        let body = json!({
            "responseData": { "translatedText": "হ্যালো" },
            "responseStatus": "200"
        });
        assert_eq!(MyMemoryProvider::extract_translation(&body).unwrap(), "হ্যালো");
    }

    #[test]
    fn test_extract_quota_error() {
        let body = json!({
            "responseData": { "translatedText": "MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS FOR TODAY" },
            "responseStatus": 429,
            "responseDetails": "quota exceeded"
        });
        match MyMemoryProvider::extract_translation(&body) {
            Err(TranslateError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_missing_fields() {
        assert!(MyMemoryProvider::extract_translation(&json!({})).is_err());
        let body = json!({ "responseStatus": 200, "responseData": {} });
        assert!(matches!(
            MyMemoryProvider::extract_translation(&body),
            Err(TranslateError::EmptyTranslation)
        ));
    }

    // ========== HTTP ==========

    #[tokio::test]
    async fn test_translate_sends_langpair() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("q", "Hello"))
            .and(query_param("langpair", "en|hi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseData": { "translatedText": "नमस्ते" },
                "responseStatus": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server).translate("Hello", "en", "hi").await.unwrap();
        assert_eq!(result, "नमस्ते");
    }

    #[tokio::test]
    async fn test_translate_passes_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("de", "farmer@example.org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseData": { "translatedText": "ok" },
                "responseStatus": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = MyMemoryProvider::new(
            format!("{}/get", server.uri()),
            Some("farmer@example.org".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(provider.translate("x", "en", "hi").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_translate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        match provider(&server).translate("Hello", "en", "hi").await {
            Err(TranslateError::Api { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_translate_non_200_success_status_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(203).set_body_json(json!({
                "responseData": { "translatedText": "cached" },
                "responseStatus": 200
            })))
            .mount(&server)
            .await;

        match provider(&server).translate("Hello", "en", "hi").await {
            Err(TranslateError::Api { status, .. }) => assert_eq!(status, 203),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_translate_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            provider(&server).translate("Hello", "en", "hi").await,
            Err(TranslateError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_translate_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({
                        "responseData": { "translatedText": "late" },
                        "responseStatus": 200
                    })),
            )
            .mount(&server)
            .await;

        let provider = MyMemoryProvider::new(
            format!("{}/get", server.uri()),
            None,
            Duration::from_millis(50),
        )
        .unwrap();
        assert!(matches!(
            provider.translate("Hello", "en", "hi").await,
            Err(TranslateError::Timeout)
        ));
    }

    #[test]
    fn test_debug_masks_email() {
        let provider = MyMemoryProvider::new(
            DEFAULT_MYMEMORY_URL,
            Some("secret@example.org".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        let debug = format!("{provider:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("secret@example.org"));
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_english_to_hindi() {
        let provider =
            MyMemoryProvider::new(DEFAULT_MYMEMORY_URL, None, Duration::from_secs(10)).unwrap();
        let result = provider.translate("Hello", "en", "hi").await.unwrap();
        println!("Translation: Hello → {result}");
        assert!(!result.is_empty());
    }
}
