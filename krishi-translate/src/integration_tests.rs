//! End-to-end tests of the provider chain against local HTTP stand-ins
//!
//! The real adapters are pointed at `wiremock` servers so the whole path
//! (normalization, code resolution, HTTP shape, fallback) is exercised
//! without touching the public services.

#[cfg(test)]
mod tests {
    use crate::config::{ProviderKind, TranslationConfig};
    use crate::outcome::TranslationOutcome;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(mymemory: &MockServer, libre: &MockServer) -> TranslationConfig {
        TranslationConfig {
            mymemory_url: format!("{}/get", mymemory.uri()),
            libretranslate_url: format!("{}/translate", libre.uri()),
            timeout: Duration::from_millis(500),
            ..TranslationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_e2e_mymemory_success() {
        let mymemory = MockServer::start().await;
        let libre = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("langpair", "en|hi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseData": { "translatedText": "नमस्ते" },
                "responseStatus": 200
            })))
            .expect(1)
            .mount(&mymemory)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&libre)
            .await;

        let translator = config(&mymemory, &libre).build().unwrap();
        let outcome = translator.translate("Hello", "english", "hindi").await;

        assert_eq!(
            outcome,
            TranslationOutcome::translated("नमस्ते".to_string(), "mymemory")
        );
    }

    #[tokio::test]
    async fn test_e2e_fallback_to_libretranslate() {
        let mymemory = MockServer::start().await;
        let libre = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseData": { "translatedText": "INVALID LANGUAGE PAIR" },
                "responseStatus": "403",
                "responseDetails": "'SAT' IS AN INVALID TARGET LANGUAGE"
            })))
            .expect(1)
            .mount(&mymemory)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_string_contains("source=en"))
            .and(body_string_contains("target=bn"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "ধান" })),
            )
            .expect(1)
            .mount(&libre)
            .await;

        let translator = config(&mymemory, &libre).build().unwrap();
        let outcome = translator.translate("Rice", "EN", "Bengali").await;

        assert!(outcome.success);
        assert_eq!(outcome.provider, "libretranslate");
        assert_eq!(outcome.translation, "ধান");
    }

    #[tokio::test]
    async fn test_e2e_slow_first_provider() {
        let mymemory = MockServer::start().await;
        let libre = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mymemory)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "गेहूँ" })),
            )
            .mount(&libre)
            .await;

        let translator = config(&mymemory, &libre).build().unwrap();
        let outcome = translator.translate("Wheat", "english", "hindi").await;

        assert_eq!(outcome.provider, "libretranslate");
    }

    #[tokio::test]
    async fn test_e2e_everything_down() {
        let mymemory = MockServer::start().await;
        let libre = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mymemory)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&libre)
            .await;

        let translator = config(&mymemory, &libre).build().unwrap();
        let texts = vec!["Rice".to_string(), "Maize".to_string()];
        let outcomes = translator
            .translate_batch(&texts, "english", "urdu")
            .await
            .unwrap();

        for (text, outcome) in texts.iter().zip(&outcomes) {
            assert_eq!(
                outcome,
                &TranslationOutcome::failed(text, "All translation services failed")
            );
        }
    }

    #[tokio::test]
    async fn test_e2e_reordered_chain() {
        let mymemory = MockServer::start().await;
        let libre = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mymemory)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "ok" })),
            )
            .expect(1)
            .mount(&libre)
            .await;

        let mut cfg = config(&mymemory, &libre);
        cfg.providers = vec![ProviderKind::LibreTranslate, ProviderKind::MyMemory];
        let outcome = cfg.build().unwrap().translate("x", "en", "hi").await;

        assert_eq!(outcome.provider, "libretranslate");
    }
}
