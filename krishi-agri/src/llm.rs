//! Language model access
//!
//! [`LanguageModel`] is the seam the chatbot and the competition analyzer
//! talk through. [`GeminiClient`] implements it against the Gemini
//! `generateContent` REST endpoint.

use crate::config::AgriConfig;
use crate::error::{AgriError, AgriResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for generation requests
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Everything needed for one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct LlmPrompt {
    pub system: Option<String>,
    /// Conversation so far, oldest first, ending with the user's message
    pub turns: Vec<ChatTurn>,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl LlmPrompt {
    /// Single user message with default sampling
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            system: None,
            turns: vec![ChatTurn::user(text)],
            temperature: 0.7,
            max_output_tokens: None,
        }
    }
}

/// Text generation capability
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a reply for `prompt`
    ///
    /// # Errors
    ///
    /// `MissingApiKey` when the backend is not configured, transport and
    /// `Api` errors from the backend, `EmptyResponse` when it answers without
    /// text.
    async fn complete(&self, prompt: &LlmPrompt) -> AgriResult<String>;

    fn name(&self) -> &str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// Gemini REST client
///
/// The API key is optional at construction so the service can start without
/// it; every call then fails with [`AgriError::MissingApiKey`].
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> AgriResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgriError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &AgriConfig) -> AgriResult<Self> {
        Self::new(
            config.google_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            DEFAULT_LLM_TIMEOUT,
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &LlmPrompt) -> AgriResult<String> {
        let api_key = self.api_key.as_ref().ok_or(AgriError::MissingApiKey)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let request = GeminiRequest {
            system_instruction: prompt.system.as_deref().map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text }],
            }),
            contents: prompt
                .turns
                .iter()
                .map(|turn| GeminiContent {
                    role: Some(turn.role),
                    parts: vec![GeminiPart { text: &turn.text }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: prompt.temperature,
                max_output_tokens: prompt.max_output_tokens,
            },
        };

        debug!(model = %self.model, turns = prompt.turns.len(), "calling gemini");
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgriError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AgriError::Parse(format!("Invalid Gemini response: {e}")))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .filter(|t| !t.trim().is_empty())
            .ok_or(AgriError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, key: Option<&str>) -> GeminiClient {
        GeminiClient::new(
            key.map(str::to_string),
            "gemini-test",
            server.uri(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_system_turns_and_config() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(query_param("key", "k-123"))
            .and(body_partial_json(json!({
                "systemInstruction": { "parts": [{ "text": "be brief" }] },
                "contents": [
                    { "role": "user", "parts": [{ "text": "hi" }] },
                    { "role": "model", "parts": [{ "text": "hello" }] },
                    { "role": "user", "parts": [{ "text": "best crop?" }] }
                ],
                "generationConfig": { "temperature": 0.5, "maxOutputTokens": 150 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Millet." }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = LlmPrompt {
            system: Some("be brief".to_string()),
            turns: vec![
                ChatTurn::user("hi"),
                ChatTurn::model("hello"),
                ChatTurn::user("best crop?"),
            ],
            temperature: 0.5,
            max_output_tokens: Some(150),
        };
        let reply = client(&server, Some("k-123")).complete(&prompt).await.unwrap();
        assert_eq!(reply, "Millet.");
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let gemini = client(&server, Some("  "));
        assert!(!gemini.has_api_key());
        let err = gemini.complete(&LlmPrompt::single("hi")).await.unwrap_err();
        assert!(matches!(err, AgriError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = client(&server, Some("k"))
            .complete(&LlmPrompt::single("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgriError::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = client(&server, Some("k"))
            .complete(&LlmPrompt::single("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgriError::EmptyResponse));
    }

    #[test]
    fn test_debug_masks_api_key() {
        let gemini = GeminiClient::new(
            Some("super-secret".to_string()),
            "m",
            "http://localhost",
            DEFAULT_LLM_TIMEOUT,
        )
        .unwrap();
        let debug = format!("{:?}", gemini);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_value(Role::Model).unwrap(), json!("model"));
    }
}
