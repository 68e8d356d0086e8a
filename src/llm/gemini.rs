//! Gemini `generateContent` client.

use crate::config::{LlmOptions, LlmProvider};
use crate::err;
use crate::error::Result;
use crate::llm::LanguageModel;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GENERATIVE_LANGUAGE_BASE: &str = "https://generativelanguage.googleapis.com";

/// Longest slice of an error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// How requests are authenticated.
#[derive(Clone)]
enum Auth {
    ApiKey(String),
    Bearer(String),
}

/// Client for Gemini models on the Generative Language API or Vertex AI.
///
/// ```rust,no_run
/// use tfscope::config::LlmOptions;
/// use tfscope::llm::{GeminiClient, LanguageModel};
///
/// # async fn run() -> tfscope::Result<()> {
/// let options = LlmOptions { api_key: Some("key".into()), ..LlmOptions::default() };
/// let client = GeminiClient::new(&options)?;
/// let reply = client.generate("Summarize this Terraform file").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    auth: Auth,
    generation: GenerationConfig,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client from model options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when the provider's credentials are absent,
    /// or `Internal` if the HTTP client cannot be built.
    pub fn new(options: &LlmOptions) -> Result<Self> {
        let (endpoint, auth) = match options.provider {
            LlmProvider::GenerativeLanguage => {
                let key = options
                    .api_key
                    .clone()
                    .ok_or_else(|| err!(ConfigMissing { key: "llm.api_key".to_string() }))?;
                let base = options.base_url.as_deref().unwrap_or(GENERATIVE_LANGUAGE_BASE);
                let endpoint = format!(
                    "{}/v1beta/models/{}:generateContent",
                    base.trim_end_matches('/'),
                    options.model
                );
                (endpoint, Auth::ApiKey(key))
            }
            LlmProvider::VertexAi => {
                let token = options
                    .access_token
                    .clone()
                    .ok_or_else(|| err!(ConfigMissing { key: "llm.access_token".to_string() }))?;
                let project = options
                    .project
                    .as_deref()
                    .ok_or_else(|| err!(ConfigMissing { key: "llm.project".to_string() }))?;
                let base = options
                    .base_url
                    .clone()
                    .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", options.location));
                let endpoint = format!(
                    "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                    base.trim_end_matches('/'),
                    project,
                    options.location,
                    options.model
                );
                (endpoint, Auth::Bearer(token))
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .user_agent(concat!("tfscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| err!(Internal { message: format!("Failed to create HTTP client: {e}") }))?;

        tracing::debug!(endpoint = %endpoint, model = %options.model, "Created model client");

        Ok(Self {
            client,
            endpoint,
            auth,
            generation: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                max_output_tokens: options.max_output_tokens,
            },
            max_retries: options.max_retries,
            retry_delay_ms: options.retry_delay_ms,
        })
    }

    async fn send(&self, prompt: &str) -> Result<reqwest::Response> {
        let body = GenerateRequest {
            contents: [Content { parts: [Part { text: prompt }] }],
            generation_config: self.generation.clone(),
        };

        let mut attempts = 0;
        let mut delay = self.retry_delay_ms;

        loop {
            attempts += 1;
            let mut request = self.client.post(&self.endpoint).json(&body);
            request = match &self.auth {
                Auth::ApiKey(key) => request.query(&[("key", key)]),
                Auth::Bearer(token) => request.bearer_auth(token),
            };

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if attempts <= self.max_retries && (e.is_timeout() || e.is_connect()) => {
                    // The URL may carry the API key.
                    let e = e.without_url();
                    tracing::warn!(attempt = attempts, delay_ms = delay, error = %e, "Model request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay = delay.saturating_mul(2);
                    continue;
                }
                Err(e) => {
                    return Err(err!(Llm {
                        message: format!("Request to {} failed: {}", self.endpoint, e.without_url()),
                        status_code: None,
                    }));
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if (status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS) && attempts <= self.max_retries {
                tracing::warn!(
                    status = %status,
                    attempt = attempts,
                    max_retries = self.max_retries,
                    delay_ms = delay,
                    "Model request rejected, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay = delay.saturating_mul(2);
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(err!(Llm {
                message: format!("Model API returned {status}: {body}"),
                status_code: Some(status.as_u16()),
            }));
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::trace!(prompt_chars = prompt.chars().count(), "Sending prompt");

        let response = self.send(prompt).await?;
        let parsed: GenerateResponse = response.json().await.map_err(|e| err!(LlmResponse {
            message: format!("Invalid response body: {}", e.without_url()),
        }))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(err!(LlmResponse { message: "Response has no candidates".to_string() }));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(err!(LlmResponse {
                message: format!(
                    "Response has no text (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            }));
        }

        tracing::trace!(reply_chars = text.chars().count(), "Received reply");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TfScopeError;
    use serde_json::json;
    use wiremock::{matchers::*, Mock, MockServer, ResponseTemplate};

    fn options(server: &MockServer) -> LlmOptions {
        LlmOptions {
            api_key: Some("test-key".to_string()),
            base_url: Some(server.uri()),
            retry_delay_ms: 1,
            max_retries: 2,
            ..LlmOptions::default()
        }
    }

    fn reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash-002:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [{ "text": "hello" }] }],
                "generationConfig": { "topK": 40, "maxOutputTokens": 8192 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&options(&server)).unwrap();
        assert_eq!(client.generate("hello").await.unwrap(), "hi there");
    }

    #[tokio::test]
    async fn test_retries_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("ok")))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&options(&server)).unwrap();
        assert_eq!(client.generate("x").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&options(&server)).unwrap();
        match client.generate("x").await {
            Err(TfScopeError::Llm { status_code, message, .. }) => {
                assert_eq!(status_code, Some(400));
                assert!(message.contains("bad request"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&options(&server)).unwrap();
        assert!(matches!(client.generate("x").await, Err(TfScopeError::LlmResponse { .. })));
    }

    #[tokio::test]
    async fn test_vertex_uses_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/my-proj/locations/europe-west4/publishers/google/models/gemini-1.5-pro:generateContent",
            ))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("vertex")))
            .mount(&server)
            .await;

        let options = LlmOptions {
            provider: LlmProvider::VertexAi,
            model: "gemini-1.5-pro".to_string(),
            access_token: Some("tok".to_string()),
            project: Some("my-proj".to_string()),
            location: "europe-west4".to_string(),
            base_url: Some(server.uri()),
            ..LlmOptions::default()
        };
        let client = GeminiClient::new(&options).unwrap();
        assert_eq!(client.generate("x").await.unwrap(), "vertex");
    }

    #[test]
    fn test_missing_credentials() {
        let result = GeminiClient::new(&LlmOptions::default());
        assert!(matches!(result, Err(TfScopeError::ConfigMissing { ref key, .. }) if key == "llm.api_key"));

        let vertex = LlmOptions {
            provider: LlmProvider::VertexAi,
            access_token: Some("tok".to_string()),
            ..LlmOptions::default()
        };
        assert!(matches!(GeminiClient::new(&vertex), Err(TfScopeError::ConfigMissing { ref key, .. }) if key == "llm.project"));
    }
}
