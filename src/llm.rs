//! Chat-completion transport.
//!
//! One logical call per [`CompletionProvider::complete`]: the prompt goes out as a single
//! user message and the trimmed content of the first choice comes back. Timeouts are
//! retried by [`retry_on_timeout`]; HTTP, network and format errors surface immediately.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::Duration;

use crate::error::LlmError;
use crate::settings::Settings;

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-call generation and retry parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CallOptions {
    pub max_tokens: u32,
    pub temperature: f64,
    /// Extra attempts after a timeout; total attempts are `1 + max_retries`.
    pub max_retries: u32,
    /// Applied to each attempt separately.
    pub timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for CallOptions {
    fn default() -> Self {
        CallOptions {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl CallOptions {
    /// Enough tokens for a single word, near-deterministic sampling.
    pub fn classification() -> Self {
        CallOptions {
            max_tokens: 10,
            temperature: 0.1,
            max_retries: 0,
            timeout: Duration::from_secs(15),
            ..Self::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: self.retry_delay,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the attempt budget
/// is spent. `op` receives the 1-based attempt number.
pub async fn retry_on_timeout<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, LlmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                log::warn!(
                    "Timeout on attempt {attempt}/{max_attempts}, retrying in {:?}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(LlmError::Timeout { .. }) => {
                log::error!("Timeout after {attempt} attempt(s)");
                return Err(LlmError::Timeout { attempts: attempt });
            }
            Err(e) => return Err(e),
        }
    }
}

/// The seam every model-backed component is generic over.
pub trait CompletionProvider: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Extracts `choices[0].message.content` from a response body, trimmed.
pub fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)?;
    response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            LlmError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

fn truncate_for_log(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// A non-2xx status is final even when its body cannot be read.
fn http_error<E: std::fmt::Display>(status: u16, body: Result<String, E>) -> LlmError {
    let body = body.unwrap_or_else(|e| {
        log::warn!("Could not read body of HTTP {status} response: {e}");
        String::new()
    });
    log::error!("OpenRouter API error {status}: {}", truncate_for_log(&body));
    LlmError::Http { status, body }
}

#[derive(Clone, Debug)]
pub struct OpenRouterClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.trim().to_string(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `Ok(None)` when no API key is configured: callers degrade instead of calling out.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>, LlmError> {
        match settings.api_key() {
            Some(key) => Self::new(key, &settings.ai.default_model, &settings.ai.base_url).map(Some),
            None => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub async fn call_api(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        let policy = options.retry_policy();
        let max_attempts = policy.max_attempts();
        retry_on_timeout(policy, move |attempt| {
            self.send_once(prompt, options, attempt, max_attempts)
        })
        .await
    }

    async fn send_once(
        &self,
        prompt: &str,
        options: &CallOptions,
        attempt: u32,
        max_attempts: u32,
    ) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        log::debug!(
            "Sending request to OpenRouter (model: {}, attempt {attempt}/{max_attempts}, max_tokens: {})",
            self.model,
            options.max_tokens
        );

        let response = self
            .http_client
            .post(self.chat_completions_url())
            .bearer_auth(&self.api_key)
            .timeout(options.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, attempt))?;

        let status = response.status();
        log::debug!("OpenRouter responded with status {status}");

        if !status.is_success() {
            return Err(http_error(status.as_u16(), response.text().await));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::from_reqwest(e, attempt))?;

        let content = parse_completion(&body).inspect_err(|e| {
            log::error!("{e}; response: {}", truncate_for_log(&body));
        })?;
        log::debug!("OpenRouter returned {} characters", content.chars().count());
        Ok(content)
    }
}

impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        self.call_api(prompt, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_completion_trims_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"  вопрос \n"}},{"message":{"content":"x"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "вопрос");
    }

    #[test]
    fn parse_completion_rejects_missing_fields() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            "not json",
        ] {
            assert!(
                matches!(parse_completion(body), Err(LlmError::MalformedResponse(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn request_body_has_expected_shape() {
        let request = ChatCompletionRequest {
            model: "anthropic/claude-3-haiku",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            max_tokens: 10,
            temperature: 0.1,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "anthropic/claude-3-haiku");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert_eq!(value["max_tokens"], 10);
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn unreadable_error_body_stays_an_http_error() {
        let err = http_error(503, Err::<String, _>("operation timed out"));
        assert!(matches!(err, LlmError::Http { status: 503, ref body } if body.is_empty()));
        assert!(!err.is_retryable());

        let err = http_error::<String>(429, Ok("rate limited".to_string()));
        assert!(matches!(err, LlmError::Http { status: 429, ref body } if body == "rate limited"));
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            OpenRouterClient::new("  ", "m", "http://localhost"),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn from_settings_without_key_is_none() {
        let settings = Settings::default();
        assert!(OpenRouterClient::from_settings(&settings).unwrap().is_none());
    }

    #[test]
    fn truncate_for_log_respects_char_boundaries() {
        let body = "я".repeat(600);
        assert_eq!(truncate_for_log(&body).chars().count(), 500);
        assert_eq!(truncate_for_log("short"), "short");
    }
}
