/// Chat Client — the single point of entry for all upstream model calls.
///
/// ARCHITECTURAL RULE: No other module may talk to the completion endpoint
/// directly. All model interactions MUST go through `ChatApi`.
///
/// Model: gpt-4o-mini (hardcoded; do not make configurable, to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

/// The model used for all completion calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gpt-4o-mini";
/// Generous per-request ceiling. A hung upstream call fails here instead of
/// stalling a whole simulation batch.
const REQUEST_TIMEOUT_SECS: u64 = 300;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("model call timed out")]
    Timeout,

    #[error("model returned no choices")]
    EmptyChoices,
}

/// One entry of the messages array sent upstream.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// The model-call collaborator as the rest of the crate sees it.
///
/// Contract: an upstream non-200 status yields an `Ok` diagnostic string
/// (`"Error: {status} - {body}"`) so callers always receive text to parse;
/// only a request timeout or a transport failure yields `Err`.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, ChatError>;
}

/// The reqwest-backed `ChatApi` used in production.
/// Wraps an OpenAI-style chat-completions endpoint with retry on 429/5xx.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl ChatClient {
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint,
        }
    }
}

#[async_trait]
impl ChatApi for ChatClient {
    /// Makes a chat-completion call, retrying 429 and 5xx responses with
    /// exponential backoff. A status that is still failing after the last
    /// retry becomes a diagnostic string, not an error.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, ChatError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages,
            response_format: json_mode.then_some(ResponseFormat {
                format: "json_object",
            }),
        };

        let mut last_failure: Option<(u16, String)> = None;
        let mut last_transport: Option<reqwest::Error> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Chat call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(self.endpoint.as_str())
                .header("api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) if e.is_timeout() => return Err(ChatError::Timeout),
                Err(e) => {
                    last_transport = Some(e);
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Chat endpoint returned {}: {}", status, body);
                last_failure = Some((status.as_u16(), body));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Ok(diagnostic(status.as_u16(), &body));
            }

            let parsed: ChatResponse = match response.json().await {
                Ok(p) => p,
                Err(e) if e.is_timeout() => return Err(ChatError::Timeout),
                Err(e) => {
                    last_transport = Some(e);
                    continue;
                }
            };

            let choice = parsed.choices.into_iter().next().ok_or(ChatError::EmptyChoices)?;
            debug!("Chat call succeeded ({} chars)", choice.message.content.len());
            return Ok(choice.message.content);
        }

        if let Some((status, body)) = last_failure {
            return Ok(diagnostic(status, &body));
        }
        match last_transport {
            Some(e) => Err(ChatError::Http(e)),
            None => Err(ChatError::EmptyChoices),
        }
    }
}

fn diagnostic(status: u16, body: &str) -> String {
    format!("Error: {status} - {body}")
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Scripted `ChatApi` for tests: delegates every call to a closure.
    pub(crate) struct ScriptedChat<F>(pub F)
    where
        F: Fn(&[ChatMessage], bool) -> Result<String, ChatError> + Send + Sync;

    #[async_trait]
    impl<F> ChatApi for ScriptedChat<F>
    where
        F: Fn(&[ChatMessage], bool) -> Result<String, ChatError> + Send + Sync,
    {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            json_mode: bool,
        ) -> Result<String, ChatError> {
            (self.0)(messages, json_mode)
        }
    }
}
