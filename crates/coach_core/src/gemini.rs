//! Completion service backed by the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use shared::{
    domain::Turn,
    error::CompletionError,
    protocol::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, FINISH_REASON_SAFETY},
};
use tracing::{debug, warn};
use url::Url;

use crate::{Completion, CompletionService};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Problems found while building a client, before any request is made.
#[derive(Debug, Error)]
pub enum GeminiSetupError {
    #[error("invalid API base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("API base url '{url}' cannot carry a path")]
    CannotBeABase { url: String },
    #[error("failed to build HTTP client: {0}")]
    Http(#[source] reqwest::Error),
}

pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    request_timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiSetupError> {
        let endpoint = generate_content_url(&config.base_url, &config.model, &config.api_key)?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| GeminiSetupError::Http(err.without_url()))?;

        Ok(Self {
            http,
            endpoint,
            request_timeout: config.request_timeout,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout {
                limit: self.request_timeout,
            }
        } else {
            // The endpoint carries the API key in its query string.
            CompletionError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, transcript: &[Turn]) -> Result<Completion, CompletionError> {
        let body = GenerateContentRequest::from_transcript(transcript);

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| self.map_send_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            warn!(status = status.as_u16(), "completion service rejected request");
            return Err(map_http_error(status, body));
        }

        let raw = response.text().await.map_err(|err| self.map_send_error(err))?;
        let parsed: GenerateContentResponse = serde_json::from_str(&raw)
            .map_err(|err| CompletionError::Malformed(err.to_string()))?;
        debug!(candidates = parsed.candidates.len(), "completion received");

        extract_completion(parsed)
    }
}

pub fn generate_content_url(
    base_url: &str,
    model: &str,
    api_key: &str,
) -> Result<Url, GeminiSetupError> {
    let mut url = Url::parse(base_url).map_err(|source| GeminiSetupError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    url.path_segments_mut()
        .map_err(|_| GeminiSetupError::CannotBeABase {
            url: base_url.to_string(),
        })?
        .pop_if_empty()
        .push("models")
        .push(&format!("{model}:generateContent"));
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// Takes the first candidate's first text part.
fn extract_completion(response: GenerateContentResponse) -> Result<Completion, CompletionError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match block_reason {
            Some(reason) => CompletionError::Blocked { reason },
            None => CompletionError::NoContent,
        });
    };

    let text = candidate
        .content
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty());

    match (text, candidate.finish_reason) {
        (Some(text), finish_reason) => Ok(Completion {
            text,
            finish_reason,
        }),
        (None, Some(reason)) if reason == FINISH_REASON_SAFETY => {
            Err(CompletionError::Blocked { reason })
        }
        (None, _) => Err(CompletionError::NoContent),
    }
}

fn map_http_error(status: StatusCode, body: String) -> CompletionError {
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| {
            let status_text = envelope.error.status.unwrap_or_default();
            let msg = envelope.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    CompletionError::Status {
        status: status.as_u16(),
        body: message,
    }
}

#[cfg(test)]
#[path = "tests/gemini_tests.rs"]
mod tests;
