//! Lightweight Ollama service for chat completions and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat`: non-streaming chat completion (`stream=false`)
//! - `POST {endpoint}/api/embed`: batch embeddings retrieval
//!
//! It uses the universal configuration [`LlmModelConfig`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{ChatMessage, LlmModelConfig, LlmProvider, OllamaService};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "tinyllama".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     max_tokens: None,
//!     temperature: Some(0.2),
//!     top_p: None,
//!     timeout_secs: Some(120),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc
//!     .chat(&[ChatMessage::user("Summarize Rust ownership in one line.")])
//!     .await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{HttpError, make_snippet};

/// Default timeout when the config does not carry one.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors produced by [`OllamaService`].
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Invalid endpoint (empty or missing http/https).
    #[error("[AI LLM Service] invalid Ollama endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport/HTTP client error (connection refused, timeout, ...).
    #[error("[AI LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error(transparent)]
    HttpStatus(#[from] HttpError),

    /// Unexpected/invalid JSON response.
    #[error("[AI LLM Service] failed to decode response: {0}")]
    Decode(String),
}

/// Result alias for Ollama operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// One chat message sent to `/api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`OllamaError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`OllamaError::Transport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(OllamaError::InvalidEndpoint(cfg.endpoint));
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/api/chat", base);
        let url_embed = format!("{}/api/embed", base);

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embed,
        })
    }

    /// The config this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** chat completion via `/api/chat`.
    ///
    /// Mapped options:
    /// - `model`        ← `self.cfg.model`
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for client errors
    /// - [`OllamaError::Decode`] if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            model: &self.cfg.model,
            messages,
            stream: false,
            options: ChatOptions::from_cfg(&self.cfg),
        };

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_chat).await);
        }

        let out: ChatResponse = resp.json().await.map_err(|e| {
            OllamaError::Decode(format!("serde error: {e}; expected `{{ message: {{ content }} }}`"))
        })?;

        Ok(out.message.map(|m| m.content).unwrap_or_default())
    }

    /// Retrieves embeddings for a batch of inputs via `/api/embed`.
    ///
    /// The returned vectors are in the same order as `inputs`.
    ///
    /// # Errors
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for client errors
    /// - [`OllamaError::Decode`] if the response cannot be parsed or the
    ///   number of vectors differs from the number of inputs
    #[instrument(skip_all, fields(model = %self.cfg.model, inputs = inputs.len()))]
    pub async fn embeddings(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        debug!("POST {}", self.url_embed);
        let resp = self.client.post(&self.url_embed).json(&body).send().await?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_embed).await);
        }

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            OllamaError::Decode(format!(
                "serde error: {e}; expected `{{ embeddings: number[][] }}`"
            ))
        })?;

        if out.embeddings.len() != inputs.len() {
            return Err(OllamaError::Decode(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                out.embeddings.len()
            )));
        }

        Ok(out.embeddings)
    }

    async fn status_error(&self, resp: reqwest::Response, url: &str) -> OllamaError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        OllamaError::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet: make_snippet(&text),
        })
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl ChatOptions {
    fn from_cfg(cfg: &LlmModelConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        }
    }
}

/// Response body for `/api/chat`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

/// Request body for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response body for `/api/embed`.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::llm_provider::LlmProvider;

    fn cfg(endpoint: &str, model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: endpoint.into(),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        let err = OllamaService::new(cfg("localhost:11434", "tinyllama"))
            .err()
            .unwrap();
        assert!(matches!(err, OllamaError::InvalidEndpoint(_)));
    }

    #[tokio::test]
    async fn chat_sends_model_and_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "tinyllama",
                "stream": false,
                "options": { "temperature": 0.2 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "tinyllama",
                "message": { "role": "assistant", "content": "Forty-two." },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri(), "tinyllama")).unwrap();
        let out = svc
            .chat(&[ChatMessage::system("be brief"), ChatMessage::user("answer?")])
            .await
            .unwrap();
        assert_eq!(out, "Forty-two.");
    }

    #[tokio::test]
    async fn chat_maps_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model 'phi' not found"))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri(), "phi")).unwrap();
        let err = svc.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        match err {
            OllamaError::HttpStatus(e) => {
                assert_eq!(e.status.as_u16(), 404);
                assert!(e.snippet.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn embeddings_preserve_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(json!({
                "model": "nomic-embed-text",
                "input": ["a", "b"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "nomic-embed-text",
                "embeddings": [[1.0, 0.0], [0.0, 1.0]]
            })))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri(), "nomic-embed-text")).unwrap();
        let out = svc
            .embeddings(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn embeddings_count_mismatch_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [[1.0, 0.0]]
            })))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri(), "nomic-embed-text")).unwrap();
        let err = svc
            .embeddings(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, OllamaError::Decode(_)));
    }

    #[tokio::test]
    async fn empty_batch_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri(), "nomic-embed-text")).unwrap();
        assert!(svc.embeddings(&[]).await.unwrap().is_empty());
    }
}
