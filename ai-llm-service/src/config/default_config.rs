//! Model catalog loaded from environment variables.
//!
//! The UI offers a small, fixed set of models to choose from. This module
//! turns the environment into that catalog and builds [`LlmModelConfig`]
//! values for the chosen chat/embedding models.
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)
//! - `CHAT_MODELS`                 = comma separated chat models (default `tinyllama,phi`)
//! - `EMBEDDING_MODELS`            = comma separated embedding models (default `nomic-embed-text,bge-m3`)
//! - `LLM_TEMPERATURE`             = default temperature (default `0.2`, range `0.0..=1.0`)
//! - `LLM_REQUEST_TIMEOUT_SECS`    = chat request timeout (default `120`)
//! - `LLM_MAX_TOKENS`              = optional max tokens (u32)
//!
//! The first entry of each list is the default choice.

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_opt_f32, env_opt_list, env_opt_u32, env_opt_u64,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_MODELS: [&str; 2] = ["tinyllama", "phi"];
pub const DEFAULT_EMBEDDING_MODELS: [&str; 2] = ["nomic-embed-text", "bge-m3"];
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// The set of models a session may pick from, plus shared runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCatalog {
    /// Runtime base URL.
    pub endpoint: String,
    /// Allowed chat models; the first one is the default.
    pub chat_models: Vec<String>,
    /// Allowed embedding models; the first one is the default.
    pub embedding_models: Vec<String>,
    /// Default sampling temperature.
    pub temperature: f32,
    /// Timeout for chat requests.
    pub request_timeout_secs: u64,
    /// Optional generation cap.
    pub max_tokens: Option<u32>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OLLAMA_URL.to_string(),
            chat_models: DEFAULT_CHAT_MODELS.iter().map(|s| s.to_string()).collect(),
            embedding_models: DEFAULT_EMBEDDING_MODELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_tokens: None,
        }
    }
}

impl ModelCatalog {
    /// Builds the catalog from environment, falling back to defaults.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidNumber`] for unparsable numbers
    /// - [`ConfigError::InvalidFormat`] for an endpoint without http/https
    /// - [`ConfigError::OutOfRange`] for a temperature outside `0.0..=1.0`
    pub fn from_env() -> Result<Self, AiLlmError> {
        let dflt = Self::default();

        let catalog = Self {
            endpoint: ollama_endpoint()?,
            chat_models: env_opt_list("CHAT_MODELS")?.unwrap_or(dflt.chat_models),
            embedding_models: env_opt_list("EMBEDDING_MODELS")?.unwrap_or(dflt.embedding_models),
            temperature: env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(dflt.temperature),
            request_timeout_secs: env_opt_u64("LLM_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(dflt.request_timeout_secs),
            max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        };

        catalog.validate()?;
        Ok(catalog)
    }

    /// Validates endpoint, lists and temperature.
    pub fn validate(&self) -> Result<(), AiLlmError> {
        validate_http_endpoint("OLLAMA_URL", &self.endpoint)?;
        if self.chat_models.is_empty() || self.embedding_models.is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_temperature(self.temperature)
    }

    /// Default chat model (first entry).
    pub fn default_chat_model(&self) -> &str {
        &self.chat_models[0]
    }

    /// Default embedding model (first entry).
    pub fn default_embedding_model(&self) -> &str {
        &self.embedding_models[0]
    }

    /// Ensures `model` is one of the allowed chat models.
    pub fn check_chat_model(&self, model: &str) -> Result<(), AiLlmError> {
        check_member(model, &self.chat_models)
    }

    /// Ensures `model` is one of the allowed embedding models.
    pub fn check_embedding_model(&self, model: &str) -> Result<(), AiLlmError> {
        check_member(model, &self.embedding_models)
    }

    /// Config for a chat model at the given temperature.
    pub fn chat_config(&self, model: &str, temperature: f32) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.to_string(),
            endpoint: self.endpoint.clone(),
            max_tokens: self.max_tokens,
            temperature: Some(temperature),
            top_p: None,
            timeout_secs: Some(self.request_timeout_secs),
        }
    }

    /// Config for an embedding model (deterministic, short timeout).
    pub fn embedding_config(&self, model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.to_string(),
            endpoint: self.endpoint.clone(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(EMBEDDING_TIMEOUT_SECS),
        }
    }
}

/// Validates a sampling temperature against the UI slider range.
pub fn validate_temperature(value: f32) -> Result<(), AiLlmError> {
    validate_range_f32("temperature", value, MIN_TEMPERATURE, MAX_TEMPERATURE)
}

/// Resolves the Ollama endpoint from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. [`DEFAULT_OLLAMA_URL`]
///
/// # Errors
/// [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is not a valid port.
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        port.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
            var: "OLLAMA_PORT",
            reason: "expected u16 (1..=65535)",
        })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Ok(DEFAULT_OLLAMA_URL.to_string())
}

fn check_member(model: &str, allowed: &[String]) -> Result<(), AiLlmError> {
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }
    if allowed.iter().any(|m| m == model) {
        Ok(())
    } else {
        Err(ConfigError::UnknownModel {
            model: model.to_string(),
            allowed: allowed.join(", "),
        }
        .into())
    }
}
