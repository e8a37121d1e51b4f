use crate::config::llm_provider::LlmProvider;

/// Configuration for a single model invocation profile.
///
/// One value describes either a chat model (with sampling knobs) or an
/// embedding model (sampling knobs unused).
///
/// # Fields
///
/// - `provider`: Which runtime serves the model.
/// - `model`: The model identifier (e.g., `"tinyllama"`, `"nomic-embed-text"`).
/// - `endpoint`: Base URL of the runtime, e.g. `http://localhost:11434`.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "tinyllama".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     max_tokens: None,
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(120),
/// };
/// assert_eq!(cfg.model, "tinyllama");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The model runtime/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Runtime base URL.
    pub endpoint: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
