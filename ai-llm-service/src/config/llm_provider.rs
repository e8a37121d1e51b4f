/// Represents the provider (backend) used for model inference.
///
/// Only the local Ollama runtime is wired today. New local runtimes
/// (e.g., llama.cpp server) can be added by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
}
