//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate (embedding, retrieval).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Chat call to the model runtime failed.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Invalid engine settings.
    #[error("config error: {0}")]
    Config(String),
}

impl ContextorError {
    /// True when the model runtime could not be reached.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ContextorError::Llm(e) => e.is_unavailable(),
            ContextorError::Rag(rag_store::RagError::Llm(e)) => e.is_unavailable(),
            _ => false,
        }
    }
}
