//! Unified error types for the crate.

use std::path::PathBuf;

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A PDF could not be parsed (corrupt, encrypted or unsupported).
    #[error("failed to read PDF {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },

    /// The input directory contained no loadable files.
    #[error("no files found in {0}")]
    NoDocuments(PathBuf),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across embeddings.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding backend returned something unusable.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Model runtime call failed.
    #[error(transparent)]
    Llm(#[from] AiLlmError),
}
