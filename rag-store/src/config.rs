//! Chunking and embedding configuration.

use ai_llm_service::error_handler::env_opt_usize;

use crate::errors::RagError;

pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_EMBED_BATCH: usize = 16;
pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;

/// Configuration for indexing.
#[derive(Clone, Debug, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters of trailing context repeated at the start of the next chunk.
    pub chunk_overlap: usize,
    /// Texts sent per embedding request.
    pub embed_batch: usize,
    /// Embedding requests in flight at once.
    pub embedding_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            embed_batch: DEFAULT_EMBED_BATCH,
            embedding_concurrency: DEFAULT_EMBED_CONCURRENCY,
        }
    }
}

impl RagConfig {
    /// Reads `RAG_CHUNK_SIZE`, `RAG_CHUNK_OVERLAP`, `EMBEDDING_BATCH_SIZE`
    /// and `EMBEDDING_CONCURRENCY`, falling back to defaults.
    ///
    /// # Errors
    /// Returns `RagError::Llm` for unparsable numbers and `RagError::Config`
    /// for inconsistent values.
    pub fn from_env() -> Result<Self, RagError> {
        let d = Self::default();
        let cfg = Self {
            chunk_size: env_opt_usize("RAG_CHUNK_SIZE")?.unwrap_or(d.chunk_size),
            chunk_overlap: env_opt_usize("RAG_CHUNK_OVERLAP")?.unwrap_or(d.chunk_overlap),
            embed_batch: env_opt_usize("EMBEDDING_BATCH_SIZE")?.unwrap_or(d.embed_batch),
            embedding_concurrency: env_opt_usize("EMBEDDING_CONCURRENCY")?
                .unwrap_or(d.embedding_concurrency),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embed_batch == 0 || self.embedding_concurrency == 0 {
            return Err(RagError::Config(
                "embedding batch size and concurrency must be > 0".into(),
            ));
        }
        Ok(())
    }
}
