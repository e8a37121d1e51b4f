//! Ollama embedding provider backed by the shared [`LlmServiceProfiles`].

use std::sync::Arc;

use ai_llm_service::{LlmModelConfig, LlmServiceProfiles};

use crate::embed::{EmbedFuture, EmbeddingsProvider};

/// Ollama embedding provider (async).
#[derive(Clone, Debug)]
pub struct OllamaEmbedder {
    svc: Arc<LlmServiceProfiles>,
    cfg: LlmModelConfig,
}

impl OllamaEmbedder {
    /// Embedder for one of the catalog's embedding models.
    pub fn new(svc: Arc<LlmServiceProfiles>, model: &str) -> Self {
        let cfg = svc.catalog().embedding_config(model);
        Self { svc, cfg }
    }
}

impl EmbeddingsProvider for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.cfg.model
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(self.svc.embed(&self.cfg, texts).await?) })
    }
}
