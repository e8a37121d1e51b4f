//! Embedding abstraction.

use std::{future::Future, pin::Pin};

use crate::errors::RagError;

/// Boxed future returned by [`EmbeddingsProvider`] methods.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Async because real providers (Ollama) perform HTTP requests. Implement
/// this trait to plug in another backend or a test double.
pub trait EmbeddingsProvider: Send + Sync {
    /// Model identifier the vectors come from.
    fn model_name(&self) -> &str;

    /// Embeds a batch of texts; output order matches input order.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>>;

    /// Embeds a single text.
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let batch = [text.to_string()];
            let mut out = self.embed_batch(&batch).await?;
            out.pop()
                .ok_or_else(|| RagError::Embedding("provider returned no vector".into()))
        })
    }
}

pub mod ollama;
