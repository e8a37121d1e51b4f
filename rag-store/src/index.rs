//! In-memory vector index over one document set.
//!
//! Built once per upload: documents are split, embedded in ordered batches
//! and kept as [`Node`]s. Retrieval is a brute-force cosine scan, which is
//! plenty for a single PDF.

use tracing::{info, instrument};

use crate::config::RagConfig;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_all;
use crate::errors::RagError;
use crate::record::{Document, Node, RagHit};
use crate::retrieve;
use crate::splitter::TextSplitter;

#[derive(Clone, Debug)]
pub struct VectorIndex {
    nodes: Vec<Node>,
    dim: usize,
    embed_model: String,
}

impl VectorIndex {
    /// Splits, embeds and stores `docs`.
    ///
    /// An empty document set (e.g. a scanned PDF without a text layer) yields
    /// an empty index rather than an error; queries against it find nothing.
    ///
    /// # Errors
    /// Propagates embedding failures and dimension mismatches.
    #[instrument(level = "info", skip_all, fields(documents = docs.len(), model = provider.model_name()))]
    pub async fn from_documents(
        docs: &[Document],
        splitter: &TextSplitter,
        provider: &dyn EmbeddingsProvider,
        cfg: &RagConfig,
    ) -> Result<Self, RagError> {
        let chunks = splitter.split_documents(docs);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let vectors = embed_all(&texts, provider, cfg.embed_batch, cfg.embedding_concurrency).await?;
        let dim = vectors.first().map_or(0, Vec::len);

        let nodes: Vec<Node> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(c, embedding)| Node {
                id: format!("{}#{}", c.document_id, c.chunk_index),
                text: c.text,
                metadata: c.metadata,
                embedding,
            })
            .collect();

        info!(nodes = nodes.len(), dim, "vector index built");
        Ok(Self {
            nodes,
            dim,
            embed_model: provider.model_name().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vector dimension; `0` for an empty index.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embedding model the index was built with.
    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    /// Top-`top_k` nodes for an already embedded query, best first.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`] when `query` has the wrong dimension.
    pub fn retrieve(&self, query: &[f32], top_k: usize) -> Result<Vec<RagHit>, RagError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(RagError::VectorSizeMismatch {
                got: query.len(),
                want: self.dim,
            });
        }
        Ok(retrieve::top_k(&self.nodes, query, top_k))
    }
}
