//! Indexing and query-engine construction behind one seam.
//!
//! Handlers talk to a [`DocumentPipeline`]; the server uses
//! [`OllamaPipeline`], tests plug in a counting fake.

use std::{future::Future, path::Path, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;
use contextor::{ContextorConfig, OllamaChat, QueryEngine};
use rag_store::{DirectoryReader, OllamaEmbedder, RagConfig, RagError, TextSplitter, VectorIndex};
use tracing::info;

use crate::core::session::ModelSettings;

pub type IndexFuture<'a> = Pin<Box<dyn Future<Output = Result<VectorIndex, RagError>> + Send + 'a>>;

pub trait DocumentPipeline: Send + Sync {
    /// Loads every file in `dir` and indexes it with `embed_model`.
    fn index_dir<'a>(&'a self, dir: &'a Path, embed_model: &'a str) -> IndexFuture<'a>;

    /// Builds a query engine over `index` with the session's model settings.
    fn query_engine(&self, index: Arc<VectorIndex>, settings: &ModelSettings) -> QueryEngine;
}

/// Pipeline backed by the local Ollama runtime.
#[derive(Debug)]
pub struct OllamaPipeline {
    svc: Arc<LlmServiceProfiles>,
    rag: RagConfig,
    contextor: ContextorConfig,
    max_file_size: u64,
}

impl OllamaPipeline {
    pub fn new(
        svc: Arc<LlmServiceProfiles>,
        rag: RagConfig,
        contextor: ContextorConfig,
        max_file_size: u64,
    ) -> Self {
        Self {
            svc,
            rag,
            contextor,
            max_file_size,
        }
    }
}

impl DocumentPipeline for OllamaPipeline {
    fn index_dir<'a>(&'a self, dir: &'a Path, embed_model: &'a str) -> IndexFuture<'a> {
        Box::pin(async move {
            let docs = DirectoryReader::new(dir)
                .with_max_file_size(self.max_file_size)
                .load_data()
                .await?;
            let embedder = OllamaEmbedder::new(self.svc.clone(), embed_model);
            let splitter = TextSplitter::from_config(&self.rag);
            let index = VectorIndex::from_documents(&docs, &splitter, &embedder, &self.rag).await?;
            info!(dir = %dir.display(), nodes = index.len(), "directory indexed");
            Ok(index)
        })
    }

    fn query_engine(&self, index: Arc<VectorIndex>, settings: &ModelSettings) -> QueryEngine {
        let embedder = Arc::new(OllamaEmbedder::new(self.svc.clone(), &settings.embed_model));
        let llm = Arc::new(OllamaChat::new(
            self.svc.clone(),
            &settings.chat_model,
            settings.temperature,
        ));
        QueryEngine::new(index, embedder, llm, self.contextor.clone())
    }
}
