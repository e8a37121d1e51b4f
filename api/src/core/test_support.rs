//! Fakes shared by the api tests. No network, no real PDFs.

use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use ai_llm_service::{LlmServiceProfiles, ModelCatalog};
use contextor::{AnswerModel, ChatFuture, ContextorConfig, QueryEngine};
use rag_store::{
    Document, DocumentMetadata, EmbedFuture, EmbeddingsProvider, RagConfig, RagError,
    TextSplitter, VectorIndex,
};
use upload_store::UPLOAD_FILE_NAME;

use crate::core::{
    app_state::{ApiConfig, AppState},
    pipeline::{DocumentPipeline, IndexFuture},
    session::{ModelSettings, ReindexPolicy},
};

/// Every text gets the same vector, so retrieval returns everything.
struct FlatEmbedder;

impl EmbeddingsProvider for FlatEmbedder {
    fn model_name(&self) -> &str {
        "flat"
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(texts.iter().map(|_| vec![1.0, 0.5]).collect()) })
    }
}

/// Answers `"<model> says: <context>"` and counts calls.
struct EchoChat {
    model: String,
    calls: Arc<AtomicUsize>,
}

impl AnswerModel for EchoChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete<'a>(&'a self, _system: &'a str, user: &'a str) -> ChatFuture<'a, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            let context = user
                .split("---------------------\n")
                .nth(1)
                .and_then(|rest| rest.split("\n---------------------").next())
                .unwrap_or_default();
            Ok(format!("{} says: {}", self.model, context))
        })
    }
}

/// Counting pipeline. The stored upload is read back as text; a leading
/// `%PDF...` token is dropped so `b"%PDF"` alone indexes nothing.
#[derive(Default)]
pub struct FakePipeline {
    pub index_calls: AtomicUsize,
    pub engine_calls: AtomicUsize,
    pub chat_calls: Arc<AtomicUsize>,
    pub fail_next: AtomicBool,
    embed_models: Mutex<Vec<String>>,
}

impl FakePipeline {
    pub fn last_embed_model(&self) -> Option<String> {
        self.embed_models.lock().ok()?.last().cloned()
    }
}

impl DocumentPipeline for FakePipeline {
    fn index_dir<'a>(&'a self, dir: &'a Path, embed_model: &'a str) -> IndexFuture<'a> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut models) = self.embed_models.lock() {
            models.push(embed_model.to_string());
        }
        Box::pin(async move {
            let path = dir.join(UPLOAD_FILE_NAME);
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(RagError::Pdf {
                    path,
                    reason: "corrupt".into(),
                });
            }

            let raw = tokio::fs::read(&path).await?;
            let raw = String::from_utf8_lossy(&raw);
            let text = match raw.split_once(char::is_whitespace) {
                Some((first, rest)) if first.starts_with("%PDF") => rest.trim().to_string(),
                None if raw.starts_with("%PDF") => String::new(),
                _ => raw.trim().to_string(),
            };

            let docs: Vec<Document> = if text.is_empty() {
                Vec::new()
            } else {
                vec![Document {
                    id: format!("{UPLOAD_FILE_NAME}#page=1"),
                    text,
                    metadata: DocumentMetadata {
                        file_name: UPLOAD_FILE_NAME.into(),
                        file_path: path.display().to_string(),
                        page_label: Some("1".into()),
                    },
                }]
            };
            VectorIndex::from_documents(
                &docs,
                &TextSplitter::new(1024, 200),
                &FlatEmbedder,
                &RagConfig::default(),
            )
            .await
        })
    }

    fn query_engine(&self, index: Arc<VectorIndex>, settings: &ModelSettings) -> QueryEngine {
        self.engine_calls.fetch_add(1, Ordering::SeqCst);
        QueryEngine::new(
            index,
            Arc::new(FlatEmbedder),
            Arc::new(EchoChat {
                model: settings.chat_model.clone(),
                calls: self.chat_calls.clone(),
            }),
            ContextorConfig::default(),
        )
    }
}

/// App state over `dir/data` with the default catalog and a fake pipeline.
pub fn test_state(dir: &Path, policy: ReindexPolicy) -> (Arc<AppState>, Arc<FakePipeline>) {
    let fake = Arc::new(FakePipeline::default());
    let llm = Arc::new(LlmServiceProfiles::new(ModelCatalog::default(), Some(1)).unwrap());
    let config = ApiConfig {
        data_dir: dir.join("data"),
        reindex_policy: policy,
        ..ApiConfig::default()
    };
    let state = Arc::new(AppState::new(config, llm, fake.clone()));
    (state, fake)
}
