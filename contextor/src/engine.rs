//! Query engine: retrieval over a [`VectorIndex`] plus compact answer synthesis.

use std::sync::Arc;

use rag_store::{EmbeddingsProvider, RagQuery, VectorIndex, rag_context};
use tracing::{debug, info, instrument};

use crate::api_types::{QueryResponse, SourceNode};
use crate::cfg::ContextorConfig;
use crate::error::ContextorError;
use crate::llm::AnswerModel;
use crate::progress::{NoopProgress, Progress};
use crate::prompt;

/// Answers questions about one indexed document set.
///
/// Cheap to clone; the index is shared. Building a new engine over the same
/// index (e.g. after a chat model change) never re-embeds anything.
#[derive(Clone)]
pub struct QueryEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
    llm: Arc<dyn AnswerModel>,
    cfg: ContextorConfig,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("nodes", &self.index.len())
            .field("embed_model", &self.embedder.model_name())
            .field("chat_model", &self.llm.model_name())
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl QueryEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
        llm: Arc<dyn AnswerModel>,
        cfg: ContextorConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            cfg,
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Answers `question` without progress output.
    ///
    /// # Errors
    /// Propagates embedding, retrieval and chat errors.
    pub async fn query(&self, question: &str) -> Result<QueryResponse, ContextorError> {
        self.query_with_progress(question, &NoopProgress).await
    }

    /// Answers `question`, reporting each stage to `prog`.
    ///
    /// Retrieves `similarity_top_k` nodes, packs them into blocks of at most
    /// `max_ctx_chars`, asks the QA prompt on the first block and refines the
    /// answer once per remaining block.
    #[instrument(level = "info", skip_all, fields(chat_model = self.llm.model_name(), top_k = self.cfg.similarity_top_k))]
    pub async fn query_with_progress(
        &self,
        question: &str,
        prog: &dyn Progress,
    ) -> Result<QueryResponse, ContextorError> {
        prog.step("retrieving context");
        let hits = rag_context(
            &self.index,
            RagQuery {
                text: question,
                top_k: self.cfg.similarity_top_k,
            },
            self.embedder.as_ref(),
        )
        .await?;

        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        let blocks = prompt::pack_blocks(&texts, self.cfg.max_ctx_chars);
        debug!(hits = hits.len(), blocks = blocks.len(), "context packed");

        let source_nodes: Vec<SourceNode> = hits.into_iter().map(SourceNode::from).collect();
        let Some((first, rest)) = blocks.split_first() else {
            prog.finish("no context");
            info!("no context retrieved; skipping model call");
            return Ok(QueryResponse {
                response: None,
                source_nodes,
            });
        };

        prog.step("thinking");
        let mut answer = self
            .llm
            .complete(prompt::DEFAULT_SYSTEM, &prompt::text_qa_prompt(first, question))
            .await?;

        for (i, block) in rest.iter().enumerate() {
            prog.message(&format!("refining ({}/{})", i + 1, rest.len()));
            answer = self
                .llm
                .complete(
                    prompt::DEFAULT_SYSTEM,
                    &prompt::refine_prompt(question, &answer, block),
                )
                .await?;
        }

        prog.finish("done");
        info!(
            sources = source_nodes.len(),
            refines = rest.len(),
            "question answered"
        );
        Ok(QueryResponse {
            response: Some(answer.trim().to_string()),
            source_nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rag_store::{Document, DocumentMetadata, EmbedFuture, RagConfig, TextSplitter};

    use super::*;
    use crate::llm::ChatFuture;

    /// Every text maps to the same direction, so every node is retrieved.
    struct FlatEmbedder;

    impl EmbeddingsProvider for FlatEmbedder {
        fn model_name(&self) -> &str {
            "flat"
        }

        fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async move { Ok(texts.iter().map(|_| vec![1.0, 1.0]).collect()) })
        }
    }

    /// Records prompts and answers with a call counter.
    #[derive(Default)]
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    impl AnswerModel for RecordingModel {
        fn model_name(&self) -> &str {
            "recorder"
        }

        fn complete<'a>(&'a self, _system: &'a str, user: &'a str) -> ChatFuture<'a, String> {
            Box::pin(async move {
                let mut p = self.prompts.lock().unwrap();
                p.push(user.to_string());
                Ok(format!("answer #{}", p.len()))
            })
        }
    }

    fn page(n: usize, text: &str) -> Document {
        Document {
            id: format!("uploaded.pdf#page={n}"),
            text: text.into(),
            metadata: DocumentMetadata {
                file_name: "uploaded.pdf".into(),
                file_path: "data/uploaded.pdf".into(),
                page_label: Some(n.to_string()),
            },
        }
    }

    async fn engine(
        docs: &[Document],
        cfg: ContextorConfig,
    ) -> (QueryEngine, Arc<RecordingModel>) {
        let embedder: Arc<dyn EmbeddingsProvider> = Arc::new(FlatEmbedder);
        let index = VectorIndex::from_documents(
            docs,
            &TextSplitter::new(1024, 200),
            embedder.as_ref(),
            &RagConfig::default(),
        )
        .await
        .unwrap();
        let model = Arc::new(RecordingModel::default());
        let qe = QueryEngine::new(Arc::new(index), embedder, model.clone(), cfg);
        (qe, model)
    }

    #[tokio::test]
    async fn fitting_context_needs_one_call() {
        let (qe, model) = engine(
            &[page(1, "Invoices are due in 30 days."), page(2, "Refunds take a week.")],
            ContextorConfig::default(),
        )
        .await;

        let r = qe.query("When are invoices due?").await.unwrap();
        assert_eq!(r.response.as_deref(), Some("answer #1"));
        assert_eq!(r.source_nodes.len(), 2);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Invoices are due in 30 days."));
        assert!(prompts[0].contains("Refunds take a week."));
    }

    #[tokio::test]
    async fn each_extra_block_adds_one_refine_call() {
        let long_a = format!("Alpha {}", "a".repeat(80));
        let long_b = format!("Beta {}", "b".repeat(80));
        let (qe, model) = engine(
            &[page(1, &long_a), page(2, &long_b)],
            ContextorConfig {
                similarity_top_k: 2,
                max_ctx_chars: 100,
            },
        )
        .await;

        let r = qe.query("What is in the document?").await.unwrap();
        assert_eq!(r.response.as_deref(), Some("answer #2"));

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("existing answer: answer #1"));
    }

    #[tokio::test]
    async fn empty_index_gives_empty_response_without_model_call() {
        let (qe, model) = engine(&[], ContextorConfig::default()).await;

        let r = qe.query("anything?").await.unwrap();
        assert_eq!(r.response, None);
        assert_eq!(r.answer_text(), "Empty Response");
        assert!(model.prompts.lock().unwrap().is_empty());
    }
}
