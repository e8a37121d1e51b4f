//! Query engine over a single-document vector index.
//!
//! Public API: [`QueryEngine`]. It embeds the question, retrieves the top-K
//! nodes from a `rag-store` [`VectorIndex`](rag_store::VectorIndex), packs
//! them into as few prompts as fit the context budget, asks the chat model,
//! refines the answer over any remaining blocks and returns a
//! [`QueryResponse`] with the source nodes used.

mod api_types;
mod cfg;
mod engine;
mod error;
mod llm;
mod progress;
pub mod prompt;

pub use api_types::{QueryResponse, SourceNode};
pub use cfg::{ContextorConfig, DEFAULT_MAX_CTX_CHARS, DEFAULT_TOP_K};
pub use engine::QueryEngine;
pub use error::ContextorError;
pub use llm::{AnswerModel, ChatFuture, OllamaChat};
pub use progress::{IndicatifProgress, NoopProgress, Progress, for_terminal};
