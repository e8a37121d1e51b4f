//! Single-document RAG building blocks.
//!
//! This crate provides:
//! - Loading a directory of files (PDF pages or plain text) into documents
//! - Sentence-aware chunking with overlap
//! - Batched, concurrent embedding through an [`EmbeddingsProvider`]
//! - An in-memory cosine [`VectorIndex`] with top-K retrieval
//!
//! The design is flat and splits responsibilities into focused modules.

mod config;
mod embed;
mod embed_pool;
mod errors;
mod index;
mod loader;
mod normalize;
mod record;
mod retrieve;
mod splitter;

pub use config::RagConfig;
pub use embed::{EmbedFuture, EmbeddingsProvider, ollama::OllamaEmbedder};
pub use embed_pool::embed_all;
pub use errors::RagError;
pub use index::VectorIndex;
pub use loader::{DEFAULT_MAX_FILE_SIZE, DirectoryReader};
pub use normalize::normalize_extracted;
pub use record::{Document, DocumentMetadata, Node, RagHit, RagQuery, TextChunk};
pub use retrieve::{cosine_similarity, rag_context};
pub use splitter::TextSplitter;
