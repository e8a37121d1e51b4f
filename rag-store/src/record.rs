//! Core data models used by the library.

use serde::Serialize;

/// Where a piece of text came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    /// File name without directory (e.g. `uploaded.pdf`).
    pub file_name: String,
    /// Path the file was read from.
    pub file_path: String,
    /// 1-based page label for paginated sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
}

/// A loaded document: one page of a PDF, or one whole text file.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// A chunk of a document produced by the splitter.
#[derive(Clone, Debug, PartialEq)]
pub struct TextChunk {
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// An embedded chunk stored in the index.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
}

/// Query parameters for retrieval.
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: usize,
}

/// A single retrieval hit with score, text and source.
#[derive(Clone, Debug, Serialize)]
pub struct RagHit {
    pub score: f32,
    pub node_id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}
