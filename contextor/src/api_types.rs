//! Public API types re-used by external crates (e.g., the HTTP API layer).

use std::fmt;

use rag_store::RagHit;
use serde::Serialize;

/// A retrieved chunk that contributed to an answer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceNode {
    pub node_id: String,
    pub score: f32,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
    pub text: String,
}

impl From<RagHit> for SourceNode {
    fn from(h: RagHit) -> Self {
        Self {
            node_id: h.node_id,
            score: h.score,
            file_name: h.metadata.file_name,
            page_label: h.metadata.page_label,
            text: h.text,
        }
    }
}

/// Result of [`QueryEngine::query`](crate::QueryEngine::query).
///
/// `response` is `None` when nothing was retrieved and no model call was made.
///
/// # Example
/// ```
/// use contextor::QueryResponse;
/// let r = QueryResponse { response: Some("42".into()), source_nodes: vec![] };
/// assert_eq!(r.answer_text(), "42");
///
/// let empty = QueryResponse::default();
/// assert_eq!(empty.answer_text(), "Empty Response");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryResponse {
    pub response: Option<String>,
    pub source_nodes: Vec<SourceNode>,
}

impl QueryResponse {
    /// Text to show to the user: the `response` field when present,
    /// otherwise the `Display` form of the whole response.
    pub fn answer_text(&self) -> String {
        match &self.response {
            Some(text) => text.clone(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for QueryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.response {
            Some(text) => f.write_str(text),
            None => f.write_str("Empty Response"),
        }
    }
}
