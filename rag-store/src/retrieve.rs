//! Retrieval helpers: similarity scoring and top-K selection.

use tracing::trace;

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::record::{Node, RagHit, RagQuery};

/// Cosine similarity; `0.0` for zero vectors or mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Scores every node and returns the best `top_k`, highest score first.
/// Ties keep insertion order.
pub fn top_k(nodes: &[Node], query_vector: &[f32], top_k: usize) -> Vec<RagHit> {
    let mut scored: Vec<(usize, f32)> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (i, cosine_similarity(&n.embedding, query_vector)))
        .collect();

    // stable sort keeps insertion order among equal scores
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(i, score)| {
            let n = &nodes[i];
            RagHit {
                score,
                node_id: n.id.clone(),
                text: n.text.clone(),
                metadata: n.metadata.clone(),
            }
        })
        .collect()
}

/// Embeds the query text and returns the top hits from the index.
///
/// # Errors
/// Returns provider errors, or [`RagError::VectorSizeMismatch`] when the
/// query vector does not match the index dimension (e.g. a different
/// embedding model than the one used for indexing).
pub async fn rag_context(
    index: &VectorIndex,
    query: RagQuery<'_>,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<RagHit>, RagError> {
    trace!("retrieve::rag_context top_k={}", query.top_k);
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let qv = provider.embed(query.text).await?;
    let hits = index.retrieve(&qv, query.top_k)?;
    trace!("retrieve::rag_context hits={}", hits.len());
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DocumentMetadata;

    fn node(id: &str, v: Vec<f32>) -> Node {
        Node {
            id: id.into(),
            text: format!("text of {id}"),
            metadata: DocumentMetadata::default(),
            embedding: v,
        }
    }

    #[test]
    fn cosine_handles_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn returns_best_first_and_bounded() {
        let nodes = vec![
            node("far", vec![0.0, 1.0]),
            node("close", vec![1.0, 0.1]),
            node("mid", vec![1.0, 1.0]),
        ];
        let hits = top_k(&nodes, &[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node_id, "close");
        assert_eq!(hits[1].node_id, "mid");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let nodes = vec![node("a", vec![1.0, 0.0]), node("b", vec![2.0, 0.0])];
        let hits = top_k(&nodes, &[1.0, 0.0], 5);
        assert_eq!(
            hits.iter().map(|h| h.node_id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }
}
