//! Embedding executor with concurrency and dimension checks.

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::{embed::EmbeddingsProvider, errors::RagError};

/// Embeds `texts` in batches, with at most `concurrency` requests in flight.
///
/// The returned vectors line up with `texts`. All vectors must share the
/// dimension of the first one.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if dimensions mismatch, or the
/// provider's error if any batch fails.
pub async fn embed_all(
    texts: &[String],
    provider: &dyn EmbeddingsProvider,
    batch_size: usize,
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    info!(
        total = texts.len(),
        batch_size,
        concurrency,
        model = provider.model_name(),
        "embed_pool::embed_all"
    );

    if texts.is_empty() {
        debug!("embed_pool::embed_all: nothing to embed");
        return Ok(Vec::new());
    }

    // owned batches keep the stream's futures `Send` for callers that box them
    let batches: Vec<Vec<String>> = texts
        .chunks(batch_size.max(1))
        .map(<[String]>::to_vec)
        .collect();

    let mut embedded: Vec<(usize, Vec<Vec<f32>>)> = stream::iter(batches.into_iter().enumerate())
        .map(|(i, batch)| async move {
            let vecs = provider.embed_batch(&batch).await?;
            if vecs.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "batch {i}: expected {} vectors, got {}",
                    batch.len(),
                    vecs.len()
                )));
            }
            Ok::<_, RagError>((i, vecs))
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, RagError>>()?;

    embedded.sort_by_key(|(i, _)| *i);
    let out: Vec<Vec<f32>> = embedded.into_iter().flat_map(|(_, v)| v).collect();

    let want = out.first().map_or(0, Vec::len);
    if want == 0 {
        return Err(RagError::Embedding("provider returned empty vectors".into()));
    }
    if let Some(bad) = out.iter().find(|v| v.len() != want) {
        return Err(RagError::VectorSizeMismatch {
            got: bad.len(),
            want,
        });
    }

    debug!(vectors = out.len(), dim = want, "embed_pool::embed_all: done");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::embed::EmbedFuture;

    /// Encodes each text as `[len, first byte]`; counts batch calls.
    struct LenEmbedder {
        calls: AtomicUsize,
        bad_dim_for: Option<&'static str>,
    }

    impl EmbeddingsProvider for LenEmbedder {
        fn model_name(&self) -> &str {
            "len"
        }

        fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Ok(texts
                    .iter()
                    .map(|t| {
                        if Some(t.as_str()) == self.bad_dim_for {
                            vec![1.0]
                        } else {
                            vec![t.len() as f32, t.bytes().next().unwrap_or(0) as f32]
                        }
                    })
                    .collect())
            })
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| "a".repeat(i + 1)).collect()
    }

    #[tokio::test]
    async fn keeps_order_across_concurrent_batches() {
        let p = LenEmbedder {
            calls: AtomicUsize::new(0),
            bad_dim_for: None,
        };
        let input = texts(10);
        let out = embed_all(&input, &p, 3, 4).await.unwrap();

        assert_eq!(p.calls.load(Ordering::SeqCst), 4);
        let lens: Vec<f32> = out.iter().map(|v| v[0]).collect();
        assert_eq!(lens, (1..=10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_error() {
        let p = LenEmbedder {
            calls: AtomicUsize::new(0),
            bad_dim_for: Some("aaa"),
        };
        let err = embed_all(&texts(5), &p, 2, 2).await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 1, want: 2 }));
    }

    #[tokio::test]
    async fn runs_inside_a_spawned_task() {
        let p = Arc::new(LenEmbedder {
            calls: AtomicUsize::new(0),
            bad_dim_for: None,
        });
        let input = texts(7);
        let provider = p.clone();
        let out = tokio::spawn(async move { embed_all(&input, provider.as_ref(), 2, 3).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(out.len(), 7);
        assert_eq!(p.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn empty_vectors_are_rejected() {
        struct Blank;
        impl EmbeddingsProvider for Blank {
            fn model_name(&self) -> &str {
                "blank"
            }
            fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
                Box::pin(async move { Ok(texts.iter().map(|_| Vec::new()).collect()) })
            }
        }

        let err = embed_all(&texts(2), &Blank, 8, 1).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let p = LenEmbedder {
            calls: AtomicUsize::new(0),
            bad_dim_for: None,
        };
        assert!(embed_all(&[], &p, 8, 1).await.unwrap().is_empty());
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }
}
