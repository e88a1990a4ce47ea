use super::types::{EvaluationError, TextEmbedder};

/// Cosine similarity of two embeddings.
///
/// Zero-norm vectors score 0.0. The result is clamped to [-1, 1] to absorb
/// float drift on normalized vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EvaluationError> {
    if a.len() != b.len() {
        return Err(EvaluationError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Semantic similarity between a report and its rewrite.
///
/// Empty or whitespace-only input on either side scores 0.0 without
/// touching the embedder. Embedder failures propagate.
pub fn similarity(
    embedder: &dyn TextEmbedder,
    original: &str,
    simplified: &str,
) -> Result<f64, EvaluationError> {
    if original.trim().is_empty() || simplified.trim().is_empty() {
        return Ok(0.0);
    }

    let a = embedder.embed(original)?;
    let b = embedder.embed(simplified)?;
    cosine_similarity(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::evaluation::embedder::HashingEmbedder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    impl TextEmbedder for CountingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EvaluationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0])
        }
        fn dimension(&self) -> usize {
            2
        }
        fn model_id(&self) -> &str {
            "counting"
        }
    }

    struct DownEmbedder;

    impl TextEmbedder for DownEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EvaluationError> {
            Err(EvaluationError::EmbeddingUnavailable("model offline".into()))
        }
        fn dimension(&self) -> usize {
            0
        }
        fn model_id(&self) -> &str {
            "down"
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = [0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn cosine_rejects_dimension_mismatch() {
        let err = cosine_similarity(&[1.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, EvaluationError::DimensionMismatch { left: 1, right: 2 }));
    }

    #[test]
    fn self_similarity_is_near_one() {
        let embedder = HashingEmbedder::default();
        let text = "CT shows a small lesion in the liver.";
        let sim = similarity(&embedder, text, text).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_side_scores_zero_without_embedding() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(similarity(&embedder, "Mild edema.", "").unwrap(), 0.0);
        assert_eq!(similarity(&embedder, "", "Mild edema.").unwrap(), 0.0);
        assert_eq!(similarity(&embedder, "   \n\t", "Mild edema.").unwrap(), 0.0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn embedder_failure_propagates() {
        let err = similarity(&DownEmbedder, "a", "b").unwrap_err();
        assert!(matches!(err, EvaluationError::EmbeddingUnavailable(_)));
    }
}
