//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and top-k ranking over passages.

use crate::corpus::Passage;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Keep the `limit` highest-scoring passages.
///
/// Sorted by descending score; equal scores keep corpus order.
pub fn top_k(mut scored: Vec<(f32, Passage)>, limit: usize) -> Vec<(f32, Passage)> {
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.index.cmp(&b.1.index))
    });
    scored.truncate(limit);
    scored
}

/// Rank passages by cosine similarity of their embeddings to `query`.
///
/// `embeddings[i]` belongs to `passages[i]`.
pub fn rank_by_similarity(
    passages: &[Passage],
    embeddings: &[Vec<f32>],
    query: &[f32],
    limit: usize,
) -> Vec<(f32, Passage)> {
    let scored = passages
        .iter()
        .zip(embeddings)
        .map(|(p, emb)| (cosine_similarity(emb, query), p.clone()))
        .collect();
    top_k(scored, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(index: usize) -> Passage {
        Passage { index, content: format!("Passage {index}") }
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // [1,1] · [1,0] = 1, |[1,1]| = sqrt(2), |[1,0]| = 1
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn rank_orders_by_similarity() {
        let passages = vec![passage(0), passage(1), passage(2)];
        let embeddings = vec![
            vec![0.0, 1.0, 0.0], // orthogonal
            vec![1.0, 0.0, 0.0], // identical
            vec![0.5, 0.5, 0.0], // partial
        ];

        let ranked = rank_by_similarity(&passages, &embeddings, &[1.0, 0.0, 0.0], 10);
        let order: Vec<usize> = ranked.iter().map(|(_, p)| p.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn top_k_truncates_and_keeps_ties_in_corpus_order() {
        let scored = vec![(0.5, passage(2)), (0.5, passage(0)), (0.9, passage(1))];
        let kept = top_k(scored, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].1.index, 1);
        assert_eq!(kept[1].1.index, 0);
    }
}
