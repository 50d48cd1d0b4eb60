//! Cosine similarity and top-k ranking

use std::cmp::Ordering;

/// Ranking precondition failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimilarityError {
    #[error("Embedding dimension mismatch: {left} != {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Cannot compare a zero-magnitude vector")]
    ZeroVector,

    #[error("Cannot compare empty vectors")]
    Empty,
}

/// Cosine similarity of two vectors, in `[-1.0, 1.0]`.
///
/// Both vectors must have the same non-zero length and non-zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(SimilarityError::Empty);
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(SimilarityError::ZeroVector);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Check that a vector is usable for ranking: non-empty, finite and non-zero
pub fn validate_vector(v: &[f32]) -> Result<(), SimilarityError> {
    if v.is_empty() {
        return Err(SimilarityError::Empty);
    }
    if v.iter().any(|x| !x.is_finite()) || v.iter().all(|x| *x == 0.0) {
        return Err(SimilarityError::ZeroVector);
    }
    Ok(())
}

/// Score every candidate against `query` and keep the best `k`.
///
/// Ordering is by descending score, ties broken by ascending key so repeated
/// calls over the same data give the same order. Any candidate with a
/// different dimension fails the whole ranking.
pub fn rank_top_k<'a, K, I>(query: &[f32], candidates: I, k: usize) -> Result<Vec<(K, f32)>, SimilarityError>
where
    K: Ord,
    I: IntoIterator<Item = (K, &'a [f32])>,
{
    let mut scored = candidates
        .into_iter()
        .map(|(key, vector)| cosine_similarity(query, vector).map(|score| (key, score)))
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by(|(ka, sa), (kb, sb)| match sb.total_cmp(sa) {
        Ordering::Equal => ka.cmp(kb),
        other => other,
    });
    scored.truncate(k);
    Ok(scored)
}
