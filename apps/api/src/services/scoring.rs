//! Similarity scoring: cosine similarity between embedding vectors and the
//! weighted overall score.

use ndarray::ArrayView1;
use thiserror::Error;

/// Fixed weights of the overall score. Design constants, not configuration:
/// requirements dominate, then responsibilities, then description, then the
/// LLM's qualitative score (on its native 1–10 scale).
pub const WEIGHT_REQUIREMENTS: f64 = 40.0;
pub const WEIGHT_RESPONSIBILITIES: f64 = 30.0;
pub const WEIGHT_DESCRIPTION: f64 = 20.0;
pub const WEIGHT_AI_SCORE: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("both embeddings must be provided")]
    MissingVector,

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("cannot score a zero-magnitude vector")]
    ZeroMagnitude,
}

/// Cosine similarity via ndarray, unclamped: identical vectors score ≈ 1.0,
/// opposite vectors ≈ -1.0. Errors on empty or mismatched inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, ScoringError> {
    if a.is_empty() || b.is_empty() {
        return Err(ScoringError::MissingVector);
    }
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let va = ArrayView1::from(a).mapv(|x| x as f64);
    let vb = ArrayView1::from(b).mapv(|x| x as f64);
    let dot = va.dot(&vb);
    let norm_a = va.dot(&va).sqrt();
    let norm_b = vb.dot(&vb).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ScoringError::ZeroMagnitude);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Pure-arithmetic fallback path. Same math as `cosine_similarity`, no
/// linear-algebra dependency; agrees with it within 1e-6 on any input
/// (tested). Kept so the scoring contract is verifiable without trusting
/// the library path.
pub fn cosine_similarity_scalar(a: &[f32], b: &[f32]) -> Result<f64, ScoringError> {
    if a.is_empty() || b.is_empty() {
        return Err(ScoringError::MissingVector);
    }
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut mag_a = 0.0f64;
    let mut mag_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    if mag_a == 0.0 || mag_b == 0.0 {
        return Err(ScoringError::ZeroMagnitude);
    }
    Ok(dot / (mag_a.sqrt() * mag_b.sqrt()))
}

/// Pipeline-facing similarity: cosine clamped to [0, 1]. Anti-correlated
/// embeddings carry no useful ranking signal for resumes, so negatives floor
/// at zero rather than penalizing below an empty match.
pub fn calculate_score(a: &[f32], b: &[f32]) -> Result<f64, ScoringError> {
    Ok(cosine_similarity(a, b)?.clamp(0.0, 1.0))
}

/// Weighted overall score:
/// `req*40 + resp*30 + desc*20 + ai*10 − penalty`.
/// Similarities are expected in [0, 1] and ai_score in [1, 10], so the
/// natural range is 0–190 before penalty.
pub fn overall_score(
    description: f64,
    requirements: f64,
    responsibilities: f64,
    ai_score: f64,
    penalty: f64,
) -> f64 {
    requirements * WEIGHT_REQUIREMENTS
        + responsibilities * WEIGHT_RESPONSIBILITIES
        + description * WEIGHT_DESCRIPTION
        + ai_score * WEIGHT_AI_SCORE
        - penalty
}
