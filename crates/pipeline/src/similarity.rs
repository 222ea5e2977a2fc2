//! Vector similarity.

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// If either vector has a zero norm the result is `0.0`. Vectors of
/// different lengths are compared as if the shorter one were padded
/// with zeros. Accumulation runs in f64.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = squared_norm(a).sqrt();
    let norm_b = squared_norm(b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let raw = dot / (norm_a * norm_b);
    if !raw.is_finite() {
        return 0.0;
    }

    raw.clamp(-1.0, 1.0) as f32
}

/// Euclidean (L2) norm
pub fn l2_norm(v: &[f32]) -> f32 {
    squared_norm(v).sqrt() as f32
}

fn squared_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum()
}
