//! Vector helpers shared by the preference model, pair selector, scorer and MMR.
//!
//! All functions treat a shorter slice as if it were zero-padded to the length
//! of the longer one, so dimension mismatches never panic.

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Dot product over the common prefix (missing slots contribute zero)
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Element-wise `a - b`, zero-padding the shorter side
pub fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| a.get(i).copied().unwrap_or(0.0) - b.get(i).copied().unwrap_or(0.0))
        .collect()
}

/// Sum of absolute differences, zero-padding the shorter side
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    difference(a, b).iter().map(|x| x.abs()).sum()
}

/// Scales `v` to unit length. Zero or non-finite norms leave `v` untouched.
pub fn normalize_in_place(v: &mut [f64]) {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
}

/// Cosine similarity, 0.0 when either side has zero norm
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let denom = l2_norm(a) * l2_norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    let result = dot(a, b) / denom;
    if !result.is_finite() {
        return 0.0;
    }
    result.clamp(-1.0, 1.0)
}
