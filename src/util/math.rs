//! Numeric helpers shared by the decoders.

/// Integer division rounding up, as used to derive grid strides.
#[inline]
pub(crate) fn div_up(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor)
}

/// Normalizes a raw confidence into `[0, 1]`.
///
/// Returns `None` for NaN, infinities, and negative values; values above one
/// are clamped.
#[inline]
pub(crate) fn unit_confidence(value: f32) -> Option<f32> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.min(1.0))
}

/// Returns the index and value of the first strictly positive maximum.
///
/// Scores that are all `<= 0` (or NaN) yield `None`.
pub(crate) fn argmax_positive(scores: impl IntoIterator<Item = f32>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, score) in scores.into_iter().enumerate() {
        let threshold = best.map_or(0.0, |(_, value)| value);
        if score > threshold {
            best = Some((idx, score));
        }
    }
    best
}
