//! Tukey IQR outlier classification over a whole batch of price changes.
//!
//! Quartiles use linear interpolation between closest ranks: for sorted
//! values `v` of length `n`, quantile `q` sits at rank `h = (n - 1) * q` and
//! evaluates to `v[floor(h)] + (h - floor(h)) * (v[ceil(h)] - v[floor(h)])`.

use crate::types::OutlierFences;

/// Linear-interpolated quantile of already sorted values. `None` when empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Quartiles and fences for one batch. `None` for an empty batch.
pub fn compute_fences(values: &[f64], multiplier: f64) -> Option<OutlierFences> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_sorted(&sorted, 0.25)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some(OutlierFences {
        q1,
        q3,
        iqr,
        lower: q1 - multiplier * iqr,
        upper: q3 + multiplier * iqr,
    })
}

/// Flag every value against fences computed once over the full slice.
/// The output is index-aligned with `values`.
pub fn classify(values: &[f64], multiplier: f64) -> (Vec<bool>, Option<OutlierFences>) {
    match compute_fences(values, multiplier) {
        Some(fences) => {
            let flags = values.iter().map(|v| fences.is_outlier(*v)).collect();
            (flags, Some(fences))
        }
        None => (Vec::new(), None),
    }
}
