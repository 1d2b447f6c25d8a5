//! Numeric helpers shared across the crate.

// =============================================================================
// Link Functions
// =============================================================================

/// Logistic sigmoid `1 / (1 + exp(-x))`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable `ln(1 + exp(v))`.
///
/// Equivalent to `logaddexp(0, v)`: for large positive `v` the naive form
/// overflows to infinity, so the computation is split on the sign of `v`.
#[inline]
pub fn log1p_exp(v: f64) -> f64 {
    if v > 0.0 {
        v + (-v).exp().ln_1p()
    } else {
        v.exp().ln_1p()
    }
}

// =============================================================================
// Quantiles
// =============================================================================

/// Compute the `alpha`-quantile of a slice using a step function.
///
/// No interpolation: returns the value at the point where the cumulative
/// count first reaches `alpha * n`. Returns `f64::NAN` for an empty slice.
///
/// `scratch` holds the index permutation and is resized as needed, so a
/// caller evaluating many quantiles (one per tree leaf) can reuse one buffer.
pub fn quantile(values: &[f64], alpha: f64, scratch: &mut Vec<usize>) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return values[0];
    }

    scratch.clear();
    scratch.extend(0..n);
    scratch.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let threshold = alpha * n as f64;
    let mut cumulative = 0.0;
    for &idx in scratch.iter() {
        cumulative += 1.0;
        if cumulative >= threshold {
            return values[idx];
        }
    }

    values[scratch[n - 1]]
}

/// Median via [`quantile`] at `alpha = 0.5`.
pub fn median(values: &[f64], scratch: &mut Vec<usize>) -> f64 {
    quantile(values, 0.5, scratch)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_symmetry() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log1p_exp_matches_naive_in_safe_range() {
        for &v in &[-5.0, -0.5, 0.0, 0.5, 5.0] {
            let naive = (1.0f64 + f64::exp(v)).ln();
            assert!((log1p_exp(v) - naive).abs() < 1e-12);
        }
    }

    #[test]
    fn log1p_exp_survives_large_inputs() {
        // exp(1000) overflows; the stable form degrades to v itself.
        let v = 1000.0;
        assert!((log1p_exp(v) - v).abs() < 1e-9);
        assert_eq!(log1p_exp(-1000.0), 0.0);
    }

    #[test]
    fn median_odd_and_even() {
        let mut scratch = Vec::new();
        assert_eq!(median(&[3.0, 1.0, 2.0], &mut scratch), 2.0);
        // Step function: the lower of the two central values.
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0], &mut scratch), 2.0);
    }

    #[test]
    fn quantile_empty_is_nan() {
        let mut scratch = Vec::new();
        assert!(quantile(&[], 0.5, &mut scratch).is_nan());
    }

    #[test]
    fn quantile_single_value() {
        let mut scratch = Vec::new();
        assert_eq!(quantile(&[7.5], 0.9, &mut scratch), 7.5);
    }
}
