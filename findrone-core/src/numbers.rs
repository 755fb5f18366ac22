//! Numeric conversion helpers centralizing lossy casts.

use num_traits::cast::cast;

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert an occupancy cell to f64.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Sum only the entries that are not exactly zero.
///
/// Negative entries are kept; the filter is a strict `!= 0.0`, not a magnitude threshold.
#[must_use]
pub fn sum_nonzero<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().filter(|value| *value != 0.0).sum()
}

/// Divide, returning 0.0 when the denominator is exactly zero.
#[must_use]
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Divide, returning `None` when the denominator is exactly zero.
#[must_use]
pub fn ratio_or_none(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_conversion_is_exact_for_small_values() {
        assert!((count_to_f64(10) - 10.0).abs() < f64::EPSILON);
        assert!((u32_to_f64(7) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sum_nonzero_skips_only_exact_zero() {
        let total = sum_nonzero([0.0, 1.5, -0.5, 0.0, 2.0]);
        assert!((total - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ratios_guard_zero_denominator() {
        assert!((ratio_or_zero(4.0, 0.0) - 0.0).abs() < f64::EPSILON);
        assert!((ratio_or_zero(4.0, 2.0) - 2.0).abs() < f64::EPSILON);
        assert_eq!(ratio_or_none(4.0, 0.0), None);
        assert_eq!(ratio_or_none(3.0, 2.0), Some(1.5));
    }
}
