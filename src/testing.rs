//! Numeric comparison helpers for tests
//!
//! Tolerances follow the usual `allclose` convention:
//! `|a - b| <= atol + rtol * |b|` element-wise.

/// Default relative tolerance
pub const RTOL: f64 = 1e-5;
/// Default absolute tolerance
pub const ATOL: f64 = 1e-8;

/// Element-wise closeness with the default tolerances
pub fn allclose(a: &[f64], b: &[f64]) -> bool {
    allclose_with(a, b, RTOL, ATOL)
}

/// Element-wise closeness with explicit tolerances
pub fn allclose_with(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs())
}

/// Largest element-wise absolute difference
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Panic with a readable message unless `actual` and `expected` are close
#[track_caller]
pub fn assert_allclose(actual: &[f64], expected: &[f64]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "length mismatch: {} vs {}",
        actual.len(),
        expected.len()
    );
    assert!(
        allclose(actual, expected),
        "vectors not close (max abs diff {:e})\n  actual:   {:?}\n  expected: {:?}",
        max_abs_diff(actual, expected),
        actual,
        expected
    );
}
