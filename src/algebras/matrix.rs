//! Block-matrix kernels shared by the VTB variants
//!
//! A vector `x` of dimensionality `d = k²` is read row-major as a k×k matrix.
//! The scaled matrix form `X̂ = √k · reshape(x)` turns VTB binding into
//! `Â B̂ᵀ` and TVTB binding into `Â B̂`, so identities, inverses and powers
//! become ordinary matrix algebra on `X̂`.
//!
//! The index kernels and integer powers below are always available.
//! Decompositions (SVD, QR, symmetric eigen, real Schur, inverse) need the
//! `linalg` feature and report [`SpaError::NotImplemented`](crate::SpaError::NotImplemented)
//! without it.

use crate::Result;

#[cfg(feature = "linalg")]
pub(crate) use dense::*;
#[cfg(not(feature = "linalg"))]
pub(crate) use fallback::*;

/// How the second operand is read when binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    /// `B[r][c] = b[r*k + c]` (VTB)
    Rows,
    /// `B[r][c] = b[c*k + r]` (TVTB)
    Columns,
}

impl Layout {
    #[inline]
    fn index(self, r: usize, c: usize, k: usize) -> usize {
        match self {
            Layout::Rows => r * k + c,
            Layout::Columns => c * k + r,
        }
    }
}

/// Exact square root of `d`, if `d` is a perfect square
pub(crate) fn sub_dimension(d: usize) -> Option<usize> {
    let k = (d as f64).sqrt().round() as usize;
    (k * k == d).then_some(k)
}

/// `out[i*k + r] = √k Σ_c B[r][c] a[i*k + c]`
pub(crate) fn block_bind(a: &[f64], b: &[f64], k: usize, layout: Layout) -> Vec<f64> {
    let scale = (k as f64).sqrt();
    let mut out = vec![0.0; k * k];
    for i in 0..k {
        let row = &a[i * k..(i + 1) * k];
        for r in 0..k {
            let mut acc = 0.0;
            for (c, a_ic) in row.iter().enumerate() {
                acc += b[layout.index(r, c, k)] * a_ic;
            }
            out[i * k + r] = scale * acc;
        }
    }
    out
}

/// Row-major d×d matrix `M` with `M · x == block_bind(x, v)`, or
/// `M · x == block_bind(v, x)` when `swap_inputs` is set
pub(crate) fn binding_matrix(v: &[f64], k: usize, layout: Layout, swap_inputs: bool) -> Vec<f64> {
    let d = k * k;
    let scale = (k as f64).sqrt();
    let mut m = vec![0.0; d * d];
    for i in 0..k {
        for r in 0..k {
            let row = i * k + r;
            for c in 0..k {
                if swap_inputs {
                    m[row * d + layout.index(r, c, k)] = scale * v[i * k + c];
                } else {
                    m[row * d + i * k + c] = scale * v[layout.index(r, c, k)];
                }
            }
        }
    }
    m
}

/// Transpose of the k×k matrix form
pub(crate) fn transpose(v: &[f64], k: usize) -> Vec<f64> {
    let mut out = vec![0.0; k * k];
    for r in 0..k {
        for c in 0..k {
            out[c * k + r] = v[r * k + c];
        }
    }
    out
}

/// Vector whose scaled matrix form is the identity
pub(crate) fn identity(k: usize) -> Vec<f64> {
    let mut out = vec![0.0; k * k];
    let value = 1.0 / (k as f64).sqrt();
    for i in 0..k {
        out[i * k + i] = value;
    }
    out
}

/// Vector whose matrix form is `X̂ⁿ`, by repeated squaring
///
/// Negative exponents square `X̂⁻¹` instead, so they need an invertible `X̂`.
pub(crate) fn integer_power(v: &[f64], k: usize, n: i64) -> Result<Vec<f64>> {
    let mut base = if n < 0 { inverse(v, k)? } else { v.to_vec() };
    let mut acc = identity(k);
    let mut remaining = n.unsigned_abs();
    while remaining > 0 {
        if remaining & 1 == 1 {
            acc = block_bind(&acc, &base, k, Layout::Columns);
        }
        remaining >>= 1;
        if remaining > 0 {
            base = block_bind(&base, &base, k, Layout::Columns);
        }
    }
    Ok(acc)
}

// ============================================================================
// Dense decompositions
// ============================================================================

#[cfg(feature = "linalg")]
mod dense {
    use nalgebra::{DMatrix, DVector};
    use rand::RngCore;
    use rand_distr::{Distribution, StandardNormal};

    use crate::{Result, SpaError};

    /// Relative asymmetry tolerated before a matrix counts as non-symmetric
    const SYMMETRY_TOLERANCE: f64 = 1e-8;
    /// Relative `X̂X̂ᵀ - X̂ᵀX̂` tolerated before a matrix counts as non-normal
    const NORMALITY_TOLERANCE: f64 = 1e-8;
    /// Relative eigenvalue magnitude treated as zero
    const EIGEN_TOLERANCE: f64 = 1e-12;
    const SCHUR_MAX_ITERATIONS: usize = 10_000;

    fn degenerate(op: &str) -> SpaError {
        SpaError::Value(format!(
            "{} requires a nondegenerate vector (normal matrix form without eigenvalues \
             on the closed negative real axis); project it with nondegenerate() first",
            op
        ))
    }

    fn matrix_form(v: &[f64], k: usize) -> DMatrix<f64> {
        DMatrix::from_row_slice(k, k, v) * (k as f64).sqrt()
    }

    fn vector_form(m: &DMatrix<f64>, k: usize) -> Vec<f64> {
        let scale = (k as f64).sqrt();
        let mut out = Vec::with_capacity(k * k);
        for i in 0..k {
            for j in 0..k {
                out.push(m[(i, j)] / scale);
            }
        }
        out
    }

    fn is_symmetric(m: &DMatrix<f64>) -> bool {
        let asymmetry = (m - m.transpose()).amax();
        asymmetry <= SYMMETRY_TOLERANCE * m.amax().max(1.0)
    }

    fn is_normal(m: &DMatrix<f64>) -> bool {
        let mt = m.transpose();
        let defect = (m * &mt - &mt * m).amax();
        let scale = m.amax().max(1.0);
        defect <= NORMALITY_TOLERANCE * scale * scale * m.nrows() as f64
    }

    /// Eigen-decomposition of the symmetric part
    fn eigen(m: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
        let symmetric = (m + m.transpose()) * 0.5;
        let eig = symmetric.symmetric_eigen();
        (eig.eigenvalues, eig.eigenvectors)
    }

    fn recompose(values: &DVector<f64>, vectors: &DMatrix<f64>) -> DMatrix<f64> {
        vectors * DMatrix::from_diagonal(values) * vectors.transpose()
    }

    fn eigen_tolerance(values: &DVector<f64>) -> f64 {
        EIGEN_TOLERANCE * values.amax().max(f64::MIN_POSITIVE)
    }

    fn gaussian_matrix(k: usize, rng: &mut dyn RngCore) -> DMatrix<f64> {
        DMatrix::from_fn(k, k, |_, _| StandardNormal.sample(&mut *rng))
    }

    /// Orthogonal matrix drawn from the Haar measure
    fn haar_orthogonal(k: usize, rng: &mut dyn RngCore) -> DMatrix<f64> {
        let qr = gaussian_matrix(k, rng).qr();
        let r = qr.r();
        let mut q = qr.q();
        for j in 0..k {
            let sign = r[(j, j)].signum();
            for i in 0..k {
                q[(i, j)] *= sign;
            }
        }
        q
    }

    /// Random vector with an orthogonal matrix form
    pub(crate) fn random_unitary(k: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        Ok(vector_form(&haar_orthogonal(k, rng), k))
    }

    /// Random unit-length vector with a symmetric positive definite matrix form
    pub(crate) fn random_positive(k: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        let q = haar_orthogonal(k, rng);
        let values = DVector::from_fn(k, |_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            z.abs() + 0.1
        });
        let mut v = vector_form(&recompose(&values, &q), k);
        crate::algebras::normalize(&mut v);
        Ok(v)
    }

    fn orthogonal_factor(m: DMatrix<f64>) -> Result<DMatrix<f64>> {
        let svd = m.svd(true, true);
        let u = svd
            .u
            .ok_or_else(|| SpaError::Value("SVD did not produce U".to_string()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| SpaError::Value("SVD did not produce Vᵀ".to_string()))?;
        Ok(u * v_t)
    }

    /// `(Z, T)` with `M = Z T Zᵀ`, `Z` orthogonal and `T` quasi-upper-triangular
    fn real_schur(m: DMatrix<f64>) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
        m.try_schur(f64::EPSILON, SCHUR_MAX_ITERATIONS)
            .map(|schur| schur.unpack())
            .ok_or_else(|| SpaError::Value("Schur decomposition did not converge".to_string()))
    }

    /// `(start, size)` of each 1×1 and 2×2 diagonal block of a real Schur form
    fn diagonal_blocks(t: &DMatrix<f64>) -> Vec<(usize, usize)> {
        let n = t.nrows();
        let tol = EIGEN_TOLERANCE * t.amax().max(f64::MIN_POSITIVE);
        let mut blocks = Vec::with_capacity(n);
        let mut i = 0;
        while i < n {
            if i + 1 < n && t[(i + 1, i)].abs() > tol {
                blocks.push((i, 2));
                i += 2;
            } else {
                blocks.push((i, 1));
                i += 1;
            }
        }
        blocks
    }

    fn block_at(t: &DMatrix<f64>, i: usize) -> [[f64; 2]; 2] {
        [[t[(i, i)], t[(i, i + 1)]], [t[(i + 1, i)], t[(i + 1, i + 1)]]]
    }

    fn set_block(t: &mut DMatrix<f64>, i: usize, block: [[f64; 2]; 2]) {
        for (r, row) in block.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                t[(i + r, i + c)] = *value;
            }
        }
    }

    /// Mean and discriminant of the eigenvalues `mean ± √disc` of a 2×2 block
    fn block_spectrum(block: [[f64; 2]; 2]) -> (f64, f64) {
        let [[a, b], [c, d]] = block;
        let mean = 0.5 * (a + d);
        (mean, mean * mean - (a * d - b * c))
    }

    /// Complex pair `r e^{±iθ}` with `θ` within `tol` of a half turn
    fn is_half_turn(block: [[f64; 2]; 2], tol: f64) -> bool {
        let (mean, disc) = block_spectrum(block);
        disc < 0.0 && mean < 0.0 && (-disc).sqrt() <= tol
    }

    fn real_power(lambda: f64, p: f64, tol: f64) -> Option<f64> {
        (lambda > tol).then(|| lambda.powf(p))
    }

    /// Principal power of a 2×2 block, written as `c0·I + c1·B`
    ///
    /// A complex pair `r e^{±iθ}` maps to `r^p e^{±ipθ}` with `θ ∈ (0, π)`.
    fn block_power(block: [[f64; 2]; 2], p: f64, tol: f64) -> Option<[[f64; 2]; 2]> {
        let (mean, disc) = block_spectrum(block);
        let (c0, c1) = if disc < 0.0 {
            if is_half_turn(block, tol) {
                return None;
            }
            let omega = (-disc).sqrt();
            let rp = mean.hypot(omega).powf(p);
            let (sin, cos) = (p * omega.atan2(mean)).sin_cos();
            let c1 = rp * sin / omega;
            (rp * cos - c1 * mean, c1)
        } else {
            let s = disc.sqrt();
            let (high, low) = (mean + s, mean - s);
            let f_high = real_power(high, p, tol)?;
            let f_low = real_power(low, p, tol)?;
            let c1 = if s > tol {
                (f_high - f_low) / (high - low)
            } else {
                p * mean.powf(p - 1.0)
            };
            (f_low - c1 * low, c1)
        };
        let [[a, b], [c, d]] = block;
        Some([[c0 + c1 * a, c1 * b], [c1 * c, c0 + c1 * d]])
    }

    /// Block-diagonal principal power of a real Schur form of a normal matrix
    fn schur_power(t: &DMatrix<f64>, p: f64) -> Option<DMatrix<f64>> {
        let tol = EIGEN_TOLERANCE * t.amax().max(f64::MIN_POSITIVE);
        let mut out = DMatrix::zeros(t.nrows(), t.ncols());
        for (i, size) in diagonal_blocks(t) {
            if size == 1 {
                out[(i, i)] = real_power(t[(i, i)], p, tol)?;
            } else {
                set_block(&mut out, i, block_power(block_at(t, i), p, tol)?);
            }
        }
        Some(out)
    }

    /// Nearest vector with an orthogonal matrix form (`U Vᵀ` from the SVD)
    pub(crate) fn nearest_unitary(v: &[f64], k: usize) -> Result<Vec<f64>> {
        Ok(vector_form(&orthogonal_factor(matrix_form(v, k))?, k))
    }

    /// Nearest orthogonal matrix form, with every `-1` eigen-direction folded
    /// onto `+1`
    ///
    /// The result is unitary and has no eigenvalue on the negative real axis,
    /// so every real power of it is defined and stays unitary.
    pub(crate) fn nondegenerate(v: &[f64], k: usize) -> Result<Vec<f64>> {
        let q = orthogonal_factor(matrix_form(v, k))?;
        let (z, mut t) = real_schur(q.clone())?;
        let tol = EIGEN_TOLERANCE * t.amax().max(f64::MIN_POSITIVE);
        let mut folded = false;
        for (i, size) in diagonal_blocks(&t) {
            if size == 1 && t[(i, i)] < 0.0 {
                t[(i, i)] = -t[(i, i)];
                folded = true;
            } else if size == 2 && is_half_turn(block_at(&t, i), tol) {
                let (mean, disc) = block_spectrum(block_at(&t, i));
                let r = (mean * mean - disc).sqrt();
                set_block(&mut t, i, [[r, 0.0], [0.0, r]]);
                folded = true;
            }
        }
        if !folded {
            return Ok(vector_form(&q, k));
        }
        Ok(vector_form(&(&z * t * z.transpose()), k))
    }

    /// Principal matrix power `X̂^p` through the real Schur form `X̂ = Z T Zᵀ`
    ///
    /// `X̂` must be normal, so that `T` is block diagonal, and must have no
    /// eigenvalue on the closed negative real axis. Rotation angles scale from
    /// `θ` to `pθ`, so orthogonal matrix forms stay orthogonal.
    pub(crate) fn fractional_power(v: &[f64], k: usize, exponent: f64) -> Result<Vec<f64>> {
        let op = format!("Fractional binding power {}", exponent);
        let m = matrix_form(v, k);
        if m.amax() == 0.0 || !is_normal(&m) {
            return Err(degenerate(&op));
        }
        let (z, t) = real_schur(m)?;
        let powered = schur_power(&t, exponent).ok_or_else(|| degenerate(&op))?;
        Ok(vector_form(&(&z * powered * z.transpose()), k))
    }

    /// Vector whose matrix form is `X̂⁻¹`
    pub(crate) fn inverse(v: &[f64], k: usize) -> Result<Vec<f64>> {
        let inv = matrix_form(v, k).try_inverse().ok_or_else(|| {
            SpaError::Value("Vector is not invertible: its matrix form is singular".to_string())
        })?;
        Ok(vector_form(&inv, k))
    }

    /// `+1.0` / `-1.0` when `X̂` is symmetric positive / negative definite
    pub(crate) fn definite_sign(v: &[f64], k: usize) -> Result<Option<f64>> {
        let m = matrix_form(v, k);
        if !is_symmetric(&m) {
            return Ok(None);
        }
        let (values, _) = eigen(&m);
        let tol = eigen_tolerance(&values);
        if values.iter().all(|&l| l > tol) {
            Ok(Some(1.0))
        } else if values.iter().all(|&l| l < -tol) {
            Ok(Some(-1.0))
        } else {
            Ok(None)
        }
    }

    /// Positive polar factor `V Σ Vᵀ` of `X̂ = U Σ Vᵀ`
    pub(crate) fn polar_abs(v: &[f64], k: usize) -> Result<Vec<f64>> {
        let svd = matrix_form(v, k).svd(false, true);
        let v_t = svd
            .v_t
            .ok_or_else(|| SpaError::Value("SVD did not produce Vᵀ".to_string()))?;
        let p = v_t.transpose() * DMatrix::from_diagonal(&svd.singular_values) * &v_t;
        Ok(vector_form(&p, k))
    }
}

#[cfg(not(feature = "linalg"))]
mod fallback {
    use rand::RngCore;

    use crate::{Result, SpaError};

    fn unavailable<T>(op: &str) -> Result<T> {
        Err(SpaError::NotImplemented(format!(
            "{} requires the `linalg` feature",
            op
        )))
    }

    pub(crate) fn random_unitary(_k: usize, _rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        unavailable("Creating a unitary matrix-binding vector")
    }

    pub(crate) fn random_positive(_k: usize, _rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        unavailable("Creating a positive matrix-binding vector")
    }

    pub(crate) fn nearest_unitary(_v: &[f64], _k: usize) -> Result<Vec<f64>> {
        unavailable("make_unitary")
    }

    pub(crate) fn nondegenerate(_v: &[f64], _k: usize) -> Result<Vec<f64>> {
        unavailable("make_nondegenerate")
    }

    pub(crate) fn fractional_power(_v: &[f64], _k: usize, _exponent: f64) -> Result<Vec<f64>> {
        unavailable("Fractional binding power")
    }

    pub(crate) fn inverse(_v: &[f64], _k: usize) -> Result<Vec<f64>> {
        unavailable("Negative binding power")
    }

    pub(crate) fn definite_sign(_v: &[f64], _k: usize) -> Result<Option<f64>> {
        unavailable("sign")
    }

    pub(crate) fn polar_abs(_v: &[f64], _k: usize) -> Result<Vec<f64>> {
        unavailable("abs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_allclose;
    use crate::vector_generation::sample_unit_length;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random(d: usize, seed: u64) -> Vec<f64> {
        sample_unit_length(d, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    fn mat_vec(m: &[f64], x: &[f64]) -> Vec<f64> {
        let d = x.len();
        (0..d)
            .map(|i| (0..d).map(|j| m[i * d + j] * x[j]).sum())
            .collect()
    }

    #[test]
    fn test_sub_dimension() {
        assert_eq!(sub_dimension(1), Some(1));
        assert_eq!(sub_dimension(16), Some(4));
        assert_eq!(sub_dimension(15), None);
        assert_eq!(sub_dimension(0), Some(0));
    }

    #[test]
    fn test_identity_is_right_identity() {
        let a: Vec<f64> = (0..9).map(|x| x as f64 - 4.0).collect();
        let id = identity(3);
        assert_allclose(&block_bind(&a, &id, 3, Layout::Rows), &a);
        assert_allclose(&block_bind(&a, &id, 3, Layout::Columns), &a);
    }

    #[test]
    fn test_binding_matrix_matches_bind() {
        let a: Vec<f64> = (0..16).map(|x| (x as f64 * 0.37).sin()).collect();
        let v: Vec<f64> = (0..16).map(|x| (x as f64 * 1.3).cos()).collect();
        for layout in [Layout::Rows, Layout::Columns] {
            let m = binding_matrix(&v, 4, layout, false);
            assert_allclose(&mat_vec(&m, &a), &block_bind(&a, &v, 4, layout));
            let m = binding_matrix(&v, 4, layout, true);
            assert_allclose(&mat_vec(&m, &a), &block_bind(&v, &a, 4, layout));
        }
    }

    #[test]
    fn test_transpose_involution() {
        let v: Vec<f64> = (0..16).map(|x| x as f64).collect();
        assert_eq!(transpose(&transpose(&v, 4), 4), v);
        assert_eq!(transpose(&v, 4)[1], v[4]);
    }

    fn rotation(theta: f64) -> Vec<f64> {
        let (sin, cos) = theta.sin_cos();
        let scale = 2f64.sqrt();
        vec![cos / scale, -sin / scale, sin / scale, cos / scale]
    }

    fn naive_power(v: &[f64], k: usize, n: usize) -> Vec<f64> {
        (0..n).fold(identity(k), |acc, _| block_bind(&acc, v, k, Layout::Columns))
    }

    #[test]
    fn test_integer_power_matches_repeated_binding() {
        let v = random(16, 1);
        assert_allclose(&integer_power(&v, 4, 0).unwrap(), &identity(4));
        assert_allclose(&integer_power(&v, 4, 1).unwrap(), &v);
        for n in [2usize, 7, 37] {
            assert_allclose(&integer_power(&v, 4, n as i64).unwrap(), &naive_power(&v, 4, n));
        }
    }

    #[test]
    fn test_integer_power_of_rotation_adds_angles() {
        let r = rotation(0.001);
        assert_allclose(&integer_power(&r, 2, 1_000_000).unwrap(), &rotation(1000.0));
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_negative_integer_power_inverts() {
        let v = random(9, 2);
        let forward = integer_power(&v, 3, 3).unwrap();
        let back = integer_power(&v, 3, -3).unwrap();
        assert_allclose(&block_bind(&forward, &back, 3, Layout::Columns), &identity(3));
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_fractional_power_rejects_non_normal() {
        let v: Vec<f64> = (0..9).map(|x| x as f64).collect();
        let err = fractional_power(&v, 3, 0.5).unwrap_err();
        assert!(err.to_string().contains("nondegenerate"));
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_fractional_power_rejects_negative_eigenvalue() {
        let reflection = vec![1.0 / 2f64.sqrt(), 0.0, 0.0, -1.0 / 2f64.sqrt()];
        let err = fractional_power(&reflection, 2, 0.5).unwrap_err();
        assert!(err.to_string().contains("nondegenerate"));
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_fractional_power_scales_rotation_angle() {
        assert_allclose(&fractional_power(&rotation(2.0), 2, 0.5).unwrap(), &rotation(1.0));
        assert_allclose(&fractional_power(&rotation(3.0), 2, 1.5).unwrap(), &rotation(4.5));
        assert_allclose(&fractional_power(&rotation(-1.2), 2, -0.5).unwrap(), &rotation(0.6));
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_nondegenerate_folds_reflection() {
        let reflection = vec![1.0 / 2f64.sqrt(), 0.0, 0.0, -1.0 / 2f64.sqrt()];
        assert_allclose(&nondegenerate(&reflection, 2).unwrap(), &identity(2));
        let half_turn: Vec<f64> = identity(3).iter().map(|x| -x).collect();
        assert_allclose(&nondegenerate(&half_turn, 3).unwrap(), &identity(3));
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_nondegenerate_is_orthogonal() {
        for k in 1..7 {
            let v = random(k * k, k as u64);
            let x = nondegenerate(&v, k).unwrap();
            assert_allclose(&block_bind(&x, &x, k, Layout::Rows), &identity(k));
            assert_allclose(&nondegenerate(&x, k).unwrap(), &x);
            assert!(fractional_power(&x, k, 0.5).is_ok());
        }
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_nondegenerate_then_sqrt_squares_back() {
        let x = nondegenerate(&random(16, 3), 4).unwrap();
        let root = fractional_power(&x, 4, 0.5).unwrap();
        assert_allclose(&block_bind(&root, &root, 4, Layout::Columns), &x);
    }
}
