//! Transposed vector-derived transformation binding
//!
//! Same block structure as [`VtbAlgebra`](super::VtbAlgebra) but the second
//! operand's matrix is transposed, so `bind(a, b) = Â B̂` in scaled matrix
//! form. The result is associative, with a two-sided identity and a two-sided
//! inverse (the transpose) for unitary vectors.
//!
//! `x ** p` has matrix form `X̂^p`, so powers compose directly:
//! `x ** (p + q) == (x ** p) * (x ** q)`.
//!
//! Every vector whose matrix form is invertible splits into a sign and an
//! absolute value: `x = bind(sign(x), abs(x))`. Only `k ≥ 4` (d = 16, 25, ...)
//! and the trivial `d = 1` are accepted.

use candle_core::{Device, Tensor};
use rand::RngCore;
use std::any::Any;

use super::matrix::{self, Layout};
use super::{
    check_dimensionality, check_properties, check_same_len, is_integer, Algebra,
    ElementSidedness, VectorProperty,
};
use crate::vector_generation::sample_unit_length;
use crate::{Result, SpaError};

/// Smallest sub-dimension accepted for d > 1
const MIN_SUB_DIMENSION: usize = 4;

/// Transposed VTB algebra
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TvtbAlgebra;

/// Sign of a TVTB vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TvtbSign {
    Positive,
    Negative,
}

impl TvtbSign {
    pub fn is_positive(&self) -> bool {
        matches!(self, TvtbSign::Positive)
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, TvtbSign::Negative)
    }

    /// `+1.0` or `-1.0`
    pub fn value(&self) -> f64 {
        match self {
            TvtbSign::Positive => 1.0,
            TvtbSign::Negative => -1.0,
        }
    }

    /// The signed identity vector of dimensionality `d`
    pub fn to_vector(&self, d: usize) -> Result<Vec<f64>> {
        let identity = TvtbAlgebra.identity_element(d)?;
        Ok(identity.into_iter().map(|x| x * self.value()).collect())
    }

    /// Sign of `v`; fails when `v` has no definite sign
    pub fn from_vector(v: &[f64]) -> Result<Self> {
        TvtbAlgebra.sign(v)
    }
}

impl TvtbAlgebra {
    fn sub_dimension(&self, d: usize) -> Result<usize> {
        check_dimensionality(self, d)?;
        matrix::sub_dimension(d).ok_or_else(|| {
            SpaError::Value(format!("Dimensionality {} is not valid for TvtbAlgebra", d))
        })
    }

    /// Sign of `v`: positive or negative when its matrix form is symmetric and
    /// positive or negative definite
    pub fn sign(&self, v: &[f64]) -> Result<TvtbSign> {
        let k = self.sub_dimension(v.len())?;
        match matrix::definite_sign(v, k)? {
            Some(s) if s > 0.0 => Ok(TvtbSign::Positive),
            Some(_) => Ok(TvtbSign::Negative),
            None => Err(SpaError::Value(
                "Vector has no definite sign: its matrix form is not symmetric definite"
                    .to_string(),
            )),
        }
    }

    /// Absolute value of `v`: the positive polar factor of its matrix form
    pub fn abs(&self, v: &[f64]) -> Result<Vec<f64>> {
        let k = self.sub_dimension(v.len())?;
        matrix::polar_abs(v, k)
    }
}

impl Algebra for TvtbAlgebra {
    fn name(&self) -> &'static str {
        "TvtbAlgebra"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_valid_dimensionality(&self, d: i64) -> bool {
        if d == 1 {
            return true;
        }
        d >= 1
            && usize::try_from(d)
                .ok()
                .and_then(matrix::sub_dimension)
                .is_some_and(|k| k >= MIN_SUB_DIMENSION)
    }

    fn supported_properties(&self) -> &'static [VectorProperty] {
        &[VectorProperty::Unitary, VectorProperty::Positive]
    }

    fn create_vector(
        &self,
        d: usize,
        properties: &[VectorProperty],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        let k = self.sub_dimension(d)?;
        check_properties(self, properties)?;
        let unitary = properties.contains(&VectorProperty::Unitary);
        let positive = properties.contains(&VectorProperty::Positive);
        match (unitary, positive) {
            (true, true) => {
                tracing::warn!("The only positive unitary vector is the identity vector");
                self.identity_element(d)
            }
            (true, false) => matrix::random_unitary(k, rng),
            (false, true) => matrix::random_positive(k, rng),
            (false, false) => Ok(sample_unit_length(d, rng)),
        }
    }

    fn make_unitary(&self, v: &[f64]) -> Result<Vec<f64>> {
        let k = self.sub_dimension(v.len())?;
        matrix::nearest_unitary(v, k)
    }

    fn make_nondegenerate(&self, v: &[f64]) -> Result<Vec<f64>> {
        let k = self.sub_dimension(v.len())?;
        matrix::nondegenerate(v, k)
    }

    fn bind(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        check_same_len(a, b)?;
        let k = self.sub_dimension(a.len())?;
        Ok(matrix::block_bind(a, b, k, Layout::Columns))
    }

    fn binding_power(&self, v: &[f64], exponent: f64) -> Result<Vec<f64>> {
        let k = self.sub_dimension(v.len())?;
        if is_integer(exponent) {
            matrix::integer_power(v, k, exponent as i64)
        } else if exponent.is_finite() {
            matrix::fractional_power(v, k, exponent)
        } else {
            Err(SpaError::Value(format!(
                "Binding power exponent must be finite, got {}",
                exponent
            )))
        }
    }

    fn invert(&self, v: &[f64], _sidedness: ElementSidedness) -> Result<Vec<f64>> {
        let k = self.sub_dimension(v.len())?;
        Ok(matrix::transpose(v, k))
    }

    fn get_binding_matrix(&self, v: &[f64], swap_inputs: bool) -> Result<Tensor> {
        let k = self.sub_dimension(v.len())?;
        let d = v.len();
        let m = matrix::binding_matrix(v, k, Layout::Columns, swap_inputs);
        Ok(Tensor::from_vec(m, (d, d), &Device::Cpu)?)
    }

    fn identity_element(&self, d: usize) -> Result<Vec<f64>> {
        let k = self.sub_dimension(d)?;
        Ok(matrix::identity(k))
    }

    fn absorbing_element(&self, _d: usize) -> Result<Vec<f64>> {
        Err(SpaError::NotImplemented(
            "TvtbAlgebra does not have an absorbing element".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_allclose;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random(d: usize, seed: u64) -> Vec<f64> {
        sample_unit_length(d, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_valid_dimensionality() {
        assert!(TvtbAlgebra.is_valid_dimensionality(1));
        assert!(TvtbAlgebra.is_valid_dimensionality(16));
        assert!(TvtbAlgebra.is_valid_dimensionality(25));
        assert!(!TvtbAlgebra.is_valid_dimensionality(4));
        assert!(!TvtbAlgebra.is_valid_dimensionality(9));
        assert!(!TvtbAlgebra.is_valid_dimensionality(15));
        assert!(!TvtbAlgebra.is_valid_dimensionality(0));
        assert!(!TvtbAlgebra.is_valid_dimensionality(-16));
    }

    #[test]
    fn test_two_sided_identity() {
        let a = random(16, 1);
        let id = TvtbAlgebra.identity_element(16).unwrap();
        assert_allclose(&TvtbAlgebra.bind(&a, &id).unwrap(), &a);
        assert_allclose(&TvtbAlgebra.bind(&id, &a).unwrap(), &a);
    }

    #[test]
    fn test_associative() {
        let a = random(16, 2);
        let b = random(16, 3);
        let c = random(16, 4);
        let left = TvtbAlgebra
            .bind(&TvtbAlgebra.bind(&a, &b).unwrap(), &c)
            .unwrap();
        let right = TvtbAlgebra
            .bind(&a, &TvtbAlgebra.bind(&b, &c).unwrap())
            .unwrap();
        assert_allclose(&left, &right);
    }

    #[test]
    fn test_integer_powers() {
        let x = random(16, 5);
        let xx = TvtbAlgebra.bind(&x, &x).unwrap();
        assert_allclose(&TvtbAlgebra.binding_power(&x, 1.0).unwrap(), &x);
        assert_allclose(&TvtbAlgebra.binding_power(&x, 2.0).unwrap(), &xx);
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_unitary_two_sided_inverse() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let u = TvtbAlgebra
            .create_vector(16, &[VectorProperty::Unitary], &mut rng)
            .unwrap();
        let id = TvtbAlgebra.identity_element(16).unwrap();
        for side in [
            ElementSidedness::Left,
            ElementSidedness::Right,
            ElementSidedness::TwoSided,
        ] {
            let inv = TvtbAlgebra.invert(&u, side).unwrap();
            assert_allclose(&TvtbAlgebra.bind(&u, &inv).unwrap(), &id);
            assert_allclose(&TvtbAlgebra.bind(&inv, &u).unwrap(), &id);
        }
        let inv = TvtbAlgebra.invert(&u, ElementSidedness::TwoSided).unwrap();
        assert_allclose(&TvtbAlgebra.binding_power(&u, -1.0).unwrap(), &inv);
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_sign_and_abs() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for sign in [TvtbSign::Positive, TvtbSign::Negative] {
            let abs_v = TvtbAlgebra
                .create_vector(16, &[VectorProperty::Positive], &mut rng)
                .unwrap();
            let v = TvtbAlgebra
                .bind(&sign.to_vector(16).unwrap(), &abs_v)
                .unwrap();
            assert_eq!(TvtbAlgebra.sign(&v).unwrap(), sign);
            assert_eq!(TvtbSign::from_vector(&v).unwrap(), sign);
            assert_allclose(&TvtbAlgebra.abs(&v).unwrap(), &abs_v);
        }
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_indefinite_sign_rejected() {
        let err = TvtbAlgebra.sign(&random(16, 8)).unwrap_err();
        assert!(matches!(err, SpaError::Value(_)));
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_positive_vectors_support_fractional_powers() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let x = TvtbAlgebra
            .create_vector(25, &[VectorProperty::Positive], &mut rng)
            .unwrap();
        assert!(TvtbAlgebra.sign(&x).unwrap().is_positive());
        let a = TvtbAlgebra.binding_power(&x, 0.25).unwrap();
        let b = TvtbAlgebra.binding_power(&x, 0.5).unwrap();
        assert_allclose(
            &TvtbAlgebra.bind(&a, &b).unwrap(),
            &TvtbAlgebra.binding_power(&x, 0.75).unwrap(),
        );
        let root = TvtbAlgebra.binding_power(&x, 0.5).unwrap();
        assert_allclose(&TvtbAlgebra.bind(&root, &root).unwrap(), &x);
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_nondegenerate_powers() {
        for d in [1usize, 16, 25, 144] {
            let x = TvtbAlgebra.make_nondegenerate(&random(d, 13)).unwrap();
            let bind = |a: &[f64], b: &[f64]| TvtbAlgebra.bind(a, b).unwrap();
            let pow = |p: f64| TvtbAlgebra.binding_power(&x, p).unwrap();
            let x_inv = TvtbAlgebra.invert(&x, ElementSidedness::TwoSided).unwrap();

            assert_allclose(&TvtbAlgebra.make_unitary(&x).unwrap(), &x);
            assert_allclose(&pow(0.0), &TvtbAlgebra.identity_element(d).unwrap());

            assert_allclose(&pow(1.0), &x);
            assert_allclose(&pow(2.0), &bind(&x, &x));
            assert_allclose(&pow(3.0), &bind(&bind(&x, &x), &x));
            assert_allclose(&pow(-1.0), &x_inv);
            assert_allclose(&pow(-2.0), &bind(&x_inv, &x_inv));
            assert_allclose(&pow(-3.0), &bind(&bind(&x_inv, &x_inv), &x_inv));

            assert_allclose(&pow(2.3), &bind(&pow(1.1), &pow(1.2)));
            assert_allclose(&pow(-2.3), &bind(&pow(-1.1), &pow(-1.2)));
            assert_allclose(&pow(0.7), &bind(&pow(-1.5), &pow(2.2)));
            assert_allclose(&pow(-1.3), &bind(&pow(-1.5), &pow(0.2)));
            assert_allclose(&pow(2.8), &bind(&bind(&pow(1.7), &pow(-0.4)), &pow(1.5)));
            assert_allclose(&pow(-0.9), &bind(&bind(&pow(3.2), &pow(-4.6)), &pow(0.5)));

            let step = pow(0.1);
            let mut pt = step.clone();
            for _ in 1..100 {
                pt = bind(&pt, &step);
            }
            let x10 = pow(10.0);
            let dot: f64 = pt.iter().zip(&x10).map(|(a, b)| a * b).sum();
            assert!((dot - 1.0).abs() < 1e-6, "d={}: dot={}", d, dot);
        }
    }

    #[cfg(feature = "linalg")]
    #[test]
    fn test_large_integer_power() {
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let u = TvtbAlgebra
            .create_vector(16, &[VectorProperty::Unitary], &mut rng)
            .unwrap();
        let huge = TvtbAlgebra.binding_power(&u, 1e15).unwrap();
        assert!(huge.iter().all(|x| x.is_finite()));

        let n = TvtbAlgebra.binding_power(&u, 2_000_003.0).unwrap();
        let m = TvtbAlgebra.binding_power(&u, 2_000_000.0).unwrap();
        let three = TvtbAlgebra.binding_power(&u, 3.0).unwrap();
        assert_allclose(&n, &TvtbAlgebra.bind(&m, &three).unwrap());
    }

    #[test]
    fn test_positive_unitary_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let v = TvtbAlgebra
            .create_vector(
                16,
                &[VectorProperty::Unitary, VectorProperty::Positive],
                &mut rng,
            )
            .unwrap();
        assert_allclose(&v, &TvtbAlgebra.identity_element(16).unwrap());
    }

    #[test]
    fn test_sign_vectors() {
        let pos = TvtbSign::Positive.to_vector(16).unwrap();
        let neg = TvtbSign::Negative.to_vector(16).unwrap();
        assert_allclose(&pos, &TvtbAlgebra.identity_element(16).unwrap());
        assert_allclose(&neg, &pos.iter().map(|x| -x).collect::<Vec<_>>());
        assert!(TvtbSign::Negative.is_negative());
        assert!(!TvtbSign::Negative.is_positive());
    }

    #[test]
    fn test_binding_matrix() {
        let a = random(16, 11);
        let b = random(16, 12);
        let a_t = Tensor::from_vec(a.clone(), (16, 1), &Device::Cpu).unwrap();
        let b_t = Tensor::from_vec(b.clone(), (16, 1), &Device::Cpu).unwrap();

        let m = TvtbAlgebra.get_binding_matrix(&b, false).unwrap();
        let out: Vec<f64> = m.matmul(&a_t).unwrap().flatten_all().unwrap().to_vec1().unwrap();
        assert_allclose(&out, &TvtbAlgebra.bind(&a, &b).unwrap());

        let m = TvtbAlgebra.get_binding_matrix(&a, true).unwrap();
        let out: Vec<f64> = m.matmul(&b_t).unwrap().flatten_all().unwrap().to_vec1().unwrap();
        assert_allclose(&out, &TvtbAlgebra.bind(&a, &b).unwrap());
    }
}
