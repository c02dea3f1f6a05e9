//! Vector-derived transformation binding
//!
//! A vector of dimensionality `d = k²` acts on the other operand as a k×k
//! matrix applied to each of its k sub-blocks. In scaled matrix form,
//! `bind(a, b) = Â B̂ᵀ`.
//!
//! VTB is neither commutative nor associative. It has a right identity and a
//! right inverse (the transpose, exact for unitary vectors) but no left ones.
//!
//! `x ** p` has matrix form `(X̂ᵀ)^p`, so `x ** 1 == ~x` and
//! `x ** (n + 1) == (x ** n) * x`. Powers compose as
//! `x ** (p + q) == (x ** p) * ~(x ** q)`.

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

/// Vector-derived transformation binding algebra
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VtbAlgebra;

impl VtbAlgebra {
    fn sub_dimension(&self, d: usize) -> Result<usize> {
        check_dimensionality(self, d)?;
        matrix::sub_dimension(d).ok_or_else(|| {
            SpaError::Value(format!("Dimensionality {} is not valid for VtbAlgebra", d))
        })
    }
}

impl Algebra for VtbAlgebra {
    fn name(&self) -> &'static str {
        "VtbAlgebra"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_valid_dimensionality(&self, d: i64) -> bool {
        d >= 1 && usize::try_from(d).ok().and_then(matrix::sub_dimension).is_some()
    }

    fn supported_properties(&self) -> &'static [VectorProperty] {
        &[VectorProperty::Unitary]
    }

    fn default_sidedness(&self) -> ElementSidedness {
        ElementSidedness::Right
    }

    fn create_vector(
        &self,
        d: usize,
        properties: &[VectorProperty],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        let k = self.sub_dimension(d)?;
        check_properties(self, properties)?;
        if properties.contains(&VectorProperty::Unitary) {
            matrix::random_unitary(k, rng)
        } else {
            Ok(sample_unit_length(d, rng))
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
        Ok(matrix::block_bind(a, b, k, Layout::Rows))
    }

    fn binding_power(&self, v: &[f64], exponent: f64) -> Result<Vec<f64>> {
        let k = self.sub_dimension(v.len())?;
        // Powers of the bind-by-x operator from the right are powers of X̂ᵀ
        let transposed = matrix::transpose(v, k);
        if is_integer(exponent) {
            matrix::integer_power(&transposed, k, exponent as i64)
        } else if exponent.is_finite() {
            matrix::fractional_power(&transposed, k, exponent)
        } else {
            Err(SpaError::Value(format!(
                "Binding power exponent must be finite, got {}",
                exponent
            )))
        }
    }

    fn invert(&self, v: &[f64], sidedness: ElementSidedness) -> Result<Vec<f64>> {
        let k = self.sub_dimension(v.len())?;
        match sidedness {
            ElementSidedness::Right => Ok(matrix::transpose(v, k)),
            ElementSidedness::Left | ElementSidedness::TwoSided => Err(SpaError::NotImplemented(
                format!("VtbAlgebra does not have a {} inverse", sidedness),
            )),
        }
    }

    fn get_binding_matrix(&self, v: &[f64], swap_inputs: bool) -> Result<Tensor> {
        let k = self.sub_dimension(v.len())?;
        let d = v.len();
        let m = matrix::binding_matrix(v, k, Layout::Rows, swap_inputs);
        Ok(Tensor::from_vec(m, (d, d), &Device::Cpu)?)
    }

    fn identity_element(&self, d: usize) -> Result<Vec<f64>> {
        let k = self.sub_dimension(d)?;
        Ok(matrix::identity(k))
    }

    fn absorbing_element(&self, _d: usize) -> Result<Vec<f64>> {
        Err(SpaError::NotImplemented(
            "VtbAlgebra does not have an absorbing element".to_string(),
        ))
    }
}
