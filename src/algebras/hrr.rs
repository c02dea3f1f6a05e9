//! Holographic reduced representations
//!
//! Binding is circular convolution, computed exactly in the Fourier domain:
//! `bind(a, b) = ifft(fft(a) · fft(b))`.
//!
//! # Properties
//! - Associative and commutative
//! - Identity `[1, 0, ..., 0]`, inverse by index reversal `[v0, v_{d-1}, ..., v1]`
//! - Unitary vectors have unit-magnitude Fourier coefficients; the reversal
//!   inverse is exact for them
//! - Fractional powers act on every Fourier coefficient; they need the real
//!   coefficients (DC and, for even d, Nyquist) to be non-negative

use candle_core::{Device, Tensor};
use rand::RngCore;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use std::any::Any;

use super::{
    check_dimensionality, check_properties, check_same_len, is_integer, normalize, Algebra,
    ElementSidedness, VectorProperty,
};
use crate::vector_generation::sample_unit_length;
use crate::{Result, SpaError};

/// Real Fourier coefficients below `-tol` make a vector degenerate
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Circular convolution algebra
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HrrAlgebra;

fn fft(v: &[f64]) -> Vec<Complex64> {
    let mut buffer: Vec<Complex64> = v.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    FftPlanner::<f64>::new()
        .plan_fft_forward(buffer.len())
        .process(&mut buffer);
    buffer
}

fn ifft_real(mut spectrum: Vec<Complex64>) -> Vec<f64> {
    let n = spectrum.len();
    FftPlanner::<f64>::new()
        .plan_fft_inverse(n)
        .process(&mut spectrum);
    spectrum.iter().map(|c| c.re / n as f64).collect()
}

/// Apply `f` to the first half of a Hermitian spectrum and mirror the rest
///
/// Keeps the result exactly Hermitian so the inverse transform is real.
fn map_hermitian(spectrum: &[Complex64], f: impl Fn(Complex64) -> Complex64) -> Vec<Complex64> {
    let n = spectrum.len();
    let mut out = vec![Complex64::new(0.0, 0.0); n];
    for k in 0..=n / 2 {
        out[k] = f(spectrum[k]);
        if k != 0 && k != n - k {
            out[n - k] = out[k].conj();
        }
    }
    out
}

impl HrrAlgebra {
    /// Indices of the Fourier coefficients that are real for every real vector
    fn real_bins(n: usize) -> impl Iterator<Item = usize> {
        std::iter::once(0).chain((n % 2 == 0 && n > 1).then_some(n / 2))
    }

    fn check_nondegenerate(spectrum: &[Complex64], exponent: f64) -> Result<()> {
        let scale = spectrum.iter().map(|c| c.norm()).fold(0.0, f64::max);
        let tol = DEGENERACY_TOLERANCE * scale.max(1.0);
        if Self::real_bins(spectrum.len()).any(|k| spectrum[k].re < -tol) {
            return Err(SpaError::Value(format!(
                "Fractional binding power {} requires a nondegenerate vector \
                 (non-negative real Fourier coefficients); project it with nondegenerate() first",
                exponent
            )));
        }
        Ok(())
    }

    fn check_finite(v: Vec<f64>, exponent: f64) -> Result<Vec<f64>> {
        if v.iter().any(|x| !x.is_finite()) {
            return Err(SpaError::Value(format!(
                "Binding power {} is undefined for vectors with zero Fourier coefficients",
                exponent
            )));
        }
        Ok(v)
    }
}

impl Algebra for HrrAlgebra {
    fn name(&self) -> &'static str {
        "HrrAlgebra"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_valid_dimensionality(&self, d: i64) -> bool {
        d >= 1
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
        check_dimensionality(self, d)?;
        check_properties(self, properties)?;

        let mut v = sample_unit_length(d, rng);
        if properties.contains(&VectorProperty::Positive) {
            v = self.make_nondegenerate(&v)?;
        }
        if properties.contains(&VectorProperty::Unitary) {
            v = self.make_unitary(&v)?;
        } else if properties.contains(&VectorProperty::Positive) {
            normalize(&mut v);
        }
        Ok(v)
    }

    fn make_unitary(&self, v: &[f64]) -> Result<Vec<f64>> {
        check_dimensionality(self, v.len())?;
        let spectrum = fft(v);
        let zeros = spectrum.iter().filter(|c| c.norm() == 0.0).count();
        let unit = map_hermitian(&spectrum, |c| {
            let norm = c.norm();
            if norm > 0.0 {
                c / norm
            } else {
                Complex64::new(1.0, 0.0)
            }
        });
        if zeros > 0 {
            tracing::debug!(zeros, "replaced zero Fourier coefficients with 1 in make_unitary");
        }
        Ok(ifft_real(unit))
    }

    fn make_nondegenerate(&self, v: &[f64]) -> Result<Vec<f64>> {
        check_dimensionality(self, v.len())?;
        let mut spectrum = fft(v);
        let n = spectrum.len();
        for k in Self::real_bins(n) {
            spectrum[k] = Complex64::new(spectrum[k].norm(), 0.0);
        }
        Ok(ifft_real(spectrum))
    }

    fn bind(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        check_same_len(a, b)?;
        check_dimensionality(self, a.len())?;
        let fa = fft(a);
        let fb = fft(b);
        let product = fa.iter().zip(&fb).map(|(x, y)| x * y).collect();
        Ok(ifft_real(product))
    }

    fn binding_power(&self, v: &[f64], exponent: f64) -> Result<Vec<f64>> {
        check_dimensionality(self, v.len())?;
        if !exponent.is_finite() {
            return Err(SpaError::Value(format!(
                "Binding power exponent must be finite, got {}",
                exponent
            )));
        }
        let spectrum = fft(v);
        let powered = if is_integer(exponent) {
            let n = exponent as i32;
            map_hermitian(&spectrum, |c| c.powi(n))
        } else {
            Self::check_nondegenerate(&spectrum, exponent)?;
            map_hermitian(&spectrum, |c| c.powf(exponent))
        };
        Self::check_finite(ifft_real(powered), exponent)
    }

    fn invert(&self, v: &[f64], _sidedness: ElementSidedness) -> Result<Vec<f64>> {
        check_dimensionality(self, v.len())?;
        let mut out = Vec::with_capacity(v.len());
        out.push(v[0]);
        out.extend(v[1..].iter().rev());
        Ok(out)
    }

    fn get_binding_matrix(&self, v: &[f64], _swap_inputs: bool) -> Result<Tensor> {
        check_dimensionality(self, v.len())?;
        let d = v.len();
        let mut m = Vec::with_capacity(d * d);
        for i in 0..d {
            for j in 0..d {
                m.push(v[(i + d - j) % d]);
            }
        }
        Ok(Tensor::from_vec(m, (d, d), &Device::Cpu)?)
    }

    fn identity_element(&self, d: usize) -> Result<Vec<f64>> {
        check_dimensionality(self, d)?;
        let mut v = vec![0.0; d];
        v[0] = 1.0;
        Ok(v)
    }

    fn absorbing_element(&self, _d: usize) -> Result<Vec<f64>> {
        Err(SpaError::NotImplemented(
            "HrrAlgebra does not have an absorbing element".to_string(),
        ))
    }
}
