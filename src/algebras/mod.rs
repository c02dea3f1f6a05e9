//! Binding algebras
//!
//! An algebra defines how two semantic pointers are bound together, how a
//! binding is undone, which vectors act as identity/absorbing/zero elements, and
//! how a vector is raised to a (possibly fractional) binding power.
//!
//! ## Algebras
//!
//! - [`HrrAlgebra`]: circular convolution, computed in the Fourier domain
//! - [`VtbAlgebra`]: vector-derived transformation binding (right identity and
//!   right inverse only)
//! - [`TvtbAlgebra`]: transposed VTB with two-sided identity and inverse plus a
//!   sign/absolute-value decomposition
//!
//! All algebras operate on plain `&[f64]` slices. Wrapping vectors in
//! [`SemanticPointer`](crate::pointer::SemanticPointer) adds names, vocabulary
//! bookkeeping and operator syntax on top.
//!
//! ## Binding powers
//!
//! `binding_power(x, p)` applies the operator "bind with x" `p` times to the
//! identity element. Integer exponents work for any vector. Non-integer
//! exponents are only defined for nondegenerate vectors (see
//! [`Algebra::make_nondegenerate`]); everything else is rejected with a
//! [`SpaError::Value`] naming the requirement.

mod hrr;
mod matrix;
mod tvtb;
mod vtb;

pub use hrr::HrrAlgebra;
pub use tvtb::{TvtbAlgebra, TvtbSign};
pub use vtb::VtbAlgebra;

use candle_core::Tensor;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::{Result, SpaError};

// ============================================================================
// Element sidedness
// ============================================================================

/// Side on which an identity or inverse element acts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementSidedness {
    /// `e ⊛ x == x`
    Left,
    /// `x ⊛ e == x`
    Right,
    /// Both of the above
    TwoSided,
}

impl fmt::Display for ElementSidedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementSidedness::Left => write!(f, "left"),
            ElementSidedness::Right => write!(f, "right"),
            ElementSidedness::TwoSided => write!(f, "two-sided"),
        }
    }
}

// ============================================================================
// Vector properties
// ============================================================================

/// Structural property requested when creating a random vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorProperty {
    /// Binding with the vector preserves lengths
    Unitary,
    /// The vector has a positive sign in its algebra
    Positive,
}

impl VectorProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorProperty::Unitary => "unitary",
            VectorProperty::Positive => "positive",
        }
    }
}

impl fmt::Display for VectorProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VectorProperty {
    type Err = SpaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unitary" => Ok(VectorProperty::Unitary),
            "positive" => Ok(VectorProperty::Positive),
            other => Err(SpaError::Value(format!(
                "Invalid vector property '{}' (expected 'unitary' or 'positive')",
                other
            ))),
        }
    }
}

/// Parse a comma separated property list such as `"unitary, positive"`
pub fn parse_properties(spec: &str) -> Result<Vec<VectorProperty>> {
    let mut properties = Vec::new();
    for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let property: VectorProperty = item.parse()?;
        if !properties.contains(&property) {
            properties.push(property);
        }
    }
    Ok(properties)
}

// ============================================================================
// Algebra trait
// ============================================================================

/// A vector binding algebra
///
/// Implementations are stateless; instances are shared as `Arc<dyn Algebra>`
/// and two pointers are compatible when their algebras have the same concrete
/// type (see [`same_algebra`]).
pub trait Algebra: fmt::Debug + Send + Sync + 'static {
    /// Short name used in error messages and debug output
    fn name(&self) -> &'static str;

    /// Upcast for concrete-type comparisons
    fn as_any(&self) -> &dyn Any;

    /// Whether vectors of dimensionality `d` can be handled
    fn is_valid_dimensionality(&self, d: i64) -> bool;

    /// Properties accepted by [`Algebra::create_vector`]
    fn supported_properties(&self) -> &'static [VectorProperty];

    /// Sidedness used by [`SemanticPointer::invert`](crate::pointer::SemanticPointer::invert)
    fn default_sidedness(&self) -> ElementSidedness {
        ElementSidedness::TwoSided
    }

    /// Create a random vector of dimensionality `d` with the given properties
    fn create_vector(
        &self,
        d: usize,
        properties: &[VectorProperty],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>>;

    /// Project `v` onto the nearest unitary vector
    fn make_unitary(&self, v: &[f64]) -> Result<Vec<f64>>;

    /// Project `v` onto a vector for which fractional binding powers are defined
    fn make_nondegenerate(&self, v: &[f64]) -> Result<Vec<f64>>;

    /// Superposition (element-wise sum)
    fn superpose(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        check_same_len(a, b)?;
        Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
    }

    /// Bind `a` with `b`
    fn bind(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>>;

    /// Raise `v` to a binding power
    fn binding_power(&self, v: &[f64], exponent: f64) -> Result<Vec<f64>>;

    /// Inverse of `v` acting on the given side
    fn invert(&self, v: &[f64], sidedness: ElementSidedness) -> Result<Vec<f64>>;

    /// Matrix `M` with `M · a == bind(a, v)`, or `M · a == bind(v, a)` when
    /// `swap_inputs` is set
    fn get_binding_matrix(&self, v: &[f64], swap_inputs: bool) -> Result<Tensor>;

    /// Identity element of dimensionality `d`
    fn identity_element(&self, d: usize) -> Result<Vec<f64>>;

    /// Absorbing element of dimensionality `d`
    fn absorbing_element(&self, d: usize) -> Result<Vec<f64>>;

    /// Zero element of dimensionality `d`
    fn zero_element(&self, d: usize) -> Result<Vec<f64>> {
        check_dimensionality(self, d)?;
        Ok(vec![0.0; d])
    }
}

/// Whether two algebra instances are of the same concrete type
pub fn same_algebra(a: &dyn Algebra, b: &dyn Algebra) -> bool {
    a.as_any().type_id() == b.as_any().type_id()
}

/// The algebra used when none is given
pub fn default_algebra() -> Arc<dyn Algebra> {
    Arc::new(HrrAlgebra)
}

// ============================================================================
// Algebra selection
// ============================================================================

/// Serializable selector for the built-in algebras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgebraKind {
    #[default]
    Hrr,
    Vtb,
    Tvtb,
}

impl AlgebraKind {
    /// Shared instance of the selected algebra
    pub fn instance(&self) -> Arc<dyn Algebra> {
        match self {
            AlgebraKind::Hrr => Arc::new(HrrAlgebra),
            AlgebraKind::Vtb => Arc::new(VtbAlgebra),
            AlgebraKind::Tvtb => Arc::new(TvtbAlgebra),
        }
    }
}

impl FromStr for AlgebraKind {
    type Err = SpaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hrr" => Ok(AlgebraKind::Hrr),
            "vtb" => Ok(AlgebraKind::Vtb),
            "tvtb" => Ok(AlgebraKind::Tvtb),
            other => Err(SpaError::Value(format!("Unknown algebra '{}'", other))),
        }
    }
}

// ============================================================================
// Shared checks
// ============================================================================

pub(crate) fn check_same_len(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(SpaError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_dimensionality<A: Algebra + ?Sized>(algebra: &A, d: usize) -> Result<()> {
    let valid = i64::try_from(d)
        .map(|d| algebra.is_valid_dimensionality(d))
        .unwrap_or(false);
    if !valid {
        return Err(SpaError::Value(format!(
            "Dimensionality {} is not valid for {}",
            d,
            algebra.name()
        )));
    }
    Ok(())
}

pub(crate) fn check_properties<A: Algebra + ?Sized>(
    algebra: &A,
    properties: &[VectorProperty],
) -> Result<()> {
    let supported = algebra.supported_properties();
    if let Some(p) = properties.iter().find(|p| !supported.contains(p)) {
        return Err(SpaError::Value(format!(
            "{} does not support the vector property '{}'",
            algebra.name(),
            p
        )));
    }
    Ok(())
}

pub(crate) fn is_integer(x: f64) -> bool {
    x.is_finite() && x.fract() == 0.0
}

pub(crate) fn normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
