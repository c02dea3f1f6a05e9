//! Semantic pointers
//!
//! A [`SemanticPointer`] wraps a vector together with the algebra it lives in,
//! an optional (weakly held) vocabulary and an optional name. Values are never
//! mutated: every operation returns a new pointer, and names compose into an
//! expression string describing how the value was derived.
//!
//! ## Compatibility
//!
//! Binary operations require
//!
//! 1. compatible vocabularies: either side has none, or both have the same one
//!    ([`SpaError::SpaType`] otherwise)
//! 2. the same algebra type ([`SpaError::Type`] otherwise)
//! 3. equal lengths ([`SpaError::DimensionMismatch`] otherwise)
//!
//! ## Naming
//!
//! | Operation | Name |
//! |-----------|------|
//! | `a + b`, `a - b`, `a * b` | `(a)+(b)`, `(a)-(b)`, `(a)*(b)` |
//! | `2.0 * a` | `(2.0)*(a)` |
//! | `-a`, `!a` | `-(a)`, `~(a)` |
//! | `a.pow(3.0)` | `(a)**(3)` |
//! | projections | `(a).normalized()`, `(a).unitary()`, `(a).nondegenerate()` |
//!
//! Binary results are unnamed when either operand is unnamed.

mod construct;
mod ops;

pub use construct::PointerNode;

use candle_core::{DType, Tensor};
use rand::RngCore;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::algebras::{default_algebra, same_algebra, Algebra, ElementSidedness};
use crate::vector_generation::sample_unit_length;
use crate::vocab::Vocabulary;
use crate::{Result, SpaError};

/// Norms below this are treated as zero by `normalized` and `compare`
const ZERO_NORM: f64 = 1e-8;

/// A vector bound to an algebra, with optional vocabulary and name
#[derive(Clone)]
pub struct SemanticPointer {
    v: Vec<f64>,
    algebra: Arc<dyn Algebra>,
    vocab: Option<Weak<Vocabulary>>,
    name: Option<String>,
}

// ============================================================================
// Construction
// ============================================================================

impl SemanticPointer {
    /// Create an unnamed pointer in the default (HRR) algebra
    ///
    /// Fails with [`SpaError::Validation`] for an empty or non-finite vector.
    pub fn new(v: impl Into<Vec<f64>>) -> Result<Self> {
        let v = v.into();
        if v.is_empty() {
            return Err(SpaError::Validation(
                "Semantic pointer must have at least one dimension".to_string(),
            ));
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(SpaError::Validation(
                "Semantic pointer elements must be finite".to_string(),
            ));
        }
        Ok(Self {
            v,
            algebra: default_algebra(),
            vocab: None,
            name: None,
        })
    }

    /// Create a pointer from a one-dimensional tensor of any float dtype
    pub fn from_tensor(tensor: &Tensor) -> Result<Self> {
        if tensor.rank() != 1 {
            return Err(SpaError::Validation(format!(
                "Semantic pointer data must be one-dimensional, got shape {:?}",
                tensor.dims()
            )));
        }
        let v = tensor.to_dtype(DType::F64)?.to_vec1::<f64>()?;
        Self::new(v)
    }

    /// Random unit-length pointer of dimensionality `d`
    pub fn random<R: RngCore + ?Sized>(d: usize, rng: &mut R) -> Result<Self> {
        if d == 0 {
            return Err(SpaError::Validation(
                "Semantic pointer must have at least one dimension".to_string(),
            ));
        }
        Self::new(sample_unit_length(d, rng))
    }

    /// The algebra's identity element, named `Identity`
    pub fn identity(d: usize, algebra: Arc<dyn Algebra>) -> Result<Self> {
        Self::special(d, algebra, "Identity", |a, d| a.identity_element(d))
    }

    /// The algebra's zero element, named `Zero`
    pub fn zero(d: usize, algebra: Arc<dyn Algebra>) -> Result<Self> {
        Self::special(d, algebra, "Zero", |a, d| a.zero_element(d))
    }

    /// The algebra's absorbing element, named `AbsorbingElement`
    pub fn absorbing_element(d: usize, algebra: Arc<dyn Algebra>) -> Result<Self> {
        Self::special(d, algebra, "AbsorbingElement", |a, d| a.absorbing_element(d))
    }

    fn special(
        d: usize,
        algebra: Arc<dyn Algebra>,
        name: &str,
        element: impl FnOnce(&dyn Algebra, usize) -> Result<Vec<f64>>,
    ) -> Result<Self> {
        if d == 0 {
            return Err(SpaError::Validation(
                "Semantic pointer must have at least one dimension".to_string(),
            ));
        }
        let v = element(algebra.as_ref(), d)?;
        Ok(Self {
            v,
            algebra,
            vocab: None,
            name: Some(name.to_string()),
        })
    }

    pub fn with_algebra(mut self, algebra: Arc<dyn Algebra>) -> Self {
        self.algebra = algebra;
        self
    }

    pub fn with_vocab(mut self, vocab: &Arc<Vocabulary>) -> Self {
        self.vocab = Some(Arc::downgrade(vocab));
        self
    }

    pub(crate) fn with_vocab_weak(mut self, vocab: Weak<Vocabulary>) -> Self {
        self.vocab = Some(vocab);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn without_name(mut self) -> Self {
        self.name = None;
        self
    }

    /// New pointer sharing this pointer's algebra and vocabulary
    fn derive(&self, v: Vec<f64>, name: Option<String>) -> Self {
        Self {
            v,
            algebra: self.algebra.clone(),
            vocab: self.vocab.clone(),
            name,
        }
    }

    fn derive_binary(&self, other: &Self, v: Vec<f64>, op: &str) -> Self {
        let name = match (&self.name, &other.name) {
            (Some(a), Some(b)) => Some(format!("({}){}({})", a, op, b)),
            _ => None,
        };
        Self {
            v,
            algebra: self.algebra.clone(),
            vocab: self.vocab.clone().or_else(|| other.vocab.clone()),
            name,
        }
    }

    fn derive_unary(&self, v: Vec<f64>, fmt: impl FnOnce(&str) -> String) -> Self {
        let name = self.name.as_deref().map(fmt);
        self.derive(v, name)
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl SemanticPointer {
    /// The raw vector
    pub fn v(&self) -> &[f64] {
        &self.v
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.v
    }

    /// Dimensionality
    pub fn len(&self) -> usize {
        self.v.len()
    }

    /// Always false; pointers have at least one dimension
    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    pub fn algebra(&self) -> &Arc<dyn Algebra> {
        &self.algebra
    }

    /// The owning vocabulary, if any and still alive
    pub fn vocab(&self) -> Option<Arc<Vocabulary>> {
        self.vocab.as_ref().and_then(Weak::upgrade)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("'{}'", name),
            None => "an unnamed pointer".to_string(),
        }
    }
}

// ============================================================================
// Compatibility checks
// ============================================================================

impl SemanticPointer {
    fn check_vocab(&self, other: &Self) -> Result<()> {
        if let (Some(a), Some(b)) = (&self.vocab, &other.vocab) {
            if !Weak::ptr_eq(a, b) {
                return Err(SpaError::SpaType(format!(
                    "{} and {} belong to different vocabularies",
                    self.describe(),
                    other.describe()
                )));
            }
        }
        Ok(())
    }

    fn check_algebra(&self, other: &Self) -> Result<()> {
        if !same_algebra(self.algebra.as_ref(), other.algebra.as_ref()) {
            return Err(SpaError::Type(format!(
                "Operation not supported between {} and {}",
                self.algebra.name(),
                other.algebra.name()
            )));
        }
        Ok(())
    }

    fn check_len(&self, other: &[f64]) -> Result<()> {
        if self.v.len() != other.len() {
            return Err(SpaError::DimensionMismatch {
                expected: self.v.len(),
                actual: other.len(),
            });
        }
        Ok(())
    }

    fn check_binary(&self, other: &Self) -> Result<()> {
        self.check_vocab(other)?;
        self.check_algebra(other)?;
        self.check_len(&other.v)
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

impl SemanticPointer {
    /// Superposition
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_binary(other)?;
        let v = self.algebra.superpose(&self.v, &other.v)?;
        Ok(self.derive_binary(other, v, "+"))
    }

    /// Superposition with the negated `other`
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_binary(other)?;
        let negated: Vec<f64> = other.v.iter().map(|x| -x).collect();
        let v = self.algebra.superpose(&self.v, &negated)?;
        Ok(self.derive_binary(other, v, "-"))
    }

    pub fn neg(&self) -> Self {
        let v = self.v.iter().map(|x| -x).collect();
        self.derive_unary(v, |n| format!("-({})", n))
    }

    /// Multiply every element by `factor`
    pub fn scale(&self, factor: f64) -> Self {
        let v = self.v.iter().map(|x| x * factor).collect();
        self.derive_unary(v, |n| format!("({:?})*({})", factor, n))
    }

    /// Bind with `other` using the shared algebra
    pub fn bind(&self, other: &Self) -> Result<Self> {
        self.check_binary(other)?;
        let v = self.algebra.bind(&self.v, &other.v)?;
        Ok(self.derive_binary(other, v, "*"))
    }

    /// Inverse on the algebra's default side
    pub fn invert(&self) -> Result<Self> {
        self.invert_with(self.algebra.default_sidedness())
    }

    /// Inverse on an explicit side
    pub fn invert_with(&self, sidedness: ElementSidedness) -> Result<Self> {
        let v = self.algebra.invert(&self.v, sidedness)?;
        Ok(self.derive_unary(v, |n| format!("~({})", n)))
    }

    /// Binding power; non-integer exponents need a nondegenerate pointer
    pub fn pow(&self, exponent: f64) -> Result<Self> {
        let v = self.algebra.binding_power(&self.v, exponent)?;
        Ok(self.derive_unary(v, |n| format!("({})**({})", n, exponent)))
    }
}

// ============================================================================
// Projections
// ============================================================================

impl SemanticPointer {
    /// Unit-length copy; a zero vector stays zero
    pub fn normalized(&self) -> Self {
        let norm = self.length();
        let v = if norm < ZERO_NORM {
            self.v.clone()
        } else {
            self.v.iter().map(|x| x / norm).collect()
        };
        self.derive_unary(v, |n| format!("({}).normalized()", n))
    }

    /// Nearest unitary pointer under the algebra
    pub fn unitary(&self) -> Result<Self> {
        let v = self.algebra.make_unitary(&self.v)?;
        Ok(self.derive_unary(v, |n| format!("({}).unitary()", n)))
    }

    /// Projection onto vectors with defined fractional binding powers
    pub fn nondegenerate(&self) -> Result<Self> {
        let v = self.algebra.make_nondegenerate(&self.v)?;
        Ok(self.derive_unary(v, |n| format!("({}).nondegenerate()", n)))
    }
}

// ============================================================================
// Comparison
// ============================================================================

impl SemanticPointer {
    /// Euclidean norm
    pub fn length(&self) -> f64 {
        self.v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Dot product with another pointer
    pub fn dot(&self, other: &Self) -> Result<f64> {
        self.check_vocab(other)?;
        self.dot_vec(&other.v)
    }

    /// Dot product with a raw vector
    pub fn dot_vec(&self, other: &[f64]) -> Result<f64> {
        self.check_len(other)?;
        Ok(self.v.iter().zip(other).map(|(a, b)| a * b).sum())
    }

    /// Cosine similarity; zero when either vector has (near) zero length
    pub fn compare(&self, other: &Self) -> Result<f64> {
        let dot = self.dot(other)?;
        let (norm_a, norm_b) = (self.length(), other.length());
        if norm_a < ZERO_NORM || norm_b < ZERO_NORM {
            return Ok(0.0);
        }
        Ok(dot / (norm_a * norm_b))
    }

    /// `1 - compare(other)`
    pub fn distance(&self, other: &Self) -> Result<f64> {
        Ok(1.0 - self.compare(other)?)
    }

    /// Mean squared element-wise difference
    pub fn mse(&self, other: &Self) -> Result<f64> {
        let diff = self.sub(other)?;
        Ok(diff.v.iter().map(|x| x * x).sum::<f64>() / diff.v.len() as f64)
    }

    /// Matrix form of binding with this pointer (see [`Algebra::get_binding_matrix`])
    pub fn get_binding_matrix(&self, swap_inputs: bool) -> Result<Tensor> {
        self.algebra.get_binding_matrix(&self.v, swap_inputs)
    }
}

// ============================================================================
// Formatting
// ============================================================================

impl fmt::Display for SemanticPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "SemanticPointer<{}>", name),
            None => write!(f, "{:?}", self),
        }
    }
}

impl fmt::Debug for SemanticPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vocab = match self.vocab() {
            Some(vocab) => format!("{:?}", vocab),
            None => "None".to_string(),
        };
        write!(
            f,
            "SemanticPointer({:?}, vocab={}, algebra={}, name={:?})",
            self.v,
            vocab,
            self.algebra.name(),
            self.name
        )
    }
}

impl AsRef<[f64]> for SemanticPointer {
    fn as_ref(&self) -> &[f64] {
        &self.v
    }
}
