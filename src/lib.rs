//! # an-spa
//!
//! Semantic pointer algebras: high-dimensional vectors that represent symbols
//! and compose through superposition, binding, inversion and fractional binding
//! powers.
//!
//! ## Overview
//!
//! A semantic pointer is a real-valued vector tagged with the binding algebra it
//! lives in, an optional owning vocabulary and an optional human-readable name.
//! Every operation returns a new pointer; names compose into expression strings
//! such as `((A)*(B))+(C)`.
//!
//! Core capabilities:
//!
//! - **Algebras**: circular convolution (HRR), vector-derived transformation
//!   binding (VTB) and its transposed variant (TVTB) behind one [`Algebra`] trait
//! - **Pointers**: operator-overloaded [`SemanticPointer`] with name tracking and
//!   vocabulary compatibility checks
//! - **Vector generation**: seeded iterators of unit-length, unitary, axis-aligned
//!   and orthonormal vectors
//! - **Vocabulary**: named pointers, a small expression parser and
//!   similarity-bounded random pointer creation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use an_spa::prelude::*;
//!
//! let vocab = Vocabulary::new(256)?;
//! vocab.populate("COLOR; RED; SHAPE; CIRCLE")?;
//!
//! let scene = vocab.parse("COLOR*RED + SHAPE*CIRCLE")?;
//! let query = (&scene * &vocab.parse("~COLOR")?)?;
//! println!("{:.3}", query.compare(&vocab.get("RED")?)?);
//!
//! // Fractional binding encodes a continuous value
//! let x = vocab.parse("COLOR")?.nondegenerate()?;
//! let half = x.pow(0.5)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `linalg` (default): dense decompositions backing the matrix-binding
//!   algebras (unitary projection, fractional powers, TVTB sign/abs)

pub mod algebras;
pub mod pointer;
pub mod testing;
pub mod vector_generation;
pub mod vocab;

// Re-export candle types for convenience
pub use candle_core::{DType, Device, Tensor};

pub use algebras::{Algebra, AlgebraKind, ElementSidedness, VectorProperty};
pub use pointer::SemanticPointer;
pub use vocab::{Vocabulary, VocabularyConfig};

/// Error types for semantic pointer operations
#[derive(Debug, thiserror::Error)]
pub enum SpaError {
    /// Invalid constructor input or configuration value
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operands belong to different vocabularies
    #[error("Incompatible vocabularies: {0}")]
    SpaType(String),

    /// Operands are of incompatible kinds (different algebras, scalar vs pointer)
    #[error("Type error: {0}")]
    Type(String),

    /// Numerically invalid input (invalid dimensionality, degenerate vector, ...)
    #[error("Value error: {0}")]
    Value(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Operation that the algebra does not define
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Result type alias for semantic pointer operations
pub type Result<T> = std::result::Result<T, SpaError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{DType, Device, Tensor};
    pub use crate::{Result, SpaError};

    // Algebras
    pub use crate::algebras::{
        same_algebra, Algebra, AlgebraKind, ElementSidedness, HrrAlgebra, TvtbAlgebra, TvtbSign,
        VectorProperty, VtbAlgebra,
    };

    // Pointers
    pub use crate::pointer::{PointerNode, SemanticPointer};

    // Vector generation
    pub use crate::vector_generation::{
        AxisAlignedVectors, ExpectedUnitLengthVectors, OrthonormalVectors, UnitLengthVectors,
        UnitaryVectors, VectorsWithProperties,
    };

    // Vocabulary
    pub use crate::vocab::{Vocabulary, VocabularyConfig};
}
