//! Operator sugar for [`SemanticPointer`]
//!
//! | Operator | Method | Output |
//! |----------|--------|--------|
//! | `a + b` | [`SemanticPointer::add`] | `Result<SemanticPointer>` |
//! | `a - b` | [`SemanticPointer::sub`] | `Result<SemanticPointer>` |
//! | `a * b` | [`SemanticPointer::bind`] | `Result<SemanticPointer>` |
//! | `a * 2.0`, `2.0 * a` | [`SemanticPointer::scale`] | `SemanticPointer` |
//! | `-a` | [`SemanticPointer::neg`] | `SemanticPointer` |
//! | `!a` | [`SemanticPointer::invert`] | `Result<SemanticPointer>` |
//!
//! Fallible operators return `Result` like candle's tensor operators, so
//! expressions compose with `?`: `((&a * &b)? + &c)?`. There are no compound
//! assignment operators; `a = (&a + &b)?` rebinds `a` to a fresh value.

use std::ops::{Add, Mul, Neg, Not, Sub};

use super::SemanticPointer;
use crate::Result;

macro_rules! binary_op {
    ($trait:ident, $fn:ident, $method:ident) => {
        impl $trait<&SemanticPointer> for &SemanticPointer {
            type Output = Result<SemanticPointer>;

            fn $fn(self, rhs: &SemanticPointer) -> Self::Output {
                SemanticPointer::$method(self, rhs)
            }
        }

        impl $trait<SemanticPointer> for &SemanticPointer {
            type Output = Result<SemanticPointer>;

            fn $fn(self, rhs: SemanticPointer) -> Self::Output {
                SemanticPointer::$method(self, &rhs)
            }
        }

        impl $trait<&SemanticPointer> for SemanticPointer {
            type Output = Result<SemanticPointer>;

            fn $fn(self, rhs: &SemanticPointer) -> Self::Output {
                SemanticPointer::$method(&self, rhs)
            }
        }

        impl $trait<SemanticPointer> for SemanticPointer {
            type Output = Result<SemanticPointer>;

            fn $fn(self, rhs: SemanticPointer) -> Self::Output {
                SemanticPointer::$method(&self, &rhs)
            }
        }
    };
}

binary_op!(Add, add, add);
binary_op!(Sub, sub, sub);
binary_op!(Mul, mul, bind);

impl Mul<f64> for &SemanticPointer {
    type Output = SemanticPointer;

    fn mul(self, rhs: f64) -> SemanticPointer {
        self.scale(rhs)
    }
}

impl Mul<f64> for SemanticPointer {
    type Output = SemanticPointer;

    fn mul(self, rhs: f64) -> SemanticPointer {
        self.scale(rhs)
    }
}

impl Mul<&SemanticPointer> for f64 {
    type Output = SemanticPointer;

    fn mul(self, rhs: &SemanticPointer) -> SemanticPointer {
        rhs.scale(self)
    }
}

impl Mul<SemanticPointer> for f64 {
    type Output = SemanticPointer;

    fn mul(self, rhs: SemanticPointer) -> SemanticPointer {
        rhs.scale(self)
    }
}

impl Neg for &SemanticPointer {
    type Output = SemanticPointer;

    fn neg(self) -> SemanticPointer {
        SemanticPointer::neg(self)
    }
}

impl Neg for SemanticPointer {
    type Output = SemanticPointer;

    fn neg(self) -> SemanticPointer {
        SemanticPointer::neg(&self)
    }
}

/// `!a` is the algebra's inverse (`~a`)
impl Not for &SemanticPointer {
    type Output = Result<SemanticPointer>;

    fn not(self) -> Self::Output {
        self.invert()
    }
}

impl Not for SemanticPointer {
    type Output = Result<SemanticPointer>;

    fn not(self) -> Self::Output {
        self.invert()
    }
}
