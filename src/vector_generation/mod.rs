//! Random vector generators
//!
//! Each generator is an [`Iterator`] yielding `Vec<f64>` and owns the random
//! number generator it draws from, so a seeded `ChaCha8Rng` gives reproducible
//! streams:
//!
//! ```rust,ignore
//! use an_spa::vector_generation::UnitLengthVectors;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut vectors = UnitLengthVectors::new(64, ChaCha8Rng::seed_from_u64(42))?;
//! let v = vectors.next().unwrap();
//! ```
//!
//! [`AxisAlignedVectors`] and [`OrthonormalVectors`] are finite: they stop after
//! `d` vectors because no further vector fits the constraint.

use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};
use std::sync::Arc;

use crate::algebras::{Algebra, VectorProperty};
use crate::{Result, SpaError};

/// Below this norm a Gram-Schmidt residual is treated as linearly dependent
const DEPENDENCE_TOLERANCE: f64 = 1e-10;

/// Sample a single vector uniformly from the unit sphere in `d` dimensions
pub fn sample_unit_length<R: RngCore + ?Sized>(d: usize, rng: &mut R) -> Vec<f64> {
    loop {
        let mut v = sample_normal(d, 1.0, rng);
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        // A zero draw has probability zero but would have no direction
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
            return v;
        }
    }
}

/// Sample a vector with i.i.d. `N(0, std²)` entries
pub(crate) fn sample_normal<R: RngCore + ?Sized>(d: usize, std: f64, rng: &mut R) -> Vec<f64> {
    (0..d)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            z * std
        })
        .collect()
}

fn check_dimensions(d: usize) -> Result<()> {
    if d == 0 {
        return Err(SpaError::Validation(
            "Vector generators require at least one dimension".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Unit length
// ============================================================================

/// Infinite stream of vectors uniformly distributed on the unit sphere
#[derive(Debug, Clone)]
pub struct UnitLengthVectors<R> {
    dimensions: usize,
    rng: R,
}

impl<R: Rng> UnitLengthVectors<R> {
    pub fn new(dimensions: usize, rng: R) -> Result<Self> {
        check_dimensions(dimensions)?;
        Ok(Self { dimensions, rng })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl<R: Rng> Iterator for UnitLengthVectors<R> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        Some(sample_unit_length(self.dimensions, &mut self.rng))
    }
}

/// Infinite stream of vectors with i.i.d. `N(0, 1/d)` entries
///
/// The expected squared length is one, individual vectors vary around it.
#[derive(Debug, Clone)]
pub struct ExpectedUnitLengthVectors<R> {
    dimensions: usize,
    rng: R,
}

impl<R: Rng> ExpectedUnitLengthVectors<R> {
    pub fn new(dimensions: usize, rng: R) -> Result<Self> {
        check_dimensions(dimensions)?;
        Ok(Self { dimensions, rng })
    }
}

impl<R: Rng> Iterator for ExpectedUnitLengthVectors<R> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        let std = 1.0 / (self.dimensions as f64).sqrt();
        Some(sample_normal(self.dimensions, std, &mut self.rng))
    }
}

// ============================================================================
// Algebra-dependent streams
// ============================================================================

/// Infinite stream of vectors created by an algebra with requested properties
///
/// Construction creates the first vector eagerly so that invalid
/// dimensionalities and unsupported properties are reported by `new`.
/// If the algebra later fails to create a vector, the error is logged at
/// `warn` level and the stream ends.
#[derive(Debug)]
pub struct VectorsWithProperties<R> {
    dimensions: usize,
    properties: Vec<VectorProperty>,
    algebra: Arc<dyn Algebra>,
    rng: R,
    pending: Option<Vec<f64>>,
}

impl<R: Rng> VectorsWithProperties<R> {
    pub fn new(
        dimensions: usize,
        properties: &[VectorProperty],
        algebra: Arc<dyn Algebra>,
        mut rng: R,
    ) -> Result<Self> {
        check_dimensions(dimensions)?;
        let first = algebra.create_vector(dimensions, properties, &mut rng)?;
        Ok(Self {
            dimensions,
            properties: properties.to_vec(),
            algebra,
            rng,
            pending: Some(first),
        })
    }

    pub fn properties(&self) -> &[VectorProperty] {
        &self.properties
    }
}

impl<R: Rng> Iterator for VectorsWithProperties<R> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        if let Some(v) = self.pending.take() {
            return Some(v);
        }
        match self
            .algebra
            .create_vector(self.dimensions, &self.properties, &mut self.rng)
        {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(algebra = self.algebra.name(), error = %e, "vector stream ended");
                None
            }
        }
    }
}

/// Infinite stream of unitary vectors under a given algebra
#[derive(Debug)]
pub struct UnitaryVectors<R> {
    inner: VectorsWithProperties<R>,
}

impl<R: Rng> UnitaryVectors<R> {
    pub fn new(dimensions: usize, algebra: Arc<dyn Algebra>, rng: R) -> Result<Self> {
        let inner =
            VectorsWithProperties::new(dimensions, &[VectorProperty::Unitary], algebra, rng)?;
        Ok(Self { inner })
    }
}

impl<R: Rng> Iterator for UnitaryVectors<R> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        self.inner.next()
    }
}

// ============================================================================
// Finite streams
// ============================================================================

/// The `d` standard basis vectors `e_0, ..., e_{d-1}` in order
#[derive(Debug, Clone)]
pub struct AxisAlignedVectors {
    dimensions: usize,
    next_axis: usize,
}

impl AxisAlignedVectors {
    pub fn new(dimensions: usize) -> Result<Self> {
        check_dimensions(dimensions)?;
        Ok(Self {
            dimensions,
            next_axis: 0,
        })
    }
}

impl Iterator for AxisAlignedVectors {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        if self.next_axis >= self.dimensions {
            return None;
        }
        let mut v = vec![0.0; self.dimensions];
        v[self.next_axis] = 1.0;
        self.next_axis += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dimensions - self.next_axis;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AxisAlignedVectors {}

/// Random mutually orthonormal vectors; at most `d` of them
#[derive(Debug, Clone)]
pub struct OrthonormalVectors<R> {
    dimensions: usize,
    basis: Vec<Vec<f64>>,
    rng: R,
}

impl<R: Rng> OrthonormalVectors<R> {
    pub fn new(dimensions: usize, rng: R) -> Result<Self> {
        check_dimensions(dimensions)?;
        Ok(Self {
            dimensions,
            basis: Vec::with_capacity(dimensions),
            rng,
        })
    }
}

impl<R: Rng> Iterator for OrthonormalVectors<R> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        if self.basis.len() >= self.dimensions {
            return None;
        }
        loop {
            let mut v = sample_unit_length(self.dimensions, &mut self.rng);
            // Two Gram-Schmidt passes keep the basis orthogonal to machine precision
            for _ in 0..2 {
                for b in &self.basis {
                    let proj: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
                    v.iter_mut().zip(b).for_each(|(x, y)| *x -= proj * y);
                }
            }
            let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > DEPENDENCE_TOLERANCE {
                v.iter_mut().for_each(|x| *x /= norm);
                self.basis.push(v.clone());
                return Some(v);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dimensions - self.basis.len();
        (remaining, Some(remaining))
    }
}
