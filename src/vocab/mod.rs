//! Minimal vocabulary
//!
//! A [`Vocabulary`] maps names to [`SemanticPointer`]s that share one
//! dimensionality and one algebra. Pointers taken from a vocabulary carry a
//! weak reference back to it, so operations between pointers of different
//! vocabularies fail with [`SpaError::SpaType`].
//!
//! ## Example
//!
//! ```ignore
//! use an_spa::prelude::*;
//!
//! let vocab = Vocabulary::with_config(VocabularyConfig {
//!     dimensions: 256,
//!     seed: Some(42),
//!     ..Default::default()
//! })?;
//! vocab.populate("COLOR; RED; SHAPE; CIRCLE; OBJ = COLOR * RED + SHAPE * CIRCLE")?;
//!
//! let red = vocab.parse("OBJ * ~COLOR")?;
//! assert!(red.compare(&vocab.get("RED")?)? > 0.5);
//! ```
//!
//! ## Keys
//!
//! Keys start with an uppercase ASCII letter followed by ASCII letters, digits
//! or underscores. `Identity`, `Zero` and `AbsorbingElement` are reserved and
//! resolve to the algebra's special elements in expressions.

pub mod config;
mod parser;

pub use config::{VocabularyConfig, SEED_ENV};
pub use parser::{parse_declaration, parse_expression, Declaration, Expr, Method, Operand};

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::algebras::{same_algebra, Algebra, VectorProperty};
use crate::pointer::SemanticPointer;
use crate::{Result, SpaError};

/// Names that expressions resolve to special elements
pub const RESERVED_KEYS: [&str; 3] = ["Identity", "Zero", "AbsorbingElement"];

/// Candidates drawn before `create_pointer` gives up on `max_similarity`
const MAX_CREATE_ATTEMPTS: usize = 100;

#[derive(Default)]
struct Entries {
    order: Vec<String>,
    vectors: HashMap<String, SemanticPointer>,
}

/// Named semantic pointers sharing a dimensionality and algebra
pub struct Vocabulary {
    config: VocabularyConfig,
    algebra: Arc<dyn Algebra>,
    entries: RwLock<Entries>,
    rng: Mutex<ChaCha8Rng>,
    this: Weak<Vocabulary>,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Vocabulary {
    /// Empty HRR vocabulary of dimensionality `dimensions` with default settings
    pub fn new(dimensions: usize) -> Result<Arc<Self>> {
        Self::with_config(VocabularyConfig::with_dimensions(dimensions))
    }

    /// Empty vocabulary from a validated config
    pub fn with_config(config: VocabularyConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let algebra = config.algebra.instance();
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Arc::new_cyclic(|this| Self {
            config,
            algebra,
            entries: RwLock::new(Entries::default()),
            rng: Mutex::new(rng),
            this: this.clone(),
        }))
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl Vocabulary {
    pub fn config(&self) -> &VocabularyConfig {
        &self.config
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub fn algebra(&self) -> &Arc<dyn Algebra> {
        &self.algebra
    }

    pub fn len(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().order.clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().vectors.contains_key(key)
    }

    /// Similarity (dot product) of `pointer` with every entry, in key order
    pub fn dot(&self, pointer: &SemanticPointer) -> Result<Vec<f64>> {
        let entries = self.entries.read();
        entries
            .order
            .iter()
            .filter_map(|key| entries.vectors.get(key))
            .map(|stored| stored.dot(pointer))
            .collect()
    }
}

// =============================================================================
// INSERTION
// =============================================================================

fn validate_key(key: &str) -> Result<()> {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_uppercase() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(SpaError::Validation(format!(
            "Invalid vocabulary key '{}': keys start with an uppercase letter \
             followed by letters, digits or '_'",
            key
        )));
    }
    if RESERVED_KEYS.contains(&key) {
        return Err(SpaError::Validation(format!(
            "'{}' is reserved for a special element",
            key
        )));
    }
    Ok(())
}

impl Vocabulary {
    /// Add `pointer` under `key`, returning the stored (named, attached) pointer
    pub fn add(&self, key: &str, pointer: &SemanticPointer) -> Result<SemanticPointer> {
        let stored = self.prepare(key, pointer)?;
        let mut entries = self.entries.write();
        if entries.vectors.contains_key(key) {
            return Err(SpaError::Validation(format!(
                "The key '{}' is already in the vocabulary",
                key
            )));
        }
        entries.order.push(key.to_string());
        entries.vectors.insert(key.to_string(), stored.clone());
        drop(entries);

        tracing::debug!(key, dimensions = self.dimensions(), "added vocabulary entry");
        Ok(stored)
    }

    /// Add a raw vector under `key`
    pub fn add_vector(&self, key: &str, v: Vec<f64>) -> Result<SemanticPointer> {
        let pointer = SemanticPointer::new(v)?.with_algebra(self.algebra.clone());
        self.add(key, &pointer)
    }

    fn prepare(&self, key: &str, pointer: &SemanticPointer) -> Result<SemanticPointer> {
        validate_key(key)?;
        if pointer.len() != self.dimensions() {
            return Err(SpaError::DimensionMismatch {
                expected: self.dimensions(),
                actual: pointer.len(),
            });
        }
        if !same_algebra(pointer.algebra().as_ref(), self.algebra.as_ref()) {
            return Err(SpaError::Type(format!(
                "Cannot add a {} pointer to a {} vocabulary",
                pointer.algebra().name(),
                self.algebra.name()
            )));
        }
        if let Some(owner) = pointer.vocab() {
            if !std::ptr::eq(Arc::as_ptr(&owner), self) {
                return Err(SpaError::SpaType(format!(
                    "Cannot add '{}': the pointer belongs to another vocabulary",
                    key
                )));
            }
        }
        Ok(pointer
            .clone()
            .with_name(key)
            .with_vocab_weak(self.this.clone()))
    }

    /// Random pointer attached to this vocabulary but not stored in it
    ///
    /// Draws up to 100 candidates looking for one whose similarity to every
    /// entry is at most `max_similarity`; otherwise returns the best
    /// candidate and logs a warning.
    pub fn create_pointer(&self, properties: &[VectorProperty]) -> Result<SemanticPointer> {
        let d = self.dimensions();
        let existing: Vec<SemanticPointer> =
            self.entries.read().vectors.values().cloned().collect();
        let mut rng = self.rng.lock();

        let mut best: Option<(f64, Vec<f64>)> = None;
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let v = self.algebra.create_vector(d, properties, &mut *rng)?;
            let candidate = SemanticPointer::new(v)?.with_algebra(self.algebra.clone());
            let mut similarity = f64::NEG_INFINITY;
            for other in &existing {
                similarity = similarity.max(candidate.compare(other)?);
            }
            if similarity <= self.config.max_similarity {
                return Ok(candidate.with_vocab_weak(self.this.clone()));
            }
            if best.as_ref().map_or(true, |(s, _)| similarity < *s) {
                best = Some((similarity, candidate.into_vec()));
            }
        }

        let (similarity, v) = best.ok_or_else(|| {
            SpaError::Validation("Vocabulary could not sample a candidate vector".to_string())
        })?;
        tracing::warn!(
            max_similarity = self.config.max_similarity,
            best = similarity,
            attempts = MAX_CREATE_ATTEMPTS,
            "Could not create a semantic pointer below the similarity bound"
        );
        Ok(SemanticPointer::new(v)?
            .with_algebra(self.algebra.clone())
            .with_vocab_weak(self.this.clone()))
    }

    /// Add entries from a `;`-separated list of declarations
    ///
    /// `NAME` adds a fresh random pointer, `NAME.unitary()` (or any chain of
    /// projections) projects it first, and `NAME = expr` stores the value of an
    /// expression over existing entries.
    pub fn populate(&self, declarations: &str) -> Result<()> {
        for item in declarations.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            match parse_declaration(item)? {
                Declaration::Fresh { name, methods } => {
                    validate_key(&name)?;
                    let mut pointer = self.create_pointer(&[])?;
                    for method in methods {
                        pointer = method.apply(&pointer)?;
                    }
                    self.add(&name, &pointer)?;
                }
                Declaration::Assign { name, expr } => {
                    let pointer = self.expect_pointer(item, expr.evaluate(self)?)?;
                    self.add(&name, &pointer)?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// LOOKUP
// =============================================================================

impl Vocabulary {
    /// Pointer stored under `key`
    ///
    /// Unknown keys fail with [`SpaError::Value`] in strict vocabularies and
    /// are created and stored otherwise.
    pub fn get(&self, key: &str) -> Result<SemanticPointer> {
        if let Some(pointer) = self.entries.read().vectors.get(key) {
            return Ok(pointer.clone());
        }
        if self.config.strict {
            return Err(SpaError::Value(format!(
                "The key '{}' is not in the vocabulary",
                key
            )));
        }

        validate_key(key)?;
        let created = self.prepare(key, &self.create_pointer(&[])?)?;
        let mut entries = self.entries.write();
        if let Some(existing) = entries.vectors.get(key) {
            return Ok(existing.clone());
        }
        entries.order.push(key.to_string());
        entries.vectors.insert(key.to_string(), created.clone());
        drop(entries);

        tracing::debug!(key, "created vocabulary entry on lookup");
        Ok(created)
    }

    /// Evaluate an expression over the vocabulary's keys
    pub fn parse(&self, expression: &str) -> Result<SemanticPointer> {
        let value = parse_expression(expression)?.evaluate(self)?;
        self.expect_pointer(expression, value)
    }

    pub(crate) fn resolve_symbol(&self, name: &str) -> Result<SemanticPointer> {
        let d = self.dimensions();
        let special = match name {
            "Identity" => SemanticPointer::identity(d, self.algebra.clone())?,
            "Zero" => SemanticPointer::zero(d, self.algebra.clone())?,
            "AbsorbingElement" => SemanticPointer::absorbing_element(d, self.algebra.clone())?,
            _ => return self.get(name),
        };
        Ok(special.with_vocab_weak(self.this.clone()))
    }

    fn expect_pointer(&self, source: &str, value: Operand) -> Result<SemanticPointer> {
        match value {
            Operand::Pointer(pointer) => Ok(pointer),
            Operand::Scalar(x) => Err(SpaError::Type(format!(
                "'{}' evaluates to the scalar {}, not a semantic pointer",
                source, x
            ))),
        }
    }
}

impl fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = match self.entries.try_read() {
            Some(entries) => format!("{:?}", entries.order),
            None => "<locked>".to_string(),
        };
        write!(
            f,
            "Vocabulary(dimensions={}, algebra={}, keys={})",
            self.dimensions(),
            self.algebra.name(),
            keys
        )
    }
}
