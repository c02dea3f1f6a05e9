//! Vocabulary configuration
//!
//! Loaded from JSON (inline or from a file) and optionally overridden from the
//! environment:
//!
//! ```json
//! {
//!   "dimensions": 256,
//!   "algebra": "tvtb",
//!   "max_similarity": 0.1,
//!   "strict": true,
//!   "seed": 42
//! }
//! ```
//!
//! Missing fields take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::algebras::AlgebraKind;
use crate::{Result, SpaError};

/// Environment variable that overrides [`VocabularyConfig::seed`]
pub const SEED_ENV: &str = "AN_SPA_SEED";

/// Settings for a [`Vocabulary`](super::Vocabulary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Dimensionality of every pointer in the vocabulary
    pub dimensions: usize,

    /// Binding algebra shared by all pointers
    pub algebra: AlgebraKind,

    /// Upper bound on the similarity between a new random pointer and the
    /// existing ones
    pub max_similarity: f64,

    /// Fail on unknown keys instead of creating them
    pub strict: bool,

    /// Seed for pointer creation; entropy when absent
    pub seed: Option<u64>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            dimensions: 64,
            algebra: AlgebraKind::Hrr,
            max_similarity: 0.1,
            strict: true,
            seed: None,
        }
    }
}

impl VocabularyConfig {
    /// Default settings with the given dimensionality
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SpaError::Serialization(format!("Invalid vocabulary config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SpaError::Serialization(e.to_string()))
    }

    /// Apply `AN_SPA_SEED` if set
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(SEED_ENV) {
            let seed = raw.trim().parse::<u64>().map_err(|_| {
                SpaError::Validation(format!(
                    "{} must be an unsigned integer, got '{}'",
                    SEED_ENV, raw
                ))
            })?;
            tracing::debug!(seed, "vocabulary seed taken from environment");
            self.seed = Some(seed);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(SpaError::Validation(
                "Vocabulary dimensions must be at least 1".to_string(),
            ));
        }
        let algebra = self.algebra.instance();
        let valid = i64::try_from(self.dimensions)
            .map(|d| algebra.is_valid_dimensionality(d))
            .unwrap_or(false);
        if !valid {
            return Err(SpaError::Validation(format!(
                "{} dimensions are not valid for {}",
                self.dimensions,
                algebra.name()
            )));
        }
        if !(-1.0..=1.0).contains(&self.max_similarity) {
            return Err(SpaError::Validation(format!(
                "max_similarity must lie in [-1, 1], got {}",
                self.max_similarity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = VocabularyConfig::default();
        assert_eq!(config.dimensions, 64);
        assert_eq!(config.algebra, AlgebraKind::Hrr);
        assert!(config.strict);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = VocabularyConfig::from_json_str(r#"{"dimensions": 16, "algebra": "tvtb"}"#)
            .unwrap();
        assert_eq!(config.dimensions, 16);
        assert_eq!(config.algebra, AlgebraKind::Tvtb);
        assert_eq!(config.max_similarity, 0.1);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            VocabularyConfig::from_json_str(r#"{"dimensions": 15, "algebra": "vtb"}"#),
            Err(SpaError::Validation(_))
        ));
        assert!(matches!(
            VocabularyConfig::from_json_str(r#"{"max_similarity": 2.0}"#),
            Err(SpaError::Validation(_))
        ));
        assert!(matches!(
            VocabularyConfig::from_json_str("not json"),
            Err(SpaError::Serialization(_))
        ));
    }

    #[test]
    fn test_json_file_round_trip() {
        let config = VocabularyConfig {
            dimensions: 25,
            algebra: AlgebraKind::Vtb,
            max_similarity: 0.2,
            strict: false,
            seed: Some(7),
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();
        let loaded = VocabularyConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = VocabularyConfig::from_json_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SpaError::Io(_)));
    }

    #[test]
    fn test_env_seed_override() {
        std::env::set_var(SEED_ENV, "1234");
        let config = VocabularyConfig::default().with_env_overrides().unwrap();
        assert_eq!(config.seed, Some(1234));

        std::env::set_var(SEED_ENV, "abc");
        assert!(VocabularyConfig::default().with_env_overrides().is_err());
        std::env::remove_var(SEED_ENV);
    }
}
