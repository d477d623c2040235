//! # strata-config
//!
//! Layered configuration loading for Strata using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`STRATA_*` prefix, `__` as separator)
//! 2. Project-level `.strata/config.toml`
//! 3. User-level `~/.config/strata/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `STRATA_MODEL__API_KEY` -> `model.api_key`,
//! `STRATA_QUEUE__PER_SOURCE_CAP_FRACTION` -> `queue.per_source_cap_fraction`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use strata_config::StrataConfig;
//!
//! let config = StrataConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//!
//! if config.model.is_configured() {
//!     println!("Model endpoint: {}", config.model.base_url);
//! }
//! ```

mod database;
mod embedding;
mod error;
mod model;
mod queue;
mod synthesis;

pub use database::DatabaseConfig;
pub use embedding::EmbeddingConfig;
pub use error::ConfigError;
pub use model::{EMBEDDING_DIMENSIONS, EmbeddingBackend, ModelConfig};
pub use queue::{QueueConfig, validate_cap_fraction};
pub use synthesis::SynthesisConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

impl StrataConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load with an explicit project config file in place of
    /// `.strata/config.toml`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::figment_with_local(path)
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    pub fn figment() -> Figment {
        Self::figment_with_local(Path::new(".strata/config.toml"))
    }

    fn figment_with_local(local_path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("STRATA_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("strata").join("config.toml"))
    }

    /// Reject values the pipeline or queue cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()?;
        self.embedding.validate()?;
        self.synthesis.validate()?;
        self.queue.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_valid() {
        let config = StrataConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.model.is_configured());
        assert_eq!(config.database.path, ".strata/strata.db");
        assert_eq!(config.model.dimensions, 768);
        assert_eq!(config.embedding.batch_size, 50);
        assert_eq!(config.synthesis.max_age_days, 90);
        assert_eq!(config.synthesis.max_results, 5);
        assert_eq!(config.queue.ttl_days, 7);
        assert!((config.queue.per_source_cap_fraction - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn env_overrides_nested_fields() {
        Jail::expect_with(|jail| {
            jail.set_env("STRATA_MODEL__API_KEY", "secret");
            jail.set_env("STRATA_QUEUE__MAX_ITEMS", "8");
            jail.set_env("STRATA_SYNTHESIS__MIN_SIMILARITY", "0.55");
            let config: StrataConfig = StrataConfig::figment().extract()?;
            assert_eq!(config.model.api_key, "secret");
            assert_eq!(config.queue.max_items, 8);
            assert!((config.synthesis.min_similarity - 0.55).abs() < 1e-9);
            Ok(())
        });
    }

    #[test]
    fn project_toml_is_layered_under_env() {
        Jail::expect_with(|jail| {
            jail.create_dir(".strata")?;
            jail.create_file(
                ".strata/config.toml",
                r#"
                [queue]
                ttl_days = 3
                source_quota = 5

                [queue.weights]
                relevance = 2.0

                [model]
                embedding_backend = "local"
                "#,
            )?;
            jail.set_env("STRATA_QUEUE__TTL_DAYS", "4");
            let config: StrataConfig = StrataConfig::figment().extract()?;
            assert_eq!(config.queue.ttl_days, 4);
            assert_eq!(config.queue.source_quota, 5);
            assert!((config.queue.weights.relevance - 2.0).abs() < f64::EPSILON);
            assert!((config.queue.weights.synthesis - 1.0).abs() < f64::EPSILON);
            assert_eq!(config.model.embedding_backend, EmbeddingBackend::Local);
            Ok(())
        });
    }

    #[test]
    fn explicit_config_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata.toml");
        std::fs::write(&path, "[database]\npath = \":memory:\"\n").unwrap();
        let config = StrataConfig::load_from(&path).unwrap();
        assert!(config.database.is_in_memory());
    }

    #[test]
    fn similarity_out_of_range_rejected() {
        let mut config = StrataConfig::default();
        config.synthesis.min_similarity = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("synthesis.min_similarity"));
    }

    #[test]
    fn cap_fraction_bounds() {
        assert!(validate_cap_fraction(1.0).is_ok());
        assert!(validate_cap_fraction(0.2).is_ok());
        assert!(validate_cap_fraction(0.0).is_err());
        assert!(validate_cap_fraction(1.2).is_err());
        assert!(validate_cap_fraction(f64::NAN).is_err());
    }

    #[test]
    fn negative_weight_rejected() {
        let mut config = StrataConfig::default();
        config.queue.weights.uniqueness = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "queue.weights.uniqueness"));
    }

    #[test]
    fn local_backend_requires_768_dimensions() {
        let mut config = StrataConfig::default();
        config.model.embedding_backend = EmbeddingBackend::Local;
        config.model.dimensions = 384;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = StrataConfig::default();
        config.synthesis.scoring_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
