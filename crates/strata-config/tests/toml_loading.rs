//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use strata_config::{EmbeddingBackend, StrataConfig};

fn extract_from(file: &str) -> figment::Result<StrataConfig> {
    Figment::from(Serialized::defaults(StrataConfig::default()))
        .merge(Toml::file(file))
        .extract()
}

#[test]
fn loads_model_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[model]
api_key = "toml-key"
base_url = "http://localhost:8089"
generation_model = "gemini-2.5-flash"
embedding_backend = "local"
request_timeout_secs = 45
"#,
        )?;

        let config = extract_from("config.toml")?;

        assert_eq!(config.model.api_key, "toml-key");
        assert_eq!(config.model.base_url, "http://localhost:8089");
        assert_eq!(config.model.generation_model, "gemini-2.5-flash");
        assert_eq!(config.model.embedding_backend, EmbeddingBackend::Local);
        assert_eq!(config.model.request_timeout_secs, 45);
        assert_eq!(config.model.dimensions, 768);
        assert!(config.model.is_configured());
        Ok(())
    });
}

#[test]
fn loads_queue_config_with_weights_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[queue]
ttl_days = 3
max_items = 12
per_source_cap_fraction = 0.25
source_quota = 4

[queue.weights]
synthesis = 2.0
"#,
        )?;

        let config = extract_from("config.toml")?;

        assert_eq!(config.queue.ttl_days, 3);
        assert_eq!(config.queue.max_items, 12);
        assert!((config.queue.per_source_cap_fraction - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.queue.source_quota, 4);
        assert!((config.queue.weights.synthesis - 2.0).abs() < f64::EPSILON);
        assert!((config.queue.weights.relevance - 1.0).abs() < f64::EPSILON);
        assert!((config.queue.weights.uniqueness - 1.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn loads_synthesis_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[synthesis]
core_thesis = "Infrastructure outlives the news cycle."
min_similarity = 0.6
max_age_days = 30
max_results = 3
max_items_to_process = 4
scoring_concurrency = 2
run_budget_secs = 120
"#,
        )?;

        let config = extract_from("config.toml")?;

        assert_eq!(
            config.synthesis.core_thesis,
            "Infrastructure outlives the news cycle."
        );
        assert!((config.synthesis.min_similarity - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.synthesis.max_age_days, 30);
        assert_eq!(config.synthesis.max_results, 3);
        assert_eq!(config.synthesis.max_items_to_process, 4);
        assert_eq!(config.synthesis.scoring_concurrency, 2);
        assert_eq!(config.synthesis.run_budget_secs, 120);
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn loads_embedding_and_database_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = ":memory:"

[embedding]
batch_size = 10
max_batches = 2
delay_ms = 0
"#,
        )?;

        let config = extract_from("config.toml")?;

        assert!(config.database.is_in_memory());
        assert_eq!(config.embedding.batch_size, 10);
        assert_eq!(config.embedding.max_batches, 2);
        assert_eq!(config.embedding.delay_ms, 0);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[queue]
max_items = 12
"#,
        )?;
        jail.set_env("STRATA_QUEUE__MAX_ITEMS", "20");

        let config: StrataConfig = Figment::from(Serialized::defaults(StrataConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("STRATA_").split("__"))
            .extract()?;

        assert_eq!(config.queue.max_items, 20);
        Ok(())
    });
}

#[test]
fn out_of_range_cap_fraction_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[queue]
per_source_cap_fraction = 1.5
"#,
        )?;

        let config = extract_from("config.toml")?;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("per_source_cap_fraction"));
        Ok(())
    });
}

#[test]
fn partial_toml_keeps_other_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[embedding]
batch_size = 5
"#,
        )?;

        let config = extract_from("config.toml")?;

        assert_eq!(config.embedding.batch_size, 5);
        assert_eq!(config.queue.ttl_days, 7);
        assert_eq!(config.synthesis.max_results, 5);
        assert!(!config.model.is_configured());
        Ok(())
    });
}
