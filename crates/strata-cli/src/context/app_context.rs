use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use strata_config::StrataConfig;
use strata_db::repos::queue::QueuePolicy;
use strata_db::service::StrataService;
use strata_model::{Embedder, ModelService};

/// Shared application resources initialized once at startup.
///
/// Model clients are built on first use so commands that only touch the
/// database run without an API key.
pub struct AppContext {
    pub service: StrataService,
    pub config: StrataConfig,
    models: Option<ModelService>,
}

impl AppContext {
    /// Open (and migrate) the configured database.
    pub async fn init(config: StrataConfig) -> anyhow::Result<Self> {
        let db_path = config.database.path.clone();
        if !config.database.is_in_memory() {
            ensure_parent_dir(Path::new(&db_path))?;
        }

        let service = StrataService::new_local(&db_path)
            .await
            .with_context(|| format!("failed to open database at {db_path}"))?;
        tracing::debug!(path = %db_path, "database ready");

        Ok(Self {
            service,
            config,
            models: None,
        })
    }

    /// Embedding and text-generation clients.
    pub fn models(&mut self) -> anyhow::Result<ModelService> {
        if let Some(models) = &self.models {
            return Ok(models.clone());
        }
        let models = ModelService::from_config(&self.config.model)?;
        self.models = Some(models.clone());
        Ok(models)
    }

    /// Only the embedder; the local backend needs no API key.
    pub fn embedder(&self) -> anyhow::Result<Arc<dyn Embedder>> {
        if let Some(models) = &self.models {
            return Ok(Arc::clone(&models.embedder));
        }
        Ok(strata_model::embedder_from_config(&self.config.model)?)
    }

    /// TTL and score weights for newly enqueued rows.
    #[must_use]
    pub fn queue_policy(&self) -> QueuePolicy {
        QueuePolicy {
            ttl: chrono::Duration::days(i64::from(self.config.queue.ttl_days)),
            weights: self.config.queue.weights,
        }
    }
}

fn ensure_parent_dir(db_path: &Path) -> anyhow::Result<()> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display())),
        _ => Ok(()),
    }
}
