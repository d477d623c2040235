//! Pipeline Orchestrator: Phase 1 → Phase 2 under a time budget.
//!
//! ```text
//! discovering ⇄ scoring → developing → complete
//!                                    → failed
//! ```
//!
//! A run only fails for structural problems: invalid options, an unknown
//! digest, or storage errors while loading what the run works on. Per-item
//! and per-candidate failures are logged, counted in
//! [`SynthesisRunReport::errors`], and the run moves on. Cancellation and
//! the deadline are checked between items and between candidate batches;
//! a run stopped there finishes as [`RunOutcome::Partial`] and keeps every
//! row it already wrote.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_config::{EmbeddingConfig, StrataConfig, SynthesisConfig};
use strata_core::entities::DevelopedSynthesis;
use strata_core::enums::{RunOutcome, StopReason};
use strata_core::responses::SynthesisRunReport;
use strata_db::service::StrataService;
use strata_model::ModelService;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::classify::{ClassificationPolicy, HeuristicClassifier};
use crate::error::SynthesisError;
use crate::index::{NeighborQuery, validate_query};
use crate::progress::{CancelToken, ProgressEvent, RunControl, spawn_heartbeat};

/// Per-run limits. Defaults come from `[synthesis]` configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    /// Phase 1 never visits more of today's items than this.
    pub max_items_to_process: usize,
    /// Candidates scored per item, at most.
    pub max_candidates_per_item: usize,
    pub min_similarity: f64,
    pub max_age_days: u32,
    /// Neighbors retrieved per item before the candidate cap applies.
    pub max_results: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self::from(&SynthesisConfig::default())
    }
}

impl From<&SynthesisConfig> for SynthesisOptions {
    fn from(config: &SynthesisConfig) -> Self {
        Self {
            max_items_to_process: config.max_items_to_process,
            max_candidates_per_item: config.max_candidates_per_item,
            min_similarity: config.min_similarity,
            max_age_days: config.max_age_days,
            max_results: config.max_results,
        }
    }
}

impl SynthesisOptions {
    /// # Errors
    ///
    /// Returns [`SynthesisError::Validation`] for zero limits or a similarity
    /// threshold outside `[-1, 1]`.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.max_items_to_process == 0 {
            return Err(SynthesisError::Validation(
                "max_items_to_process must be positive".into(),
            ));
        }
        if self.max_candidates_per_item == 0 {
            return Err(SynthesisError::Validation(
                "max_candidates_per_item must be positive".into(),
            ));
        }
        validate_query(&self.neighbor_query())
    }

    #[must_use]
    pub const fn neighbor_query(&self) -> NeighborQuery {
        NeighborQuery {
            min_similarity: self.min_similarity,
            max_age_days: self.max_age_days,
            max_results: self.max_results,
        }
    }
}

/// Counters accumulated while a run progresses.
#[derive(Debug, Default)]
pub(crate) struct RunTally {
    pub processed: u32,
    pub candidates_created: u32,
    pub syntheses_developed: u32,
    pub already_developed: u32,
    pub errors: u32,
    pub stop: Option<StopReason>,
}

impl RunTally {
    fn into_report(self, digest_id: String, elapsed: Duration) -> SynthesisRunReport {
        SynthesisRunReport {
            digest_id,
            outcome: if self.stop.is_some() {
                RunOutcome::Partial
            } else {
                RunOutcome::Complete
            },
            stop_reason: self.stop,
            processed: self.processed,
            candidates_created: self.candidates_created,
            syntheses_developed: self.syntheses_developed,
            already_developed: self.already_developed,
            errors: self.errors,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Everything a synthesis run needs, injected once.
pub struct SynthesisPipeline<'a> {
    pub(crate) service: &'a StrataService,
    pub(crate) models: &'a ModelService,
    pub(crate) synthesis: &'a SynthesisConfig,
    pub(crate) embedding: &'a EmbeddingConfig,
    pub(crate) classifier: Arc<dyn ClassificationPolicy>,
}

impl<'a> SynthesisPipeline<'a> {
    #[must_use]
    pub fn new(service: &'a StrataService, models: &'a ModelService, config: &'a StrataConfig) -> Self {
        Self::with_configs(service, models, &config.synthesis, &config.embedding)
    }

    #[must_use]
    pub fn with_configs(
        service: &'a StrataService,
        models: &'a ModelService,
        synthesis: &'a SynthesisConfig,
        embedding: &'a EmbeddingConfig,
    ) -> Self {
        Self {
            service,
            models,
            synthesis,
            embedding,
            classifier: Arc::new(HeuristicClassifier),
        }
    }

    /// Replace the default [`HeuristicClassifier`].
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ClassificationPolicy>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Run both phases for a digest.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Validation`] for bad options,
    /// [`SynthesisError::Database`] (`not_found`) for an unknown digest, or a
    /// storage error that prevents the run from loading its inputs.
    pub async fn run_synthesis(
        &self,
        digest_id: &str,
        options: &SynthesisOptions,
    ) -> Result<SynthesisRunReport, SynthesisError> {
        self.run_synthesis_cancellable(digest_id, options, CancelToken::new())
            .await
    }

    /// [`Self::run_synthesis`] with an external stop flag.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run_synthesis`].
    pub async fn run_synthesis_cancellable(
        &self,
        digest_id: &str,
        options: &SynthesisOptions,
        cancel: CancelToken,
    ) -> Result<SynthesisRunReport, SynthesisError> {
        let control = RunControl::new(cancel, self.deadline(), None);
        self.run(digest_id, options, &control).await
    }

    /// Streaming variant: progress, heartbeats and a terminal `complete` or
    /// `error` event go to `events`. Dropping the receiver cancels the run
    /// at its next checkpoint.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run_synthesis`]; the error is also sent as
    /// [`ProgressEvent::Error`].
    pub async fn run_with_progress(
        &self,
        digest_id: &str,
        options: &SynthesisOptions,
        events: mpsc::Sender<ProgressEvent>,
        cancel: CancelToken,
    ) -> Result<SynthesisRunReport, SynthesisError> {
        let interval = Duration::from_secs(self.synthesis.heartbeat_interval_secs.max(1));
        let heartbeat = spawn_heartbeat(events.clone(), interval);
        let control = RunControl::new(cancel, self.deadline(), Some(events.clone()));

        let result = self.run(digest_id, options, &control).await;
        heartbeat.abort();

        let terminal = match &result {
            Ok(report) => ProgressEvent::Complete {
                report: report.clone(),
            },
            Err(error) => ProgressEvent::Error {
                kind: error.kind(),
                message: error.to_string(),
            },
        };
        // The consumer may already be gone; the result is returned either way.
        let _ = events.send(terminal).await;
        result
    }

    /// Developed syntheses of a digest.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Database`] (`not_found`) for an unknown digest.
    pub async fn get_syntheses(
        &self,
        digest_id: &str,
    ) -> Result<Vec<DevelopedSynthesis>, SynthesisError> {
        let digest = self.service.get_digest(digest_id).await?;
        Ok(self.service.list_syntheses(&digest.id).await?)
    }

    fn deadline(&self) -> Instant {
        Instant::now() + Duration::from_secs(self.synthesis.run_budget_secs)
    }

    async fn run(
        &self,
        digest_id: &str,
        options: &SynthesisOptions,
        control: &RunControl,
    ) -> Result<SynthesisRunReport, SynthesisError> {
        if digest_id.trim().is_empty() {
            return Err(SynthesisError::Validation("digest_id is required".into()));
        }
        options.validate()?;

        let started = Instant::now();
        let digest = self.service.get_digest(digest_id).await?;
        let mut items = self.service.get_items_for_date(digest.digest_date).await?;
        items.truncate(options.max_items_to_process);
        tracing::info!(
            digest_id = %digest.id,
            date = %digest.digest_date,
            items = items.len(),
            "synthesis run started"
        );

        let mut tally = RunTally::default();
        self.discover(&digest, &items, options, control, &mut tally)
            .await?;
        if tally.stop.is_none() {
            self.develop_best(&digest, control, &mut tally).await?;
        }

        let report = tally.into_report(digest.id, started.elapsed());
        tracing::info!(
            digest_id = %report.digest_id,
            outcome = ?report.outcome,
            stop_reason = ?report.stop_reason,
            processed = report.processed,
            candidates = report.candidates_created,
            developed = report.syntheses_developed,
            errors = report.errors,
            elapsed_ms = report.elapsed_ms,
            "synthesis run finished"
        );
        Ok(report)
    }
}
