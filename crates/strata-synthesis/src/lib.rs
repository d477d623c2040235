//! # strata-synthesis
//!
//! Cross-temporal synthesis for Strata.
//!
//! - [`embedding_store`]: builds embedding text, attaches vectors to items,
//!   backfills missing vectors in batches.
//! - [`index`]: cosine similarity and windowed nearest-neighbor search over
//!   stored embeddings.
//! - [`classify`]: pluggable relationship classification for candidate pairs.
//! - [`prompts`]: scoring and development prompts plus lenient response
//!   parsing.
//! - [`discovery`]: Phase 1, neighbor retrieval and model scoring with
//!   bounded concurrency.
//! - [`developer`]: Phase 2, one bounded-time development call per chosen
//!   candidate.
//! - [`orchestrator`]: sequences both phases under a time budget, emits
//!   [`ProgressEvent`]s and honors cancellation.
//!
//! All per-item failures are logged with `tracing::warn!` and counted in the
//! run report; only structural errors (bad options, unknown digest, storage
//! failures outside a single item) abort a run.

pub mod classify;
pub mod developer;
pub mod discovery;
pub mod embedding_store;
pub mod error;
pub mod index;
pub mod orchestrator;
pub mod progress;
pub mod prompts;

#[cfg(test)]
mod test_support;

pub use classify::{ClassificationPolicy, HeuristicClassifier, PairSignals};
pub use error::SynthesisError;
pub use orchestrator::{SynthesisOptions, SynthesisPipeline};
pub use progress::{CancelToken, ProgressEvent};
