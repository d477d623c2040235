//! Similarity Index: cosine similarity and windowed k-nearest-neighbor search.
//!
//! Vectors are stored as blobs in the item table and compared in process
//! with a brute-force scan. The search window is applied twice: once in SQL
//! to limit what is loaded, and again by [`SearchWindow::admits`] while
//! ranking, so a pool loaded for one window can never leak rows from another.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strata_config::SynthesisConfig;
use strata_core::entities::EmbeddedItem;
use strata_db::service::StrataService;

use crate::error::SynthesisError;

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// Accumulates in `f64`. Mismatched lengths, empty vectors and zero-norm
/// vectors yield `0.0`.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot = x.mul_add(y, dot);
        norm_a = x.mul_add(x, norm_a);
        norm_b = y.mul_add(y, norm_b);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Neighbor query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborQuery {
    /// Neighbors below this similarity are dropped.
    pub min_similarity: f64,
    /// History older than this many days before the source day is ignored.
    pub max_age_days: u32,
    pub max_results: usize,
}

impl Default for NeighborQuery {
    fn default() -> Self {
        Self::from(&SynthesisConfig::default())
    }
}

impl From<&SynthesisConfig> for NeighborQuery {
    fn from(config: &SynthesisConfig) -> Self {
        Self {
            min_similarity: config.min_similarity,
            max_age_days: config.max_age_days,
            max_results: config.max_results,
        }
    }
}

/// Time range neighbors must fall in.
///
/// For a source day `D`: collected in `[start(D) - max_age_days, start(D))`
/// and not in day bucket `D`. Everything is strictly older than the
/// source day, so a candidate can never come from the digest's own window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub exclude_date: NaiveDate,
    pub not_before: DateTime<Utc>,
    pub before: DateTime<Utc>,
}

impl SearchWindow {
    #[must_use]
    pub fn for_day(day: NaiveDate, max_age_days: u32) -> Self {
        let before = day.and_time(NaiveTime::MIN).and_utc();
        Self {
            exclude_date: day,
            not_before: before - Duration::days(i64::from(max_age_days)),
            before,
        }
    }

    #[must_use]
    pub fn admits(&self, item: &EmbeddedItem) -> bool {
        item.newsletter_date != self.exclude_date
            && item.collected_at >= self.not_before
            && item.collected_at < self.before
    }
}

/// One ranked neighbor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub item_id: String,
    pub collected_at: DateTime<Utc>,
    pub similarity: f64,
}

/// Rank `pool` against `query_vector`: window-admitted, not the source
/// itself, at or above `min_similarity`, highest similarity first (ties:
/// more recent first, then ID), at most `max_results`.
#[must_use]
pub fn rank_neighbors(
    source_id: &str,
    query_vector: &[f32],
    pool: &[EmbeddedItem],
    window: &SearchWindow,
    query: &NeighborQuery,
) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = pool
        .iter()
        .filter(|candidate| candidate.id != source_id && window.admits(candidate))
        .filter_map(|candidate| {
            let similarity = cosine_similarity(query_vector, &candidate.embedding);
            (similarity >= query.min_similarity).then(|| Neighbor {
                item_id: candidate.id.clone(),
                collected_at: candidate.collected_at,
                similarity,
            })
        })
        .collect();

    neighbors.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| b.collected_at.cmp(&a.collected_at))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    neighbors.truncate(query.max_results);
    neighbors
}

/// Load the embedded history a source day may draw neighbors from.
///
/// # Errors
///
/// Returns [`SynthesisError::Database`] if the query fails.
pub async fn load_pool(
    service: &StrataService,
    window: &SearchWindow,
) -> Result<Vec<EmbeddedItem>, SynthesisError> {
    let pool = service
        .embedded_items_in_window(window.not_before, window.before, window.exclude_date)
        .await?;
    tracing::debug!(
        pool = pool.len(),
        not_before = %window.not_before,
        before = %window.before,
        "loaded neighbor pool"
    );
    Ok(pool)
}

/// `find_candidates` for a single item: load its window and rank.
///
/// # Errors
///
/// Returns [`SynthesisError::Validation`] if `min_similarity` is outside
/// `[-1, 1]`, or [`SynthesisError::Database`] if loading fails.
pub async fn find_neighbors(
    service: &StrataService,
    source_id: &str,
    source_day: NaiveDate,
    query_vector: &[f32],
    query: &NeighborQuery,
) -> Result<Vec<Neighbor>, SynthesisError> {
    validate_query(query)?;
    let window = SearchWindow::for_day(source_day, query.max_age_days);
    let pool = load_pool(service, &window).await?;
    Ok(rank_neighbors(source_id, query_vector, &pool, &window, query))
}

pub(crate) fn validate_query(query: &NeighborQuery) -> Result<(), SynthesisError> {
    if !(-1.0..=1.0).contains(&query.min_similarity) {
        return Err(SynthesisError::Validation(format!(
            "min_similarity {} is outside [-1, 1]",
            query.min_similarity
        )));
    }
    Ok(())
}
