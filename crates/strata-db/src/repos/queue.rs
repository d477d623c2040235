//! Selection queue repository: enqueue, lifecycle transitions, aggregates.
//!
//! Transitions are conditional updates (`WHERE status = <required>`) run in
//! a transaction. When fewer rows change than IDs were requested, the
//! transaction is rolled back and the call fails with
//! `DatabaseError::StateConflict`. The write guard is held from `BEGIN` to
//! `COMMIT`/`ROLLBACK`, so a multi-ID transition is all-or-nothing even when
//! two callers race for the same rows.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use strata_core::entities::{NewQueueItem, QueueItem};
use strata_core::enums::QueueStatus;
use strata_core::ids::PREFIX_QUEUE_ITEM;
use strata_core::responses::{
    EnqueueReport, ExpireReport, QueueStats, SelectableItem, SourceDistribution,
};
use strata_core::scoring::ScoreWeights;
use strata_core::selection;
use strata_core::text::excerpt;
use tracing::{debug, warn};

use crate::error::DatabaseError;
use crate::helpers::{
    format_instant, get_count, get_opt_string, parse_datetime, parse_enum,
    parse_optional_datetime, placeholders,
};
use crate::service::StrataService;
use crate::updates::queue::ScoreUpdate;

const SELECT_COLS: &str = "id, source_daily_item_id, title, excerpt, content, source_identifier, \
     source_url, synthesis_score, relevance_score, uniqueness_score, total_score, status, \
     queued_at, expires_at, selected_at, used_in_post_id, skip_reason";

/// Characters kept when deriving an excerpt from item content.
pub const EXCERPT_CHARS: usize = 280;

fn row_to_queue_item(row: &libsql::Row) -> Result<QueueItem, DatabaseError> {
    Ok(QueueItem {
        id: row.get(0)?,
        source_daily_item_id: get_opt_string(row, 1)?,
        title: row.get(2)?,
        excerpt: row.get(3)?,
        content: row.get(4)?,
        source_identifier: row.get(5)?,
        source_url: get_opt_string(row, 6)?,
        synthesis_score: row.get(7)?,
        relevance_score: row.get(8)?,
        uniqueness_score: row.get(9)?,
        total_score: row.get(10)?,
        status: parse_enum(&row.get::<String>(11)?)?,
        queued_at: parse_datetime(&row.get::<String>(12)?)?,
        expires_at: parse_datetime(&row.get::<String>(13)?)?,
        selected_at: parse_optional_datetime(get_opt_string(row, 14)?.as_deref())?,
        used_in_post_id: get_opt_string(row, 15)?,
        skip_reason: get_opt_string(row, 16)?,
    })
}

/// How new rows are stamped: lifetime and score weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuePolicy {
    pub ttl: Duration,
    pub weights: ScoreWeights,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::days(7),
            weights: ScoreWeights::default(),
        }
    }
}

/// Hands out strictly increasing `queued_at` stamps within one enqueue
/// call, so rows queued together keep their input order on score ties.
pub(crate) struct QueueClock {
    next: DateTime<Utc>,
}

impl QueueClock {
    pub(crate) fn starting_now() -> Self {
        Self { next: Utc::now() }
    }

    /// Stored instants keep microseconds, so one microsecond apart stays
    /// distinct after a round trip.
    pub(crate) fn tick(&mut self) -> DateTime<Utc> {
        let at = self.next;
        self.next = at + Duration::microseconds(1);
        at
    }
}

/// Drop duplicate IDs, keeping first occurrence. Empty input is rejected.
fn distinct_ids(ids: &[String]) -> Result<Vec<String>, DatabaseError> {
    let mut seen = HashSet::new();
    let distinct: Vec<String> = ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    if distinct.is_empty() {
        return Err(DatabaseError::Validation("no queue item IDs given".into()));
    }
    Ok(distinct)
}

pub(crate) fn validate_priority(priority: Option<f64>) -> Result<(), DatabaseError> {
    match priority {
        Some(p) if !p.is_finite() => Err(DatabaseError::Validation(format!(
            "priority must be a finite number, got {p}"
        ))),
        _ => Ok(()),
    }
}

impl StrataService {
    /// Insert new `pending` rows with `expires_at = now + ttl`.
    ///
    /// `priority`, when given, replaces every row's `relevance_score` before
    /// `total_score` is derived. Rows failing validation are counted as
    /// errors and skipped; the rest are still inserted. Duplicates are not
    /// detected here.
    pub async fn enqueue(
        &self,
        rows: &[NewQueueItem],
        priority: Option<f64>,
        policy: &QueuePolicy,
    ) -> Result<EnqueueReport, DatabaseError> {
        validate_priority(priority)?;
        let mut clock = QueueClock::starting_now();
        let mut report = EnqueueReport::default();
        for (idx, row) in rows.iter().enumerate() {
            let label = format!("row {}", idx + 1);
            self.enqueue_row(row.clone(), &label, priority, clock.tick(), policy, &mut report)
                .await;
        }
        debug!(
            inserted = report.inserted,
            errors = report.errors,
            "enqueue finished"
        );
        Ok(report)
    }

    /// Enqueue items straight from the item repository.
    ///
    /// IDs already present in the queue (as `source_daily_item_id`) are
    /// skipped; unknown IDs are errors. The excerpt is cut from the item
    /// content and `synthesis_score` is the best candidate score the item
    /// reached in any digest (0 if none).
    pub async fn enqueue_from_repository(
        &self,
        item_ids: &[String],
        priority: Option<f64>,
        policy: &QueuePolicy,
    ) -> Result<EnqueueReport, DatabaseError> {
        validate_priority(priority)?;
        let ids = distinct_ids(item_ids)?;
        let queued = self.queued_source_item_ids(&ids).await?;
        let items = self.get_items_by_ids(&ids).await?;
        let mut clock = QueueClock::starting_now();
        let mut report = EnqueueReport::default();

        for id in &ids {
            if queued.contains(id) {
                report.skipped += 1;
                continue;
            }
            let Some(item) = items.iter().find(|item| &item.id == id) else {
                report.errors += 1;
                report.error_details.push(format!("{id}: item not found"));
                warn!(item_id = %id, "enqueue: item not found");
                continue;
            };
            let synthesis_score = self
                .best_candidate_score(id)
                .await?
                .map_or(0.0, f64::from);
            let row = NewQueueItem {
                source_daily_item_id: Some(item.id.clone()),
                title: item.title.clone(),
                excerpt: excerpt(&item.content, EXCERPT_CHARS),
                content: item.content.clone(),
                source_identifier: item.source_identifier.clone(),
                source_url: item.source_url.clone(),
                synthesis_score,
                relevance_score: 0.0,
                uniqueness_score: 0.0,
            };
            self.enqueue_row(row, id, priority, clock.tick(), policy, &mut report)
                .await;
        }
        Ok(report)
    }

    pub(crate) async fn enqueue_row(
        &self,
        mut row: NewQueueItem,
        label: &str,
        priority: Option<f64>,
        now: DateTime<Utc>,
        policy: &QueuePolicy,
        report: &mut EnqueueReport,
    ) {
        if let Some(priority) = priority {
            row.relevance_score = priority;
        }
        if let Some(reason) = row.rejection() {
            warn!(row = label, %reason, "enqueue: row rejected");
            report.errors += 1;
            report.error_details.push(format!("{label}: {reason}"));
            return;
        }
        match self.insert_queue_row(&row, now, policy).await {
            Ok(id) => {
                report.inserted += 1;
                report.inserted_ids.push(id);
            }
            Err(error) => {
                warn!(row = label, %error, "enqueue: insert failed");
                report.errors += 1;
                report.error_details.push(format!("{label}: {error}"));
            }
        }
    }

    async fn insert_queue_row(
        &self,
        row: &NewQueueItem,
        now: DateTime<Utc>,
        policy: &QueuePolicy,
    ) -> Result<String, DatabaseError> {
        let id = self.db().generate_id(PREFIX_QUEUE_ITEM).await?;
        let total = policy.weights.total(
            row.synthesis_score,
            row.relevance_score,
            row.uniqueness_score,
        );
        let _write = self.db().write_guard().await;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO queue_items ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                             NULL, NULL, NULL)"
                ),
                libsql::params![
                    id.as_str(),
                    row.source_daily_item_id.as_deref(),
                    row.title.as_str(),
                    row.excerpt.as_str(),
                    row.content.as_str(),
                    row.source_identifier.as_str(),
                    row.source_url.as_deref(),
                    row.synthesis_score,
                    row.relevance_score,
                    row.uniqueness_score,
                    total,
                    QueueStatus::Pending.as_str(),
                    format_instant(&now),
                    format_instant(&(now + policy.ttl))
                ],
            )
            .await?;
        Ok(id)
    }

    pub async fn get_queue_item(&self, id: &str) -> Result<QueueItem, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM queue_items WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            entity_type: "queue_item",
            id: id.to_string(),
        })?;
        row_to_queue_item(&row)
    }

    /// Queue rows in any of `statuses` (all rows when empty), highest total first.
    pub async fn list_queue_items(
        &self,
        statuses: &[QueueStatus],
    ) -> Result<Vec<QueueItem>, DatabaseError> {
        let mut rows = if statuses.is_empty() {
            self.db()
                .conn()
                .query(
                    &format!(
                        "SELECT {SELECT_COLS} FROM queue_items
                         ORDER BY total_score DESC, queued_at, id"
                    ),
                    (),
                )
                .await?
        } else {
            self.db()
                .conn()
                .query(
                    &format!(
                        "SELECT {SELECT_COLS} FROM queue_items WHERE status IN ({})
                         ORDER BY total_score DESC, queued_at, id",
                        placeholders(1, statuses.len())
                    ),
                    libsql::params_from_iter(statuses.iter().map(|s| s.as_str())),
                )
                .await?
        };

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_queue_item(&row)?);
        }
        Ok(items)
    }

    async fn queue_items_by_ids(&self, ids: &[String]) -> Result<Vec<QueueItem>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM queue_items WHERE id IN ({})",
                    placeholders(1, ids.len())
                ),
                libsql::params_from_iter(ids.iter().map(String::as_str)),
            )
            .await?;
        let mut found = Vec::new();
        while let Some(row) = rows.next().await? {
            found.push(row_to_queue_item(&row)?);
        }
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|item| &item.id == id).cloned())
            .collect())
    }

    /// Which of `item_ids` already have a queue row (any status).
    pub async fn queued_source_item_ids(
        &self,
        item_ids: &[String],
    ) -> Result<HashSet<String>, DatabaseError> {
        if item_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT DISTINCT source_daily_item_id FROM queue_items
                     WHERE source_daily_item_id IN ({})",
                    placeholders(1, item_ids.len())
                ),
                libsql::params_from_iter(item_ids.iter().map(String::as_str)),
            )
            .await?;
        let mut queued = HashSet::new();
        while let Some(row) = rows.next().await? {
            queued.insert(row.get::<String>(0)?);
        }
        Ok(queued)
    }

    pub async fn queue_stats(&self) -> Result<QueueStats, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT status, COUNT(*) FROM queue_items GROUP BY status",
                (),
            )
            .await?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next().await? {
            let status: QueueStatus = parse_enum(&row.get::<String>(0)?)?;
            counts.push((status, get_count(&row, 1)?));
        }
        Ok(QueueStats::from_counts(counts))
    }

    pub async fn source_distribution(&self) -> Result<Vec<SourceDistribution>, DatabaseError> {
        let items = self.list_queue_items(&[]).await?;
        Ok(selection::source_distribution(&items))
    }

    /// Pending rows annotated with their source's committed count.
    pub async fn selectable_items(
        &self,
        source_quota: u64,
    ) -> Result<Vec<SelectableItem>, DatabaseError> {
        let items = self
            .list_queue_items(&[QueueStatus::Pending, QueueStatus::Selected, QueueStatus::Used])
            .await?;
        Ok(selection::selectable_items(&items, source_quota))
    }

    /// Preview a diversity-capped top-k over pending rows. Read-only: the
    /// result still has to be committed with [`Self::select_for_article`].
    pub async fn balanced_selection(
        &self,
        max_items: usize,
        cap_fraction: f64,
    ) -> Result<Vec<QueueItem>, DatabaseError> {
        if !(cap_fraction > 0.0 && cap_fraction <= 1.0) {
            return Err(DatabaseError::Validation(format!(
                "per-source cap fraction {cap_fraction} is outside (0, 1]"
            )));
        }
        let pending = self.list_queue_items(&[QueueStatus::Pending]).await?;
        Ok(selection::balanced_selection(&pending, max_items, cap_fraction))
    }

    /// `pending -> selected` for every ID, or for none.
    pub async fn select_for_article(
        &self,
        item_ids: &[String],
    ) -> Result<Vec<QueueItem>, DatabaseError> {
        let ids = distinct_ids(item_ids)?;
        let now = format_instant(&Utc::now());
        self.transition_queue_items(
            &ids,
            QueueStatus::Pending,
            QueueStatus::Selected,
            &[("selected_at", now.into())],
        )
        .await?;
        self.queue_items_by_ids(&ids).await
    }

    /// `selected -> used` for every ID, recording the post they went into.
    pub async fn mark_used(&self, item_ids: &[String], post_id: &str) -> Result<(), DatabaseError> {
        if post_id.trim().is_empty() {
            return Err(DatabaseError::Validation("post ID is blank".into()));
        }
        let ids = distinct_ids(item_ids)?;
        self.transition_queue_items(
            &ids,
            QueueStatus::Selected,
            QueueStatus::Used,
            &[("used_in_post_id", post_id.into())],
        )
        .await
    }

    /// `pending -> skipped` for every ID, recording the curator's reason.
    pub async fn skip(&self, item_ids: &[String], reason: &str) -> Result<(), DatabaseError> {
        if reason.trim().is_empty() {
            return Err(DatabaseError::Validation("skip reason is blank".into()));
        }
        let ids = distinct_ids(item_ids)?;
        self.transition_queue_items(
            &ids,
            QueueStatus::Pending,
            QueueStatus::Skipped,
            &[("skip_reason", reason.into())],
        )
        .await
    }

    /// Retire pending rows whose `expires_at` is before `now`. Idempotent.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<ExpireReport, DatabaseError> {
        let _write = self.db().write_guard().await;
        let expired_count = self
            .db()
            .conn()
            .execute(
                "UPDATE queue_items SET status = ?1 WHERE status = ?2 AND expires_at < ?3",
                libsql::params![
                    QueueStatus::Expired.as_str(),
                    QueueStatus::Pending.as_str(),
                    format_instant(&now)
                ],
            )
            .await?;
        debug!(expired_count, "expired stale queue items");
        Ok(ExpireReport { expired_count })
    }

    /// Overwrite some of a row's scores and recompute `total_score`.
    pub async fn update_scores(
        &self,
        id: &str,
        update: ScoreUpdate,
        weights: &ScoreWeights,
    ) -> Result<QueueItem, DatabaseError> {
        let current = self.get_queue_item(id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let synthesis = update.synthesis_score.unwrap_or(current.synthesis_score);
        let relevance = update.relevance_score.unwrap_or(current.relevance_score);
        let uniqueness = update.uniqueness_score.unwrap_or(current.uniqueness_score);
        if ![synthesis, relevance, uniqueness].iter().all(|s| s.is_finite()) {
            return Err(DatabaseError::Validation("scores must be finite".into()));
        }
        let total = weights.total(synthesis, relevance, uniqueness);

        let _write = self.db().write_guard().await;
        self.db()
            .conn()
            .execute(
                "UPDATE queue_items
                 SET synthesis_score = ?1, relevance_score = ?2, uniqueness_score = ?3,
                     total_score = ?4
                 WHERE id = ?5",
                libsql::params![synthesis, relevance, uniqueness, total, id],
            )
            .await?;

        Ok(QueueItem {
            synthesis_score: synthesis,
            relevance_score: relevance,
            uniqueness_score: uniqueness,
            total_score: total,
            ..current
        })
    }

    async fn transition_queue_items(
        &self,
        ids: &[String],
        from: QueueStatus,
        to: QueueStatus,
        extra: &[(&str, libsql::Value)],
    ) -> Result<(), DatabaseError> {
        if !from.can_transition_to(to) {
            return Err(DatabaseError::InvalidState(format!(
                "queue items cannot move from {from} to {to}"
            )));
        }

        let mut params: Vec<libsql::Value> = vec![to.as_str().into()];
        let mut sets = vec!["status = ?1".to_string()];
        for (column, value) in extra {
            params.push(value.clone());
            sets.push(format!("{column} = ?{}", params.len()));
        }
        params.push(from.as_str().into());
        let status_idx = params.len();
        let sql = format!(
            "UPDATE queue_items SET {} WHERE status = ?{status_idx} AND id IN ({})",
            sets.join(", "),
            placeholders(status_idx + 1, ids.len())
        );
        params.extend(ids.iter().map(|id| libsql::Value::from(id.clone())));

        let write = self.db().write_guard().await;
        let tx = self.db().conn().transaction().await?;
        let affected = match tx.execute(&sql, libsql::params_from_iter(params)).await {
            Ok(affected) => affected,
            Err(error) => {
                tx.rollback().await?;
                return Err(error.into());
            }
        };
        let requested = ids.len();
        if usize::try_from(affected).ok() != Some(requested) {
            tx.rollback().await?;
            drop(write);
            let offending = self.describe_offending(ids, from).await?;
            warn!(%from, %to, requested, affected, "queue transition rejected");
            return Err(DatabaseError::StateConflict {
                entity_type: "queue_item",
                expected: from.as_str().to_string(),
                requested,
                affected,
                offending,
            });
        }
        tx.commit().await?;
        drop(write);
        debug!(%from, %to, count = requested, "queue items transitioned");
        Ok(())
    }

    /// `"<id> (<status>)"` for each ID not currently in `expected`.
    async fn describe_offending(
        &self,
        ids: &[String],
        expected: QueueStatus,
    ) -> Result<Vec<String>, DatabaseError> {
        let current = self.queue_items_by_ids(ids).await?;
        Ok(ids
            .iter()
            .filter_map(|id| match current.iter().find(|item| &item.id == id) {
                None => Some(format!("{id} (missing)")),
                Some(item) if item.status != expected => Some(format!("{id} ({})", item.status)),
                Some(_) => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert, queue_row, test_service, week, weights};
    use crate::updates::queue::ScoreUpdateBuilder;
    use pretty_assertions::assert_eq;

    fn policy() -> QueuePolicy {
        QueuePolicy {
            ttl: week(),
            weights: weights(),
        }
    }

    async fn enqueue_ids(svc: &StrataService, rows: &[NewQueueItem]) -> Vec<String> {
        svc.enqueue(rows, None, &policy()).await.unwrap().inserted_ids
    }

    #[tokio::test]
    async fn enqueue_sets_pending_ttl_and_total() {
        let svc = test_service().await;
        let mut row = queue_row("Chip exports", "stratechery", 7.0);
        row.relevance_score = 8.0;
        let report = svc.enqueue(&[row], None, &policy()).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors, 0);

        let item = svc.get_queue_item(&report.inserted_ids[0]).await.unwrap();
        assert!(item.id.starts_with("que-"));
        assert_eq!(item.status, QueueStatus::Pending);
        assert!((item.total_score - 15.0).abs() < f64::EPSILON);
        assert_eq!(item.expires_at - item.queued_at, week());
    }

    #[tokio::test]
    async fn enqueue_counts_invalid_rows_as_errors() {
        let svc = test_service().await;
        let rows = vec![
            queue_row("ok", "a", 1.0),
            queue_row("", "a", 1.0),
            queue_row("nan", "a", f64::NAN),
        ];
        let report = svc.enqueue(&rows, None, &policy()).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors, 2);
        assert_eq!(report.error_details.len(), 2);
        assert!(report.error_details[0].starts_with("row 2"));
    }

    #[tokio::test]
    async fn priority_overrides_relevance() {
        let svc = test_service().await;
        let ids = svc
            .enqueue(&[queue_row("p", "a", 2.0)], Some(9.0), &policy())
            .await
            .unwrap()
            .inserted_ids;
        let item = svc.get_queue_item(&ids[0]).await.unwrap();
        assert!((item.relevance_score - 9.0).abs() < f64::EPSILON);
        assert!((item.total_score - 11.0).abs() < f64::EPSILON);

        let err = svc
            .enqueue(&[queue_row("p", "a", 2.0)], Some(f64::INFINITY), &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn enqueue_from_repository_skips_queued_and_missing() {
        let svc = test_service().await;
        let item = insert(&svc, "Ports and tariffs", "ft", 3).await;
        let ids = vec![item.id.clone(), "itm-missing0".to_string()];

        let first = svc
            .enqueue_from_repository(&ids, None, &policy())
            .await
            .unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(first.errors, 1);

        let queued = svc.get_queue_item(&first.inserted_ids[0]).await.unwrap();
        assert_eq!(queued.source_daily_item_id.as_deref(), Some(item.id.as_str()));
        assert!(!queued.excerpt.is_empty());

        let second = svc
            .enqueue_from_repository(&ids[..1], None, &policy())
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn select_moves_pending_to_selected() {
        let svc = test_service().await;
        let ids = enqueue_ids(&svc, &[queue_row("a", "s", 1.0), queue_row("b", "s", 2.0)]).await;

        let selected = svc.select_for_article(&ids).await.unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|item| item.status == QueueStatus::Selected));
        assert!(selected.iter().all(|item| item.selected_at.is_some()));
    }

    #[tokio::test]
    async fn select_is_all_or_nothing() {
        let svc = test_service().await;
        let ids = enqueue_ids(&svc, &[queue_row("a", "s", 1.0), queue_row("b", "s", 2.0)]).await;
        svc.select_for_article(&ids[..1]).await.unwrap();
        svc.mark_used(&ids[..1], "post-1").await.unwrap();

        let err = svc.select_for_article(&ids).await.unwrap_err();
        assert_eq!(err.kind(), strata_core::errors::ErrorKind::StateConflict);
        match err {
            DatabaseError::StateConflict {
                requested,
                affected,
                offending,
                ..
            } => {
                assert_eq!(requested, 2);
                assert_eq!(affected, 1);
                assert_eq!(offending, vec![format!("{} (used)", ids[0])]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let untouched = svc.get_queue_item(&ids[1]).await.unwrap();
        assert_eq!(untouched.status, QueueStatus::Pending);
        assert!(untouched.selected_at.is_none());
    }

    #[tokio::test]
    async fn unknown_id_conflicts() {
        let svc = test_service().await;
        let ids = enqueue_ids(&svc, &[queue_row("a", "s", 1.0)]).await;
        let requested = vec![ids[0].clone(), "que-00000000".to_string()];
        let err = svc.select_for_article(&requested).await.unwrap_err();
        assert!(err.to_string().contains("que-00000000 (missing)"));
        assert_eq!(
            svc.get_queue_item(&ids[0]).await.unwrap().status,
            QueueStatus::Pending
        );
    }

    #[tokio::test]
    async fn mark_used_requires_selected() {
        let svc = test_service().await;
        let ids = enqueue_ids(&svc, &[queue_row("a", "s", 1.0)]).await;
        let err = svc.mark_used(&ids, "post-1").await.unwrap_err();
        assert!(matches!(err, DatabaseError::StateConflict { .. }));

        svc.select_for_article(&ids).await.unwrap();
        svc.mark_used(&ids, "post-1").await.unwrap();
        let item = svc.get_queue_item(&ids[0]).await.unwrap();
        assert_eq!(item.status, QueueStatus::Used);
        assert_eq!(item.used_in_post_id.as_deref(), Some("post-1"));

        let again = svc.select_for_article(&ids).await.unwrap_err();
        assert!(matches!(again, DatabaseError::StateConflict { .. }));
    }

    #[tokio::test]
    async fn skip_records_reason_and_rejects_non_pending() {
        let svc = test_service().await;
        let ids = enqueue_ids(&svc, &[queue_row("a", "s", 1.0), queue_row("b", "s", 1.0)]).await;
        svc.skip(&ids[..1], "off-topic").await.unwrap();
        let skipped = svc.get_queue_item(&ids[0]).await.unwrap();
        assert_eq!(skipped.status, QueueStatus::Skipped);
        assert_eq!(skipped.skip_reason.as_deref(), Some("off-topic"));

        let err = svc.skip(&ids, "again").await.unwrap_err();
        assert!(matches!(err, DatabaseError::StateConflict { .. }));
        assert_eq!(
            svc.get_queue_item(&ids[1]).await.unwrap().status,
            QueueStatus::Pending
        );

        assert!(matches!(
            svc.skip(&ids[1..], " ").await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn empty_id_list_is_validation_error() {
        let svc = test_service().await;
        assert!(matches!(
            svc.select_for_article(&[]).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn expire_stale_is_idempotent() {
        let svc = test_service().await;
        let ids = enqueue_ids(
            &svc,
            &[queue_row("a", "s", 1.0), queue_row("b", "s", 1.0), queue_row("c", "s", 1.0)],
        )
        .await;
        svc.select_for_article(&ids[2..]).await.unwrap();

        let later = Utc::now() + week() + Duration::hours(1);
        assert_eq!(svc.expire_stale(later).await.unwrap().expired_count, 2);
        assert_eq!(svc.expire_stale(later).await.unwrap().expired_count, 0);

        assert_eq!(
            svc.get_queue_item(&ids[2]).await.unwrap().status,
            QueueStatus::Selected
        );
        let stats = svc.queue_stats().await.unwrap();
        assert_eq!(stats.expired, 2);
        assert_eq!(stats.selected, 1);
        assert_eq!(stats.total, 3);
    }

    #[tokio::test]
    async fn expire_leaves_fresh_items() {
        let svc = test_service().await;
        enqueue_ids(&svc, &[queue_row("a", "s", 1.0)]).await;
        assert_eq!(svc.expire_stale(Utc::now()).await.unwrap().expired_count, 0);
    }

    #[tokio::test]
    async fn balanced_selection_is_read_only_and_capped() {
        let svc = test_service().await;
        enqueue_ids(
            &svc,
            &[
                queue_row("A20", "A", 20.0),
                queue_row("A18", "A", 18.0),
                queue_row("B15", "B", 15.0),
            ],
        )
        .await;

        let picked = svc.balanced_selection(2, 0.5).await.unwrap();
        let titles: Vec<_> = picked.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["A20", "B15"]);
        assert_eq!(svc.queue_stats().await.unwrap().pending, 3);

        assert!(matches!(
            svc.balanced_selection(2, 0.0).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn distribution_and_selectable() {
        let svc = test_service().await;
        let ids = enqueue_ids(
            &svc,
            &[
                queue_row("a1", "A", 3.0),
                queue_row("a2", "A", 2.0),
                queue_row("b1", "B", 1.0),
            ],
        )
        .await;
        svc.select_for_article(&ids[..1]).await.unwrap();

        let distribution = svc.source_distribution().await.unwrap();
        assert_eq!(distribution[0].source_identifier, "A");
        assert_eq!(distribution[0].selected_count, 1);
        assert_eq!(distribution[0].pending_count, 1);

        let selectable = svc.selectable_items(1).await.unwrap();
        assert_eq!(selectable.len(), 2);
        let a2 = selectable.iter().find(|s| s.item.title == "a2").unwrap();
        assert_eq!(a2.source_committed_count, 1);
        assert!(!a2.within_source_limit);
        let b1 = selectable.iter().find(|s| s.item.title == "b1").unwrap();
        assert!(b1.within_source_limit);
    }

    #[tokio::test]
    async fn update_scores_recomputes_total() {
        let svc = test_service().await;
        let ids = enqueue_ids(&svc, &[queue_row("a", "s", 4.0)]).await;
        let weights = ScoreWeights {
            synthesis: 1.0,
            relevance: 2.0,
            uniqueness: 0.5,
        };
        let update = ScoreUpdateBuilder::new().relevance(3.0).uniqueness(2.0).build();
        let updated = svc.update_scores(&ids[0], update, &weights).await.unwrap();
        assert!((updated.total_score - 11.0).abs() < f64::EPSILON);

        let stored = svc.get_queue_item(&ids[0]).await.unwrap();
        assert!((stored.total_score - 11.0).abs() < f64::EPSILON);
        assert!((stored.synthesis_score - 4.0).abs() < f64::EPSILON);

        let err = svc
            .update_scores("que-00000000", ScoreUpdate::default(), &weights)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
