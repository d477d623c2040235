//! Embedding Store: attach one vector per item and backfill missing ones.
//!
//! Embedding text is `title + "\n\n" + content`, with content capped at
//! `embedding.content_char_limit` characters. Items whose text is shorter than
//! `embedding.min_text_chars` are skipped, not treated as failures.
//!
//! Writes are guarded by `embedding IS NULL`, so re-embedding an item that
//! already has a vector never overwrites it.

use std::time::Duration;

use strata_config::EmbeddingConfig;
use strata_core::entities::Item;
use strata_core::responses::BackfillReport;
use strata_core::text::truncate_chars;
use strata_db::repos::item::ItemCursor;
use strata_db::service::StrataService;
use strata_model::{Embedder, ensure_dimensions};

use crate::error::SynthesisError;

/// What `embed_and_store` did with one item.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedOutcome {
    /// A new vector was stored; it is returned for immediate use.
    Stored(Vec<f32>),
    /// The item already had a vector; nothing was written.
    AlreadyEmbedded,
    /// Too little text to embed.
    Skipped,
}

/// Text sent to the embedder, or `None` when it is shorter than
/// `min_text_chars`.
#[must_use]
pub fn embedding_text(item: &Item, config: &EmbeddingConfig) -> Option<String> {
    let title = item.title.trim();
    let content = truncate_chars(item.content.trim(), config.content_char_limit);
    let text = match (title.is_empty(), content.is_empty()) {
        (false, false) => format!("{title}\n\n{content}"),
        (false, true) => title.to_string(),
        (true, _) => content.to_string(),
    };
    (text.chars().count() >= config.min_text_chars).then_some(text)
}

/// Embed one item and persist the vector.
///
/// # Errors
///
/// Returns [`SynthesisError::Model`] if the embedding call fails or yields a
/// vector of the wrong length, [`SynthesisError::Database`] if the write fails.
pub async fn embed_and_store(
    service: &StrataService,
    embedder: &dyn Embedder,
    item: &Item,
    config: &EmbeddingConfig,
) -> Result<EmbedOutcome, SynthesisError> {
    if item.has_embedding() {
        return Ok(EmbedOutcome::AlreadyEmbedded);
    }
    let Some(text) = embedding_text(item, config) else {
        tracing::debug!(item_id = %item.id, "too little text to embed, skipping");
        return Ok(EmbedOutcome::Skipped);
    };

    let vector = embedder.embed(&text).await?;
    ensure_dimensions(&vector, embedder.dimensions())?;

    if service.set_embedding(&item.id, &vector).await? {
        tracing::debug!(item_id = %item.id, dims = vector.len(), "stored embedding");
        Ok(EmbedOutcome::Stored(vector))
    } else {
        Ok(EmbedOutcome::AlreadyEmbedded)
    }
}

/// Embed items lacking a vector, oldest first.
///
/// Fetches up to `max_batches` batches of `batch_size` items. Each item is
/// embedded and written on its own; a failure is logged, counted in
/// `errors`, and the run moves on. A keyset cursor keeps failed or skipped
/// items from being fetched again within the same run. `embedding.delay_ms`
/// is slept between items.
///
/// # Errors
///
/// Returns [`SynthesisError::Validation`] for a zero batch size or batch
/// count, or [`SynthesisError::Database`] if fetching a batch fails.
pub async fn backfill(
    service: &StrataService,
    embedder: &dyn Embedder,
    config: &EmbeddingConfig,
    batch_size: u32,
    max_batches: u32,
) -> Result<BackfillReport, SynthesisError> {
    if batch_size == 0 || max_batches == 0 {
        return Err(SynthesisError::Validation(
            "batch_size and max_batches must be positive".into(),
        ));
    }

    let delay = Duration::from_millis(config.delay_ms);
    let mut report = BackfillReport::default();
    let mut cursor: Option<ItemCursor> = None;

    for batch in 0..max_batches {
        let items = service
            .items_missing_embeddings(cursor.as_ref(), batch_size)
            .await?;
        if items.is_empty() {
            break;
        }
        tracing::info!(batch, size = items.len(), "embedding backfill batch");

        for item in &items {
            cursor = Some(ItemCursor::after(item));
            match embed_and_store(service, embedder, item, config).await {
                Ok(EmbedOutcome::Stored(_)) => report.processed += 1,
                Ok(EmbedOutcome::Skipped) => report.skipped += 1,
                Ok(EmbedOutcome::AlreadyEmbedded) => {}
                Err(error) => {
                    tracing::warn!(item_id = %item.id, %error, "embedding failed");
                    report.errors += 1;
                }
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if items.len() < batch_size as usize {
            break;
        }
    }

    report.remaining = service.count_missing_embeddings().await?;
    tracing::info!(
        processed = report.processed,
        skipped = report.skipped,
        errors = report.errors,
        remaining = report.remaining,
        "embedding backfill finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{KeywordEmbedder, insert, test_service};
    use pretty_assertions::assert_eq;

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            delay_ms: 0,
            ..EmbeddingConfig::default()
        }
    }

    #[test]
    fn text_joins_title_and_truncated_content() {
        let item = Item {
            id: "itm-1".into(),
            title: "Rail mania".into(),
            content: "x".repeat(5000),
            source_identifier: "a".into(),
            source_url: None,
            collected_at: crate::test_support::at(1, 8),
            newsletter_date: crate::test_support::day(1),
            embedding: None,
        };
        let cfg = EmbeddingConfig {
            content_char_limit: 20,
            ..config()
        };
        let text = embedding_text(&item, &cfg).unwrap();
        assert_eq!(text, format!("Rail mania\n\n{}", "x".repeat(20)));
    }

    #[test]
    fn near_empty_text_is_skipped() {
        let item = Item {
            id: "itm-1".into(),
            title: "Hi".into(),
            content: "  ".into(),
            source_identifier: "a".into(),
            source_url: None,
            collected_at: crate::test_support::at(1, 8),
            newsletter_date: crate::test_support::day(1),
            embedding: None,
        };
        assert_eq!(embedding_text(&item, &config()), None);
    }

    #[tokio::test]
    async fn embed_and_store_is_idempotent() {
        let svc = test_service().await;
        let embedder = KeywordEmbedder::new(vec![("rail", vec![1.0, 0.0, 0.0])]);
        let item = insert(&svc, "rail story", "rail networks grew", "a", 1, None).await;

        let first = embed_and_store(&svc, &embedder, &item, &config()).await.unwrap();
        assert_eq!(first, EmbedOutcome::Stored(vec![1.0, 0.0, 0.0]));

        // Stale copy without the vector: the guarded write changes nothing.
        let second = embed_and_store(&svc, &embedder, &item, &config()).await.unwrap();
        assert_eq!(second, EmbedOutcome::AlreadyEmbedded);

        let reloaded = svc.get_item(&item.id).await.unwrap();
        assert_eq!(
            embed_and_store(&svc, &embedder, &reloaded, &config()).await.unwrap(),
            EmbedOutcome::AlreadyEmbedded
        );
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn backfill_counts_errors_and_continues() {
        let svc = test_service().await;
        let embedder = KeywordEmbedder::new(vec![]).failing_on("broken");
        insert(&svc, "first item", "plenty of words here", "a", 1, None).await;
        insert(&svc, "broken item", "this one fails upstream", "a", 2, None).await;
        insert(&svc, "ok", "", "a", 3, None).await;
        insert(&svc, "third item", "also fine to embed", "b", 4, None).await;

        let report = backfill(&svc, &embedder, &config(), 2, 10).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn backfill_respects_max_batches() {
        let svc = test_service().await;
        let embedder = KeywordEmbedder::new(vec![]);
        for d in 1..=5 {
            insert(&svc, &format!("item number {d}"), "enough text", "a", d, None).await;
        }
        let report = backfill(&svc, &embedder, &config(), 2, 1).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.remaining, 3);
    }

    #[tokio::test]
    async fn zero_batch_size_rejected() {
        let svc = test_service().await;
        let embedder = KeywordEmbedder::new(vec![]);
        let err = backfill(&svc, &embedder, &config(), 0, 1).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Validation(_)));
    }
}
