//! Item repository: the dated text items and their embeddings.
//!
//! Items are written by ingestion (here: `insert_item` and JSONL import).
//! The only mutation Strata performs afterwards is attaching an embedding,
//! guarded by `embedding IS NULL`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use strata_core::entities::{EmbeddedItem, Item, NewItem};
use strata_core::ids::PREFIX_ITEM;

use crate::error::DatabaseError;
use crate::helpers::{
    encode_embedding, format_date, format_instant, get_count, get_embedding, get_opt_string,
    parse_date, parse_datetime, placeholders,
};
use crate::service::StrataService;

const SELECT_COLS: &str =
    "id, title, content, source_identifier, source_url, collected_at, newsletter_date, embedding";

fn row_to_item(row: &libsql::Row) -> Result<Item, DatabaseError> {
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        source_identifier: row.get(3)?,
        source_url: get_opt_string(row, 4)?,
        collected_at: parse_datetime(&row.get::<String>(5)?)?,
        newsletter_date: parse_date(&row.get::<String>(6)?)?,
        embedding: get_embedding(row, 7)?,
    })
}

/// Keyset position for walking items that still lack an embedding.
///
/// Ordering is `(collected_at, id)`, oldest first. Passing the cursor of the
/// last row seen skips every row up to and including it, so an item whose
/// embedding failed is not fetched again within the same backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCursor {
    pub collected_at: DateTime<Utc>,
    pub id: String,
}

impl ItemCursor {
    #[must_use]
    pub fn after(item: &Item) -> Self {
        Self {
            collected_at: item.collected_at,
            id: item.id.clone(),
        }
    }
}

impl StrataService {
    pub async fn insert_item(&self, item: &NewItem) -> Result<Item, DatabaseError> {
        if item.title.trim().is_empty() {
            return Err(DatabaseError::Validation("item title is blank".into()));
        }
        if item.source_identifier.trim().is_empty() {
            return Err(DatabaseError::Validation(
                "item source_identifier is blank".into(),
            ));
        }

        let id = self.db().generate_id(PREFIX_ITEM).await?;
        let embedding = item
            .embedding
            .as_deref()
            .map_or(libsql::Value::Null, |v| libsql::Value::Blob(encode_embedding(v)));
        let embedded_at = item
            .embedding
            .as_ref()
            .map(|_| format_instant(&Utc::now()));

        let _write = self.db().write_guard().await;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO items ({SELECT_COLS}, embedded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                libsql::params![
                    id.as_str(),
                    item.title.as_str(),
                    item.content.as_str(),
                    item.source_identifier.as_str(),
                    item.source_url.as_deref(),
                    format_instant(&item.collected_at),
                    format_date(item.newsletter_date),
                    embedding,
                    embedded_at
                ],
            )
            .await?;

        Ok(Item {
            id,
            title: item.title.clone(),
            content: item.content.clone(),
            source_identifier: item.source_identifier.clone(),
            source_url: item.source_url.clone(),
            collected_at: item.collected_at,
            newsletter_date: item.newsletter_date,
            embedding: item.embedding.clone(),
        })
    }

    pub async fn get_item(&self, id: &str) -> Result<Item, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM items WHERE id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            entity_type: "item",
            id: id.to_string(),
        })?;
        row_to_item(&row)
    }

    /// Items published under one day bucket, in collection order.
    pub async fn get_items_for_date(&self, date: NaiveDate) -> Result<Vec<Item>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM items WHERE newsletter_date = ?1
                     ORDER BY collected_at, id"
                ),
                [format_date(date)],
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_item(&row)?);
        }
        Ok(items)
    }

    /// Items for the given IDs, in the order requested. Unknown IDs are
    /// absent from the result.
    pub async fn get_items_by_ids(&self, ids: &[String]) -> Result<Vec<Item>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {SELECT_COLS} FROM items WHERE id IN ({})",
            placeholders(1, ids.len())
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(ids.iter().map(String::as_str)))
            .await?;

        let mut by_id = HashMap::new();
        while let Some(row) = rows.next().await? {
            let item = row_to_item(&row)?;
            by_id.insert(item.id.clone(), item);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Full content keyed by item ID.
    pub async fn get_item_content(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, String>, DatabaseError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT id, content FROM items WHERE id IN ({})",
            placeholders(1, ids.len())
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(ids.iter().map(String::as_str)))
            .await?;

        let mut content = HashMap::new();
        while let Some(row) = rows.next().await? {
            content.insert(row.get::<String>(0)?, row.get::<String>(1)?);
        }
        Ok(content)
    }

    /// Oldest items still lacking an embedding, strictly after `cursor`.
    pub async fn items_missing_embeddings(
        &self,
        cursor: Option<&ItemCursor>,
        limit: u32,
    ) -> Result<Vec<Item>, DatabaseError> {
        let mut rows = match cursor {
            Some(cursor) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM items
                             WHERE embedding IS NULL
                               AND (collected_at > ?1 OR (collected_at = ?1 AND id > ?2))
                             ORDER BY collected_at, id LIMIT {limit}"
                        ),
                        libsql::params![format_instant(&cursor.collected_at), cursor.id.as_str()],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM items WHERE embedding IS NULL
                             ORDER BY collected_at, id LIMIT {limit}"
                        ),
                        (),
                    )
                    .await?
            }
        };

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_item(&row)?);
        }
        Ok(items)
    }

    pub async fn count_missing_embeddings(&self) -> Result<u64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM items WHERE embedding IS NULL", ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }

    /// Attach an embedding to an item that has none.
    ///
    /// Returns `false` when the item already had an embedding (or does not
    /// exist); the stored vector is never overwritten.
    pub async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool, DatabaseError> {
        if embedding.is_empty() {
            return Err(DatabaseError::Validation("embedding is empty".into()));
        }
        let _write = self.db().write_guard().await;
        let affected = self
            .db()
            .conn()
            .execute(
                "UPDATE items SET embedding = ?1, embedded_at = ?2
                 WHERE id = ?3 AND embedding IS NULL",
                libsql::params![
                    libsql::Value::Blob(encode_embedding(embedding)),
                    format_instant(&Utc::now()),
                    id
                ],
            )
            .await?;
        Ok(affected == 1)
    }

    /// Embedded items collected in `[not_before, before)`, excluding one day
    /// bucket.
    pub async fn embedded_items_in_window(
        &self,
        not_before: DateTime<Utc>,
        before: DateTime<Utc>,
        exclude_date: NaiveDate,
    ) -> Result<Vec<EmbeddedItem>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, collected_at, newsletter_date, embedding FROM items
                 WHERE embedding IS NOT NULL
                   AND collected_at >= ?1 AND collected_at < ?2
                   AND newsletter_date <> ?3
                 ORDER BY collected_at, id",
                libsql::params![
                    format_instant(&not_before),
                    format_instant(&before),
                    format_date(exclude_date)
                ],
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            let Some(embedding) = get_embedding(&row, 3)? else {
                continue;
            };
            items.push(EmbeddedItem {
                id: row.get(0)?,
                collected_at: parse_datetime(&row.get::<String>(1)?)?,
                newsletter_date: parse_date(&row.get::<String>(2)?)?,
                embedding,
            });
        }
        Ok(items)
    }
}
