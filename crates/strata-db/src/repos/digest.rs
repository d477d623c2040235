//! Digest anchor: one row per day bucket.

use chrono::{NaiveDate, Utc};
use strata_core::entities::Digest;
use strata_core::ids::PREFIX_DIGEST;

use crate::error::DatabaseError;
use crate::helpers::{format_date, format_instant, parse_date, parse_datetime};
use crate::service::StrataService;

const SELECT_COLS: &str = "id, digest_date, created_at";

fn row_to_digest(row: &libsql::Row) -> Result<Digest, DatabaseError> {
    Ok(Digest {
        id: row.get(0)?,
        digest_date: parse_date(&row.get::<String>(1)?)?,
        created_at: parse_datetime(&row.get::<String>(2)?)?,
    })
}

impl StrataService {
    /// Return the digest for `date`, creating it if absent.
    pub async fn get_or_create_digest(&self, date: NaiveDate) -> Result<Digest, DatabaseError> {
        if let Some(existing) = self.get_digest_by_date(date).await? {
            return Ok(existing);
        }
        let id = self.db().generate_id(PREFIX_DIGEST).await?;
        let write = self.db().write_guard().await;
        self.db()
            .conn()
            .execute(
                "INSERT INTO digests (id, digest_date, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(digest_date) DO NOTHING",
                libsql::params![id.as_str(), format_date(date), format_instant(&Utc::now())],
            )
            .await?;
        drop(write);
        self.get_digest_by_date(date)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    pub async fn get_digest(&self, id: &str) -> Result<Digest, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM digests WHERE id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            entity_type: "digest",
            id: id.to_string(),
        })?;
        row_to_digest(&row)
    }

    pub async fn get_digest_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Digest>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM digests WHERE digest_date = ?1"),
                [format_date(date)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_digest(&row)?)),
            None => Ok(None),
        }
    }
}
