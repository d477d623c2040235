//! Developed synthesis repository. At most one row per candidate.

use std::collections::HashSet;

use chrono::Utc;
use strata_core::entities::{DevelopedSynthesis, SynthesisDraft};
use strata_core::ids::PREFIX_SYNTHESIS;

use crate::error::DatabaseError;
use crate::helpers::{format_instant, parse_datetime};
use crate::service::StrataService;

const SELECT_COLS: &str = "id, digest_id, candidate_id, headline, content, \
     historical_reference, core_thesis_alignment, created_at";

fn row_to_synthesis(row: &libsql::Row) -> Result<DevelopedSynthesis, DatabaseError> {
    Ok(DevelopedSynthesis {
        id: row.get(0)?,
        digest_id: row.get(1)?,
        candidate_id: row.get(2)?,
        headline: row.get(3)?,
        content: row.get(4)?,
        historical_reference: row.get(5)?,
        core_thesis_alignment: row.get(6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl StrataService {
    /// Store a developed synthesis.
    ///
    /// Returns `None` if the candidate already has one; the existing row is
    /// never replaced.
    pub async fn insert_synthesis(
        &self,
        digest_id: &str,
        candidate_id: &str,
        draft: &SynthesisDraft,
    ) -> Result<Option<DevelopedSynthesis>, DatabaseError> {
        let blank = draft.blank_fields();
        if !blank.is_empty() {
            return Err(DatabaseError::Validation(format!(
                "synthesis fields are blank: {}",
                blank.join(", ")
            )));
        }

        let id = self.db().generate_id(PREFIX_SYNTHESIS).await?;
        let now = Utc::now();
        let _write = self.db().write_guard().await;
        let affected = self
            .db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO developed_syntheses ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(candidate_id) DO NOTHING"
                ),
                libsql::params![
                    id.as_str(),
                    digest_id,
                    candidate_id,
                    draft.headline.as_str(),
                    draft.content.as_str(),
                    draft.historical_reference.as_str(),
                    draft.core_thesis_alignment.as_str(),
                    format_instant(&now)
                ],
            )
            .await?;

        if affected == 0 {
            return Ok(None);
        }

        Ok(Some(DevelopedSynthesis {
            id,
            digest_id: digest_id.to_string(),
            candidate_id: candidate_id.to_string(),
            headline: draft.headline.clone(),
            content: draft.content.clone(),
            historical_reference: draft.historical_reference.clone(),
            core_thesis_alignment: draft.core_thesis_alignment.clone(),
            created_at: now,
        }))
    }

    /// Candidate IDs of a digest that already have a synthesis.
    pub async fn developed_candidate_ids(
        &self,
        digest_id: &str,
    ) -> Result<HashSet<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT candidate_id FROM developed_syntheses WHERE digest_id = ?1",
                [digest_id],
            )
            .await?;
        let mut ids = HashSet::new();
        while let Some(row) = rows.next().await? {
            ids.insert(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    pub async fn list_syntheses(
        &self,
        digest_id: &str,
    ) -> Result<Vec<DevelopedSynthesis>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM developed_syntheses WHERE digest_id = ?1
                     ORDER BY created_at, id"
                ),
                [digest_id],
            )
            .await?;
        let mut syntheses = Vec::new();
        while let Some(row) = rows.next().await? {
            syntheses.push(row_to_synthesis(&row)?);
        }
        Ok(syntheses)
    }
}
