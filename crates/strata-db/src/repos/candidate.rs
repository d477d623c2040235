//! Synthesis candidate repository. Rows are written once and never updated.

use chrono::Utc;
use strata_core::entities::{NewCandidate, SynthesisCandidate};
use strata_core::ids::PREFIX_CANDIDATE;

use crate::error::DatabaseError;
use crate::helpers::{format_instant, get_score, parse_datetime, parse_enum};
use crate::service::StrataService;

const SELECT_COLS: &str = "id, digest_id, source_item_id, related_item_id, similarity, \
     synthesis_type, originality_score, relevance_score, reasoning, created_at";

fn row_to_candidate(row: &libsql::Row) -> Result<SynthesisCandidate, DatabaseError> {
    Ok(SynthesisCandidate {
        id: row.get(0)?,
        digest_id: row.get(1)?,
        source_item_id: row.get(2)?,
        related_item_id: row.get(3)?,
        similarity: row.get(4)?,
        synthesis_type: parse_enum(&row.get::<String>(5)?)?,
        originality_score: get_score(row, 6)?,
        relevance_score: get_score(row, 7)?,
        reasoning: row.get(8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl StrataService {
    /// Persist a scored candidate.
    ///
    /// Returns `None` when the `(digest, source, related)` pair already
    /// exists; the earlier row is kept unchanged.
    pub async fn insert_candidate(
        &self,
        candidate: &NewCandidate,
    ) -> Result<Option<SynthesisCandidate>, DatabaseError> {
        if candidate.source_item_id == candidate.related_item_id {
            return Err(DatabaseError::Validation(format!(
                "candidate pairs item {} with itself",
                candidate.source_item_id
            )));
        }
        if !(-1.0..=1.0).contains(&candidate.similarity) {
            return Err(DatabaseError::Validation(format!(
                "similarity {} is outside [-1, 1]",
                candidate.similarity
            )));
        }

        let id = self.db().generate_id(PREFIX_CANDIDATE).await?;
        let now = Utc::now();
        let _write = self.db().write_guard().await;
        let affected = self
            .db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO synthesis_candidates ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT(digest_id, source_item_id, related_item_id) DO NOTHING"
                ),
                libsql::params![
                    id.as_str(),
                    candidate.digest_id.as_str(),
                    candidate.source_item_id.as_str(),
                    candidate.related_item_id.as_str(),
                    candidate.similarity,
                    candidate.synthesis_type.as_str(),
                    i64::from(candidate.originality_score),
                    i64::from(candidate.relevance_score),
                    candidate.reasoning.as_str(),
                    format_instant(&now)
                ],
            )
            .await?;

        if affected == 0 {
            return Ok(None);
        }

        Ok(Some(SynthesisCandidate {
            id,
            digest_id: candidate.digest_id.clone(),
            source_item_id: candidate.source_item_id.clone(),
            related_item_id: candidate.related_item_id.clone(),
            similarity: candidate.similarity,
            synthesis_type: candidate.synthesis_type,
            originality_score: candidate.originality_score,
            relevance_score: candidate.relevance_score,
            reasoning: candidate.reasoning.clone(),
            created_at: now,
        }))
    }

    pub async fn get_candidate(&self, id: &str) -> Result<SynthesisCandidate, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM synthesis_candidates WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            entity_type: "candidate",
            id: id.to_string(),
        })?;
        row_to_candidate(&row)
    }

    /// All candidates of a digest, best combined score first.
    pub async fn list_candidates(
        &self,
        digest_id: &str,
    ) -> Result<Vec<SynthesisCandidate>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM synthesis_candidates WHERE digest_id = ?1
                     ORDER BY source_item_id, originality_score + relevance_score DESC,
                              similarity DESC, id"
                ),
                [digest_id],
            )
            .await?;

        let mut candidates = Vec::new();
        while let Some(row) = rows.next().await? {
            candidates.push(row_to_candidate(&row)?);
        }
        Ok(candidates)
    }

    /// Highest combined score any candidate of `item_id` reached, across digests.
    pub async fn best_candidate_score(&self, item_id: &str) -> Result<Option<u16>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT MAX(originality_score + relevance_score) FROM synthesis_candidates
                 WHERE source_item_id = ?1",
                [item_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        match row.get::<Option<i64>>(0)? {
            Some(raw) => u16::try_from(raw)
                .map(Some)
                .map_err(|_| DatabaseError::Query(format!("Score out of range: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, insert, test_service};
    use strata_core::enums::SynthesisType;

    async fn setup() -> (StrataService, String, String, String) {
        let svc = test_service().await;
        let digest = svc.get_or_create_digest(day(10)).await.unwrap();
        let source = insert(&svc, "Today", "s", 10).await;
        let related = insert(&svc, "Last month", "t", 1).await;
        (svc, digest.id, source.id, related.id)
    }

    fn candidate(digest: &str, source: &str, related: &str) -> NewCandidate {
        NewCandidate {
            digest_id: digest.to_string(),
            source_item_id: source.to_string(),
            related_item_id: related.to_string(),
            similarity: 0.81,
            synthesis_type: SynthesisType::Evolution,
            originality_score: 7,
            relevance_score: 8,
            reasoning: "same market, new regulator".into(),
        }
    }

    #[tokio::test]
    async fn insert_once_per_pair() {
        let (svc, digest, source, related) = setup().await;
        let first = svc
            .insert_candidate(&candidate(&digest, &source, &related))
            .await
            .unwrap()
            .unwrap();
        assert!(first.id.starts_with("cnd-"));
        assert_eq!(first.combined_score(), 15);

        let again = svc
            .insert_candidate(&candidate(&digest, &source, &related))
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(svc.list_candidates(&digest).await.unwrap().len(), 1);

        let fetched = svc.get_candidate(&first.id).await.unwrap();
        assert_eq!(fetched.synthesis_type, SynthesisType::Evolution);
        assert_eq!(svc.best_candidate_score(&source).await.unwrap(), Some(15));
        assert_eq!(svc.best_candidate_score(&related).await.unwrap(), None);
    }

    #[tokio::test]
    async fn self_pair_rejected() {
        let (svc, digest, source, _) = setup().await;
        let err = svc
            .insert_candidate(&candidate(&digest, &source, &source))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }
}
