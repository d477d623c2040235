use serde::Serialize;
use strata_core::entities::SynthesisCandidate;
use strata_core::enums::SynthesisType;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Flat candidate row with its combined score spelled out.
#[derive(Debug, Serialize)]
struct CandidateRow {
    id: String,
    source_item_id: String,
    related_item_id: String,
    synthesis_type: SynthesisType,
    similarity: f64,
    originality_score: u8,
    relevance_score: u8,
    combined_score: u16,
    reasoning: String,
}

impl From<SynthesisCandidate> for CandidateRow {
    fn from(candidate: SynthesisCandidate) -> Self {
        Self {
            combined_score: candidate.combined_score(),
            id: candidate.id,
            source_item_id: candidate.source_item_id,
            related_item_id: candidate.related_item_id,
            synthesis_type: candidate.synthesis_type,
            similarity: candidate.similarity,
            originality_score: candidate.originality_score,
            relevance_score: candidate.relevance_score,
            reasoning: candidate.reasoning,
        }
    }
}

pub async fn syntheses(
    digest_id: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let digest = ctx.service.get_digest(digest_id).await?;
    let syntheses = ctx.service.list_syntheses(&digest.id).await?;
    output(&syntheses, flags.format)
}

pub async fn candidates(
    digest_id: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let digest = ctx.service.get_digest(digest_id).await?;
    let rows = ctx
        .service
        .list_candidates(&digest.id)
        .await?
        .into_iter()
        .map(CandidateRow::from)
        .collect::<Vec<_>>();
    output(&rows, flags.format)
}
