//! Synthesis Developer (Phase 2).
//!
//! Only the best candidate of each source item is developed (highest
//! `originality + relevance`). Candidates that already have a synthesis are
//! skipped before any model call, so re-running a digest only fills gaps.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;

use strata_core::entities::{Digest, Item, SynthesisCandidate, SynthesisDraft};
use strata_core::enums::PipelinePhase;
use strata_model::{CompletionRequest, Generator};

use crate::error::SynthesisError;
use crate::orchestrator::{RunTally, SynthesisPipeline};
use crate::progress::RunControl;
use crate::prompts::{development_prompt, parse_synthesis_draft};

/// Settings for one development call.
#[derive(Debug, Clone, Copy)]
pub struct DevelopRequest<'a> {
    pub instructions: &'a str,
    pub core_thesis: &'a str,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub content_char_limit: usize,
}

/// Expand one candidate into a synthesis draft.
///
/// # Errors
///
/// - [`SynthesisError::Precondition`] if either item has no content.
/// - [`SynthesisError::Timeout`] if the model does not answer in time.
/// - [`SynthesisError::Model`] if the call fails.
/// - [`SynthesisError::MalformedResponse`] if the answer lacks a field.
pub async fn develop(
    generator: &dyn Generator,
    candidate: &SynthesisCandidate,
    source: &Item,
    related: &Item,
    request: &DevelopRequest<'_>,
) -> Result<SynthesisDraft, SynthesisError> {
    for item in [source, related] {
        if !item.has_content() {
            return Err(SynthesisError::Precondition(format!(
                "item {} has no content to develop candidate {}",
                item.id, candidate.id
            )));
        }
    }

    let call = CompletionRequest::new(
        development_prompt(
            request.instructions,
            request.core_thesis,
            source,
            related,
            candidate.synthesis_type,
            request.content_char_limit,
        ),
        request.max_tokens,
        request.timeout,
    );
    let raw = tokio::time::timeout(request.timeout, generator.complete(&call))
        .await
        .map_err(|_| SynthesisError::timeout("development", request.timeout))??;
    parse_synthesis_draft(&raw)
}

/// Best candidate per source item, strongest first.
///
/// Ties on combined score go to the higher similarity, then the lower ID.
#[must_use]
pub fn select_best_candidates(candidates: &[SynthesisCandidate]) -> Vec<&SynthesisCandidate> {
    let mut best: HashMap<&str, &SynthesisCandidate> = HashMap::new();
    for candidate in candidates {
        best.entry(candidate.source_item_id.as_str())
            .and_modify(|current| {
                if rank(candidate, *current) == Ordering::Less {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }
    let mut chosen: Vec<&SynthesisCandidate> = best.into_values().collect();
    chosen.sort_by(|a, b| rank(a, b));
    chosen
}

fn rank(a: &SynthesisCandidate, b: &SynthesisCandidate) -> Ordering {
    b.combined_score()
        .cmp(&a.combined_score())
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| a.id.cmp(&b.id))
}

impl SynthesisPipeline<'_> {
    pub(crate) async fn develop_best(
        &self,
        digest: &Digest,
        control: &RunControl,
        tally: &mut RunTally,
    ) -> Result<(), SynthesisError> {
        let candidates = self.service.list_candidates(&digest.id).await?;
        let developed = self.service.developed_candidate_ids(&digest.id).await?;
        let chosen = select_best_candidates(&candidates);
        let total = chosen.len();

        for (idx, candidate) in chosen.into_iter().enumerate() {
            if developed.contains(&candidate.id) {
                tally.already_developed += 1;
                continue;
            }
            if let Some(reason) = control.checkpoint() {
                tally.stop = Some(reason);
                return Ok(());
            }
            control
                .progress(PipelinePhase::Developing, idx + 1, total, &candidate.id)
                .await;

            match self.develop_candidate(digest, candidate).await {
                Ok(true) => tally.syntheses_developed += 1,
                Ok(false) => tally.already_developed += 1,
                Err(error) => {
                    tracing::warn!(
                        candidate_id = %candidate.id,
                        kind = %error.kind(),
                        %error,
                        "development failed"
                    );
                    tally.errors += 1;
                }
            }
        }
        Ok(())
    }

    /// Returns `false` if another run stored a synthesis first.
    async fn develop_candidate(
        &self,
        digest: &Digest,
        candidate: &SynthesisCandidate,
    ) -> Result<bool, SynthesisError> {
        let ids = [candidate.source_item_id.clone(), candidate.related_item_id.clone()];
        let items = self.service.get_items_by_ids(&ids).await?;
        let find = |id: &str| {
            items.iter().find(|item| item.id == id).ok_or_else(|| {
                SynthesisError::Precondition(format!(
                    "item {id} of candidate {} is missing",
                    candidate.id
                ))
            })
        };
        let (source, related) = (find(ids[0].as_str())?, find(ids[1].as_str())?);

        let request = DevelopRequest {
            instructions: &self.synthesis.development_prompt,
            core_thesis: &self.synthesis.core_thesis,
            timeout: Duration::from_secs(self.synthesis.development_timeout_secs),
            max_tokens: self.synthesis.development_max_tokens,
            content_char_limit: self.embedding.content_char_limit,
        };
        tracing::debug!(candidate_id = %candidate.id, "developing candidate");
        let draft = develop(
            self.models.generator.as_ref(),
            candidate,
            source,
            related,
            &request,
        )
        .await?;

        let stored = self
            .service
            .insert_synthesis(&digest.id, &candidate.id, &draft)
            .await?;
        if let Some(synthesis) = &stored {
            tracing::info!(synthesis_id = %synthesis.id, candidate_id = %candidate.id, headline = %synthesis.headline, "synthesis developed");
        }
        Ok(stored.is_some())
    }
}
