//! Candidate Discovery (Phase 1).
//!
//! For each of today's items: make sure it has a vector, rank neighbors from
//! the digest's search window, cap them at `max_candidates_per_item`, then
//! classify and score each pair with one model call. Scoring runs in
//! batches of `scoring_concurrency` concurrent calls with
//! `scoring_batch_delay_ms` between batches.
//!
//! Pairs already recorded for the digest are not scored again.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::future::join_all;
use strata_core::entities::{Digest, Item, NewCandidate};
use strata_core::enums::PipelinePhase;
use strata_model::CompletionRequest;

use crate::classify::PairSignals;
use crate::embedding_store::{EmbedOutcome, embed_and_store};
use crate::error::SynthesisError;
use crate::index::{Neighbor, SearchWindow, load_pool, rank_neighbors};
use crate::orchestrator::{RunTally, SynthesisOptions, SynthesisPipeline};
use crate::progress::RunControl;
use crate::prompts::{parse_candidate_score, scoring_prompt};

impl SynthesisPipeline<'_> {
    pub(crate) async fn discover(
        &self,
        digest: &Digest,
        items: &[Item],
        options: &SynthesisOptions,
        control: &RunControl,
        tally: &mut RunTally,
    ) -> Result<(), SynthesisError> {
        let query = options.neighbor_query();
        let window = SearchWindow::for_day(digest.digest_date, options.max_age_days);
        let pool = load_pool(self.service, &window).await?;
        let recorded: HashSet<(String, String)> = self
            .service
            .list_candidates(&digest.id)
            .await?
            .into_iter()
            .map(|c| (c.source_item_id, c.related_item_id))
            .collect();

        let batch_size = self.synthesis.scoring_concurrency.max(1);
        let batch_delay = Duration::from_millis(self.synthesis.scoring_batch_delay_ms);
        let mut batches_sent = 0_usize;
        let total = items.len();

        for (idx, item) in items.iter().enumerate() {
            if let Some(reason) = control.checkpoint() {
                tally.stop = Some(reason);
                return Ok(());
            }
            control
                .progress(PipelinePhase::Discovering, idx + 1, total, &item.title)
                .await;
            tally.processed += 1;

            let vector = match self.source_vector(item).await {
                Ok(Some(vector)) => vector,
                Ok(None) => {
                    tracing::debug!(item_id = %item.id, "no text to embed, no neighbors");
                    continue;
                }
                Err(error) => {
                    tracing::warn!(item_id = %item.id, %error, "could not embed source item");
                    tally.errors += 1;
                    continue;
                }
            };

            let mut neighbors = rank_neighbors(&item.id, &vector, &pool, &window, &query);
            neighbors.truncate(options.max_candidates_per_item);
            neighbors.retain(|n| !recorded.contains(&(item.id.clone(), n.item_id.clone())));
            if neighbors.is_empty() {
                tracing::debug!(item_id = %item.id, "no new neighbors above threshold");
                continue;
            }

            let ids: Vec<String> = neighbors.iter().map(|n| n.item_id.clone()).collect();
            let related = match self.service.get_items_by_ids(&ids).await {
                Ok(related) => related,
                Err(error) => {
                    tracing::warn!(item_id = %item.id, %error, "could not load neighbor items");
                    tally.errors += 1;
                    continue;
                }
            };
            let related: HashMap<&str, &Item> =
                related.iter().map(|r| (r.id.as_str(), r)).collect();
            let pairs: Vec<(&Neighbor, &Item)> = neighbors
                .iter()
                .filter_map(|n| related.get(n.item_id.as_str()).map(|r| (n, *r)))
                .collect();

            for batch in pairs.chunks(batch_size) {
                if let Some(reason) = control.checkpoint() {
                    tally.stop = Some(reason);
                    return Ok(());
                }
                if batches_sent > 0 && !batch_delay.is_zero() {
                    tokio::time::sleep(batch_delay).await;
                }
                batches_sent += 1;
                control
                    .progress(PipelinePhase::Scoring, idx + 1, total, &item.title)
                    .await;

                let scored = join_all(
                    batch
                        .iter()
                        .map(|(neighbor, related)| self.score_pair(digest, item, related, neighbor)),
                )
                .await;

                for ((_, related), result) in batch.iter().zip(scored) {
                    self.record_candidate(item, related, result, tally).await;
                }
            }
        }
        Ok(())
    }

    async fn record_candidate(
        &self,
        source: &Item,
        related: &Item,
        scored: Result<NewCandidate, SynthesisError>,
        tally: &mut RunTally,
    ) {
        let candidate = match scored {
            Ok(candidate) => candidate,
            Err(error) => {
                tracing::warn!(
                    item_id = %source.id,
                    related_item_id = %related.id,
                    kind = %error.kind(),
                    %error,
                    "scoring failed, dropping candidate"
                );
                tally.errors += 1;
                return;
            }
        };
        match self.service.insert_candidate(&candidate).await {
            Ok(Some(row)) => {
                tracing::debug!(
                    candidate_id = %row.id,
                    synthesis_type = %row.synthesis_type,
                    score = row.combined_score(),
                    "candidate recorded"
                );
                tally.candidates_created += 1;
            }
            Ok(None) => {
                tracing::debug!(item_id = %source.id, related_item_id = %related.id, "candidate already recorded");
            }
            Err(error) => {
                tracing::warn!(item_id = %source.id, related_item_id = %related.id, %error, "could not store candidate");
                tally.errors += 1;
            }
        }
    }

    /// The item's vector, embedding it now if it has none. `None` when the
    /// item has too little text.
    async fn source_vector(&self, item: &Item) -> Result<Option<Vec<f32>>, SynthesisError> {
        if let Some(vector) = &item.embedding {
            return Ok(Some(vector.clone()));
        }
        match embed_and_store(self.service, self.models.embedder.as_ref(), item, self.embedding)
            .await?
        {
            EmbedOutcome::Stored(vector) => Ok(Some(vector)),
            EmbedOutcome::Skipped => Ok(None),
            EmbedOutcome::AlreadyEmbedded => Ok(self.service.get_item(&item.id).await?.embedding),
        }
    }

    async fn score_pair(
        &self,
        digest: &Digest,
        source: &Item,
        related: &Item,
        neighbor: &Neighbor,
    ) -> Result<NewCandidate, SynthesisError> {
        let signals = PairSignals::between(source, related, neighbor.similarity);
        let synthesis_type = self.classifier.classify(&signals);
        let timeout = Duration::from_secs(self.synthesis.scoring_timeout_secs);
        let request = CompletionRequest::new(
            scoring_prompt(
                &self.synthesis.core_thesis,
                source,
                related,
                synthesis_type,
                neighbor.similarity,
            ),
            self.synthesis.scoring_max_tokens,
            timeout,
        );

        tracing::debug!(item_id = %source.id, related_item_id = %related.id, %synthesis_type, "scoring candidate");
        let raw = tokio::time::timeout(timeout, self.models.generator.complete(&request))
            .await
            .map_err(|_| SynthesisError::timeout("scoring", timeout))??;
        let score = parse_candidate_score(&raw)?;

        Ok(NewCandidate {
            digest_id: digest.id.clone(),
            source_item_id: source.id.clone(),
            related_item_id: related.id.clone(),
            similarity: neighbor.similarity,
            synthesis_type,
            originality_score: score.originality,
            relevance_score: score.relevance,
            reasoning: score.reasoning,
        })
    }
}
