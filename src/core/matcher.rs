use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::{
    criteria::Criteria,
    ranking::rank,
    repository::{RepositoryError, VenueRepository},
    scoring::{score_venue, SemanticMode},
    similarity::{SemanticSimilarity, SimilarityError},
};
use crate::models::{
    MatchPolicy, MatchResult, PhotoPayload, ScoreBreakdown, ScoringWeights, SimilarityFallback,
    Venue, VenueSummary,
};

/// Default number of venues scored concurrently
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Errors that fail a whole matching request
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Similarity provider failed: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("Matching exceeded deadline of {0:?}")]
    Timeout(Duration),
}

/// Result of the matching process
#[derive(Debug)]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Fetch the venue snapshot
/// 2. Score every venue (concurrently, order preserved)
/// 3. Rank and keep the top 15
/// 4. Attach photos to the survivors
///
/// Stage 2 is the scoring worker pool: up to `concurrency` per-venue futures
/// in flight on the request's task via `buffered`, so results come back in
/// retrieval order. Embedding lookups dominate the cost; the exact scorers are
/// not spread across threads.
#[derive(Clone)]
pub struct Matcher {
    repository: Arc<dyn VenueRepository>,
    similarity: Arc<dyn SemanticSimilarity>,
    weights: ScoringWeights,
    policy: MatchPolicy,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl Matcher {
    pub fn new(
        repository: Arc<dyn VenueRepository>,
        similarity: Arc<dyn SemanticSimilarity>,
        weights: ScoringWeights,
    ) -> Self {
        Self {
            repository,
            similarity,
            weights,
            policy: MatchPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Deadline for a whole `compute_matches` call
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Find the best matching venues for the criteria
    ///
    /// Returns at most 15 results sorted by descending score; ties keep the
    /// repository's retrieval order. Either the whole ranking is returned or
    /// an error, never a partial list.
    pub async fn compute_matches(&self, criteria: &Criteria) -> Result<MatchOutcome, MatchError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(criteria))
                .await
                .map_err(|_| MatchError::Timeout(limit))?,
            None => self.run(criteria).await,
        }
    }

    /// Every venue in retrieval order, unscored
    pub async fn list_all(&self) -> Result<Vec<VenueSummary>, MatchError> {
        let venues = self.repository.fetch_all_venues().await?;
        Ok(venues.iter().map(Venue::summary).collect())
    }

    async fn run(&self, criteria: &Criteria) -> Result<MatchOutcome, MatchError> {
        let venues = self.repository.fetch_all_venues().await?;
        let total_candidates = venues.len();

        if venues.is_empty() {
            return Ok(MatchOutcome { matches: vec![], total_candidates });
        }

        if criteria.is_empty() {
            tracing::debug!("Empty criteria; all {} venues will score 0", total_candidates);
        }

        let scored = match self.score_all(criteria, &venues, SemanticMode::Enabled).await {
            Ok(scored) => scored,
            Err(e) if self.policy.on_similarity_error == SimilarityFallback::ExactOnly => {
                tracing::warn!("Similarity provider failed ({}); re-scoring with exact matching only", e);
                self.score_all(criteria, &venues, SemanticMode::Disabled).await?
            }
            Err(e) => {
                tracing::error!("Similarity provider failed: {}", e);
                return Err(e.into());
            }
        };

        let ranked = rank(scored);

        let ids: Vec<String> = ranked.iter().map(|((venue, _), _)| venue.id.clone()).collect();
        let mut photos = self.fetch_photos(&ids).await?;

        let matches = ranked
            .into_iter()
            .map(|((venue, breakdown), score)| MatchResult {
                venue: venue.summary(),
                score,
                breakdown,
                photo: photos.remove(&venue.id).flatten(),
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Ranked {} of {} candidates",
            matches.len(),
            total_candidates
        );

        Ok(MatchOutcome { matches, total_candidates })
    }

    async fn score_all<'a>(
        &self,
        criteria: &Criteria,
        venues: &'a [Venue],
        mode: SemanticMode,
    ) -> Result<Vec<((&'a Venue, ScoreBreakdown), f64)>, SimilarityError> {
        stream::iter(venues)
            .map(|venue| async move {
                let (breakdown, score) = score_venue(
                    criteria,
                    venue,
                    &self.policy,
                    &self.weights,
                    self.similarity.as_ref(),
                    mode,
                )
                .await?;
                Ok::<_, SimilarityError>(((venue, breakdown), score))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    async fn fetch_photos(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Option<PhotoPayload>>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.repository.fetch_photos_by_ids(ids).await
    }
}
