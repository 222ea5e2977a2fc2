//! # Recommendation Orchestrator
//!
//! This module coordinates one recommendation request:
//! 1. Validate the user id
//! 2. Fetch playback history (and click history in accumulation mode, concurrently)
//! 3. Normalize playback categories into weighted ad categories
//! 4. Fetch candidate ads per category, deduplicated by `ad_id`
//! 5. Embed the candidate descriptions
//! 6. Build the user vector
//! 7. Rank with the hybrid score and return the top N
//!
//! Missing signal at any stage (no history, no mapped categories, no
//! candidates, no embeddings) ends the request with an empty result and a
//! logged reason. Collaborator failures and provider timeouts are errors.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use data_loader::{Ad, EmbeddingVector};
use embedding_client::EmbeddingProvider;
use pipeline::{
    category_accumulation, history_mean, into_ads, pad_embeddings, CategoryNormalizer, HybridRanker,
    ScoredAd, StaticTableNormalizer, UserVectorMode, WeightedStoreNormalizer,
};
use sources::{
    AdCatalog, AdClickStore, CandidateFetcher, CandidateSet, CategoryMappingStore, PlaybackHistoryStore,
    StoreError, UserSignals,
};

use crate::config::{NormalizerPolicy, OrchestratorConfig};
use crate::error::{RecommendationError, Result, Upstream};

/// The external collaborators a request reads from
#[derive(Clone)]
pub struct Collaborators {
    pub playback: Arc<dyn PlaybackHistoryStore>,
    pub clicks: Arc<dyn AdClickStore>,
    pub mappings: Arc<dyn CategoryMappingStore>,
    pub catalog: Arc<dyn AdCatalog>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
}

impl Collaborators {
    /// Use one store for all four store roles
    pub fn from_store<S>(store: Arc<S>, embeddings: Arc<dyn EmbeddingProvider>) -> Self
    where
        S: PlaybackHistoryStore + AdClickStore + CategoryMappingStore + AdCatalog + 'static,
    {
        Self {
            playback: store.clone(),
            clicks: store.clone(),
            mappings: store.clone(),
            catalog: store,
            embeddings,
        }
    }
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    playback: Arc<dyn PlaybackHistoryStore>,
    clicks: Arc<dyn AdClickStore>,
    normalizer: Arc<dyn CategoryNormalizer>,
    candidates: CandidateFetcher,
    embeddings: Arc<dyn EmbeddingProvider>,
    ranker: HybridRanker,
    config: OrchestratorConfig,
}

impl RecommendationOrchestrator {
    /// Wire the collaborators together according to `config`
    pub fn new(collaborators: Collaborators, config: OrchestratorConfig) -> Self {
        let normalizer: Arc<dyn CategoryNormalizer> = match config.normalizer {
            NormalizerPolicy::WeightedStore => {
                Arc::new(WeightedStoreNormalizer::new(collaborators.mappings.clone()))
            }
            NormalizerPolicy::StaticTable => Arc::new(StaticTableNormalizer::default()),
        };

        Self {
            playback: collaborators.playback,
            clicks: collaborators.clicks,
            normalizer,
            candidates: CandidateFetcher::new(collaborators.catalog),
            embeddings: collaborators.embeddings,
            ranker: HybridRanker::new(config.top_n),
            config,
        }
    }

    /// Replace the normalizer chosen by the config (e.g. a custom static table)
    pub fn with_normalizer(mut self, normalizer: Arc<dyn CategoryNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Main entry point: ranked ads for a user, best first
    pub async fn generate_recommendations(&self, user_id: &str) -> Result<Vec<Ad>> {
        Ok(into_ads(self.generate_scored_recommendations(user_id).await?))
    }

    /// Like `generate_recommendations`, keeping the score components
    #[instrument(skip(self), fields(normalizer = %self.normalizer.name(), vector_mode = %self.config.vector_mode))]
    pub async fn generate_scored_recommendations(&self, user_id: &str) -> Result<Vec<ScoredAd>> {
        let start_time = Instant::now();
        let user_id = validate_user_id(user_id)?;

        match self.run(user_id).await {
            Ok(ranked) => {
                info!(
                    "Returning {} recommendations for user {} in {:.2?}",
                    ranked.len(),
                    user_id,
                    start_time.elapsed()
                );
                Ok(ranked)
            }
            Err(RecommendationError::NoSignal(reason)) => {
                warn!("No recommendations for user {}: {}", user_id, reason);
                Ok(Vec::new())
            }
            Err(e) => {
                error!("Recommendation request for user {} failed: {}", user_id, e);
                Err(e)
            }
        }
    }

    async fn run(&self, user_id: &str) -> Result<Vec<ScoredAd>> {
        let signals = self.fetch_signals(user_id).await?;
        if !signals.has_playback() {
            return Err(RecommendationError::no_signal("empty playback history"));
        }
        info!(
            "Fetched {} playback events and {} clicks",
            signals.playback_categories.len(),
            signals.clicked_ad_ids.len()
        );

        let weights = self
            .normalizer
            .normalize(&signals.playback_categories)
            .await
            .map_err(|e| RecommendationError::upstream(Upstream::CategoryMappingStore, e))?;
        if weights.is_empty() {
            return Err(RecommendationError::no_signal("no ad categories mapped from history"));
        }
        info!("Normalized history into {} ad categories", weights.len());

        let candidates = self
            .candidates
            .get_candidates(&weights)
            .await
            .map_err(|e| RecommendationError::upstream(Upstream::AdCatalog, e))?;
        if candidates.is_empty() {
            return Err(RecommendationError::no_signal("no candidate ads"));
        }

        let ad_embeddings = self.embed(&candidates.descriptions()).await?;
        if ad_embeddings.is_empty() {
            return Err(RecommendationError::no_signal("no embeddings for candidate ads"));
        }
        let ad_embeddings = pad_embeddings(ad_embeddings, candidates.len());

        let user_vector = self
            .build_user_vector(&signals, &candidates, &ad_embeddings)
            .await?;

        self.rank(candidates, ad_embeddings, user_vector).await
    }

    /// Gather playback history, plus clicks when accumulation needs them.
    async fn fetch_signals(&self, user_id: &str) -> Result<UserSignals> {
        let signals = UserSignals::new(user_id);
        match self.config.vector_mode {
            UserVectorMode::HistoryMean => {
                let playback = self.fetch_playback(user_id).await?;
                Ok(signals.with_playback(playback))
            }
            UserVectorMode::CategoryAccumulation => {
                let (playback, clicks) =
                    tokio::join!(self.fetch_playback(user_id), self.fetch_clicks(user_id));
                Ok(signals.with_playback(playback?).with_clicks(clicks?))
            }
        }
    }

    /// An unknown user has no history
    async fn fetch_playback(&self, user_id: &str) -> Result<Vec<String>> {
        match self.playback.fetch_playback_history(user_id).await {
            Ok(history) => Ok(history),
            Err(StoreError::NotFound { .. }) => {
                debug!("No playback history stored for user {}", user_id);
                Ok(Vec::new())
            }
            Err(e) => Err(RecommendationError::upstream(Upstream::PlaybackHistoryStore, e)),
        }
    }

    async fn fetch_clicks(&self, user_id: &str) -> Result<Vec<String>> {
        match self.clicks.fetch_ad_click_history(user_id).await {
            Ok(clicks) => Ok(clicks),
            Err(StoreError::NotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(RecommendationError::upstream(Upstream::AdClickStore, e)),
        }
    }

    /// One provider call, bounded by the configured timeout
    async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        let timeout = self.config.embedding_timeout;
        debug!("Embedding {} texts with {}", texts.len(), self.embeddings.name());

        match tokio::time::timeout(timeout, self.embeddings.generate_embeddings(texts)).await {
            Ok(Ok(embeddings)) => {
                if embeddings.len() != texts.len() {
                    warn!(
                        "Embedding provider returned {} vectors for {} texts",
                        embeddings.len(),
                        texts.len()
                    );
                }
                Ok(embeddings)
            }
            Ok(Err(e)) => Err(RecommendationError::upstream(Upstream::EmbeddingProvider, e)),
            Err(_) => Err(RecommendationError::upstream(
                Upstream::EmbeddingProvider,
                format!("timed out after {:?}", timeout),
            )),
        }
    }

    async fn build_user_vector(
        &self,
        signals: &UserSignals,
        candidates: &CandidateSet,
        ad_embeddings: &[EmbeddingVector],
    ) -> Result<EmbeddingVector> {
        let user_vector = match self.config.vector_mode {
            UserVectorMode::HistoryMean => {
                let history = self.embed(&signals.playback_categories).await?;
                let dimension = ad_embeddings.first().map(Vec::len);
                history_mean(&history, dimension)
            }
            UserVectorMode::CategoryAccumulation => {
                category_accumulation(signals, &candidates.ads, ad_embeddings)
            }
        };
        user_vector.map_err(|e| RecommendationError::no_signal(e.to_string()))
    }

    /// Score on the blocking pool; ranking fans out over rayon
    async fn rank(
        &self,
        candidates: CandidateSet,
        ad_embeddings: Vec<EmbeddingVector>,
        user_vector: EmbeddingVector,
    ) -> Result<Vec<ScoredAd>> {
        let ranker = self.ranker;
        let ranked = tokio::task::spawn_blocking(move || {
            ranker.rank(
                &candidates.ads,
                &ad_embeddings,
                &user_vector,
                &candidates.category_weights,
            )
        })
        .await?;
        Ok(ranked)
    }
}

/// Reject empty or blank user ids before any work is done
fn validate_user_id(user_id: &str) -> Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(RecommendationError::InvalidInput(
            "user id must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
