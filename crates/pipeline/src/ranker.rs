//! Hybrid scoring and ranking of candidate ads.
//!
//! ## Algorithm
//! 1. Drop later duplicates of an `ad_id` (first occurrence wins)
//! 2. Score each remaining ad in parallel:
//!    `0.4 * category_weight + 0.6 * cosine(user_vector, embedding)`
//! 3. Stable sort by score, highest first (ties keep candidate order)
//! 4. Keep the top N

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

use data_loader::{Ad, CategoryWeights, EmbeddingVector};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::similarity::cosine_similarity;
use crate::vector_builder::pad_embeddings;

/// Weight of the normalized category score in the final score
pub const CATEGORY_BLEND_WEIGHT: f32 = 0.4;

/// Weight of the embedding similarity in the final score
pub const EMBEDDING_BLEND_WEIGHT: f32 = 0.6;

pub const DEFAULT_TOP_N: usize = 5;

/// An ad with its final score and the components it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAd {
    pub ad: Ad,
    pub score: f32,
    pub category_score: f32,
    pub embedding_score: f32,
}

/// Blend a category score and an embedding similarity
pub fn hybrid_score(category_score: f32, embedding_score: f32) -> f32 {
    CATEGORY_BLEND_WEIGHT * category_score + EMBEDDING_BLEND_WEIGHT * embedding_score
}

/// Stable sort by score (descending) and truncate
pub fn sort_and_truncate(scored: &mut Vec<ScoredAd>, top_n: usize) {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_n);
}

/// Strip scores, keeping rank order
pub fn into_ads(scored: Vec<ScoredAd>) -> Vec<Ad> {
    scored.into_iter().map(|s| s.ad).collect()
}

/// Ranks candidates by the hybrid score.
#[derive(Debug, Clone, Copy)]
pub struct HybridRanker {
    top_n: usize,
}

impl HybridRanker {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Rank `ads` against `user_vector`.
    ///
    /// `embeddings[i]` belongs to `ads[i]`. If fewer embeddings than ads are
    /// given they are zero-padded; with no embeddings at all the result is
    /// empty.
    pub fn rank(
        &self,
        ads: &[Ad],
        embeddings: &[EmbeddingVector],
        user_vector: &[f32],
        category_weights: &CategoryWeights,
    ) -> Vec<ScoredAd> {
        if ads.is_empty() {
            return Vec::new();
        }
        if embeddings.is_empty() {
            warn!("No embeddings for {} candidate ads, nothing to rank", ads.len());
            return Vec::new();
        }

        let embeddings: Cow<'_, [EmbeddingVector]> = if embeddings.len() < ads.len() {
            Cow::Owned(pad_embeddings(embeddings.to_vec(), ads.len()))
        } else {
            Cow::Borrowed(embeddings)
        };

        // Dedup before scoring so a duplicate can never take a slot
        let mut seen = HashSet::new();
        let unique: Vec<(&Ad, &EmbeddingVector)> = ads
            .iter()
            .zip(embeddings.iter())
            .filter(|(ad, _)| seen.insert(ad.ad_id.as_str()))
            .collect();
        if unique.len() < ads.len() {
            debug!("Dropped {} duplicate candidates before ranking", ads.len() - unique.len());
        }

        // Order-preserving parallel scoring
        let mut scored: Vec<ScoredAd> = unique
            .par_iter()
            .map(|(ad, embedding)| {
                let category_score = category_weights.get(&ad.category).copied().unwrap_or(0.0);
                let embedding_score = cosine_similarity(user_vector, embedding);
                ScoredAd {
                    ad: (*ad).clone(),
                    score: hybrid_score(category_score, embedding_score),
                    category_score,
                    embedding_score,
                }
            })
            .collect();

        sort_and_truncate(&mut scored, self.top_n);

        for (rank, s) in scored.iter().enumerate() {
            debug!(
                "#{} {} score={:.4} (category={:.4}, embedding={:.4})",
                rank + 1,
                s.ad.ad_id,
                s.score,
                s.category_score,
                s.embedding_score
            );
        }
        scored
    }

    /// Embedding-only ranking: every category score is 0
    pub fn rank_by_similarity(
        &self,
        ads: &[Ad],
        embeddings: &[EmbeddingVector],
        user_vector: &[f32],
    ) -> Vec<ScoredAd> {
        self.rank(ads, embeddings, user_vector, &CategoryWeights::new())
    }
}

impl Default for HybridRanker {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}
