//! Scoring core for ad recommendations.
//!
//! This crate provides:
//! - CategoryNormalizer trait with a weighted-store and a static-table policy
//! - User vector construction (history mean or category accumulation)
//! - Cosine similarity
//! - HybridRanker, blending category weight and embedding similarity
//! - KeywordScorer, the keyword/recency alternative that needs no embeddings
//!
//! ## Architecture
//! A recommendation pass runs these stages:
//! 1. Normalizer turns raw playback categories into weighted ad categories
//! 2. Candidates are fetched per ad category (see `sources`)
//! 3. The vector builder produces a user vector from embeddings
//! 4. HybridRanker scores, sorts and truncates the candidates
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{HybridRanker, WeightedStoreNormalizer, CategoryNormalizer};
//!
//! let normalizer = WeightedStoreNormalizer::new(mapping_store.clone());
//! let weights = normalizer.normalize(&playback).await?;
//!
//! let user_vector = history_mean(&history_embeddings, Some(dimension))?;
//! let ranked = HybridRanker::default().rank(&ads, &ad_embeddings, &user_vector, &weights);
//! ```

pub mod legacy;
pub mod normalizers;
pub mod ranker;
pub mod similarity;
pub mod traits;
pub mod vector_builder;

// Re-export main types
pub use legacy::{recency_boost, KeywordScorer, UserInterests};
pub use normalizers::{StaticTableNormalizer, WeightedStoreNormalizer};
pub use ranker::{hybrid_score, into_ads, HybridRanker, ScoredAd, DEFAULT_TOP_N};
pub use similarity::cosine_similarity;
pub use traits::CategoryNormalizer;
pub use vector_builder::{
    category_accumulation, history_mean, l2_normalize, pad_embeddings, UserVectorMode, VectorError,
};
