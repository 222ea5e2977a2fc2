//! Keyword-overlap scorer with recency boosting.
//!
//! An alternative to the hybrid ranker that needs no embeddings:
//!
//! `score = keyword_matches * category_boost + recency_boost(age_days)`
//!
//! - `keyword_matches`: ad keywords present in the user's interest profile
//!   (case-insensitive)
//! - `category_boost`: per-category multiplier, 1.0 when not configured
//! - `recency_boost`: 1.0 up to 7 days old, 0.5 up to 30 days, else 0.0
//!
//! Ranking follows the hybrid ranker's rules: dedup by `ad_id` first, stable
//! descending sort, truncate to top N.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use data_loader::Ad;
use rayon::prelude::*;
use sources::dedup_ads;
use tracing::debug;

use crate::ranker::{sort_and_truncate, ScoredAd, DEFAULT_TOP_N};

/// Interest profile: lowercased category or keyword -> occurrence count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInterests {
    counts: HashMap<String, u32>,
}

impl UserInterests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every non-blank entry of `categories`
    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut interests = Self::new();
        for category in categories {
            interests.add(category.as_ref(), 1);
        }
        interests
    }

    /// Add `count` occurrences of `interest`
    pub fn add(&mut self, interest: &str, count: u32) {
        let key = interest.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        *self.counts.entry(key).or_insert(0) += count;
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.counts.contains_key(&keyword.trim().to_lowercase())
    }

    pub fn count(&self, keyword: &str) -> u32 {
        self.counts
            .get(&keyword.trim().to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Boost for an ad `age_days` old. Future timestamps count as brand new.
pub fn recency_boost(age_days: i64) -> f32 {
    match age_days {
        i64::MIN..=7 => 1.0,
        8..=30 => 0.5,
        _ => 0.0,
    }
}

/// Scores ads by keyword overlap with a user's interests
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    /// Keys are lowercased categories
    category_boosts: HashMap<String, f32>,
    top_n: usize,
}

impl KeywordScorer {
    pub fn new() -> Self {
        Self {
            category_boosts: HashMap::new(),
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_category_boost(mut self, category: &str, boost: f32) -> Self {
        self.category_boosts
            .insert(category.trim().to_lowercase(), boost);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn category_boost(&self, category: &str) -> f32 {
        self.category_boosts
            .get(&category.trim().to_lowercase())
            .copied()
            .unwrap_or(1.0)
    }

    /// Score one ad as of `now`.
    ///
    /// The returned `ScoredAd` carries the keyword component in
    /// `category_score`; `embedding_score` is always 0.
    pub fn score(&self, ad: &Ad, interests: &UserInterests, now: DateTime<Utc>) -> ScoredAd {
        let matches = ad
            .keywords
            .iter()
            .filter(|keyword| interests.contains(keyword))
            .count();
        let keyword_score = matches as f32 * self.category_boost(&ad.category);
        let recency = ad
            .created_at
            .map(|created| recency_boost((now - created).num_days()))
            .unwrap_or(0.0);

        ScoredAd {
            ad: ad.clone(),
            score: keyword_score + recency,
            category_score: keyword_score,
            embedding_score: 0.0,
        }
    }

    /// Rank `ads` for a user as of `now`
    pub fn rank(&self, ads: Vec<Ad>, interests: &UserInterests, now: DateTime<Utc>) -> Vec<ScoredAd> {
        let ads = dedup_ads(ads);
        let mut scored: Vec<ScoredAd> = ads
            .par_iter()
            .map(|ad| self.score(ad, interests, now))
            .collect();

        sort_and_truncate(&mut scored, self.top_n);
        debug!("Keyword scorer kept {} ads", scored.len());
        scored
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new()
    }
}
