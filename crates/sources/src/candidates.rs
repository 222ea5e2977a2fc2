//! Candidate generation from the ad catalog.
//!
//! Given normalized ad-category weights, query the catalog once per
//! category and merge the results into one deduplicated candidate list.
//!
//! ## Algorithm
//! 1. Order categories by weight (highest first, ties by name)
//! 2. Fetch ads for each category
//! 3. Keep the first occurrence of every `ad_id`
//! 4. Keep the weight of every category that produced a candidate

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use data_loader::{Ad, CategoryWeights};
use tracing::{debug, error, info};

use crate::stores::{AdCatalog, StoreError};
use crate::types::CandidateSet;

/// Fetches candidate ads for a set of weighted categories
#[derive(Clone)]
pub struct CandidateFetcher {
    catalog: Arc<dyn AdCatalog>,
}

impl CandidateFetcher {
    pub fn new(catalog: Arc<dyn AdCatalog>) -> Self {
        Self { catalog }
    }

    /// Fetch and merge candidates for every category in `weights`.
    ///
    /// A catalog failure for any category fails the whole fetch.
    pub async fn get_candidates(&self, weights: &CategoryWeights) -> Result<CandidateSet, StoreError> {
        let mut candidates = CandidateSet::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut duplicates = 0usize;

        for (category, weight) in ordered_categories(weights) {
            debug!("Querying catalog for category {} (weight {:.4})", category, weight);

            let ads = self
                .catalog
                .fetch_ads_by_category(category)
                .await
                .map_err(|e| {
                    error!("Failed to fetch ads for category {}: {}", category, e);
                    e
                })?;

            for ad in ads {
                if !seen.insert(ad.ad_id.clone()) {
                    debug!("Skipping duplicate ad {}", ad.ad_id);
                    duplicates += 1;
                    continue;
                }
                candidates.category_weights.insert(category.to_string(), weight);
                candidates.ads.push(ad);
            }
        }

        info!(
            "Fetched {} unique candidate ads across {} categories ({} duplicates dropped)",
            candidates.ads.len(),
            weights.len(),
            duplicates
        );
        Ok(candidates)
    }
}

/// Categories sorted by weight descending, then by name
fn ordered_categories(weights: &CategoryWeights) -> Vec<(&str, f32)> {
    let mut ordered: Vec<(&str, f32)> = weights
        .iter()
        .map(|(category, weight)| (category.as_str(), *weight))
        .collect();
    ordered.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ordered
}

/// Drop later duplicates of an `ad_id`, keeping first occurrences in order
pub fn dedup_ads(ads: Vec<Ad>) -> Vec<Ad> {
    let mut seen = HashSet::new();
    ads.into_iter()
        .filter(|ad| seen.insert(ad.ad_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Catalog that returns a fixed list per category
    struct FixedCatalog {
        ads: HashMap<String, Vec<Ad>>,
    }

    #[async_trait]
    impl AdCatalog for FixedCatalog {
        async fn fetch_ads_by_category(&self, category: &str) -> Result<Vec<Ad>, StoreError> {
            Ok(self.ads.get(category).cloned().unwrap_or_default())
        }
    }

    struct DownCatalog;

    #[async_trait]
    impl AdCatalog for DownCatalog {
        async fn fetch_ads_by_category(&self, _category: &str) -> Result<Vec<Ad>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn create_catalog() -> Arc<dyn AdCatalog> {
        let mut ads = HashMap::new();
        ads.insert(
            "Sports".to_string(),
            vec![
                Ad::new("ad1", "Sports", "Running shoes"),
                Ad::new("ad2", "Sports", "Football tickets"),
                // The source may hand back the same ad twice
                Ad::new("ad1", "Sports", "Running shoes"),
            ],
        );
        ads.insert(
            "Fitness".to_string(),
            vec![
                Ad::new("ad3", "Fitness", "Gym membership"),
                // Cross-listed under a second category
                Ad::new("ad2", "Sports", "Football tickets"),
            ],
        );
        Arc::new(FixedCatalog { ads })
    }

    #[tokio::test]
    async fn test_candidates_deduplicate_across_categories() {
        let fetcher = CandidateFetcher::new(create_catalog());
        let weights = CategoryWeights::from([
            ("Sports".to_string(), 1.0),
            ("Fitness".to_string(), 0.5),
        ]);

        let candidates = fetcher.get_candidates(&weights).await.unwrap();
        let ids: Vec<&str> = candidates.ads.iter().map(|a| a.ad_id.as_str()).collect();

        // Sports (higher weight) is queried first
        assert_eq!(ids, vec!["ad1", "ad2", "ad3"]);
        assert_eq!(candidates.category_weights.len(), 2);
    }

    #[tokio::test]
    async fn test_categories_without_ads_are_dropped_from_weights() {
        let fetcher = CandidateFetcher::new(create_catalog());
        let weights = CategoryWeights::from([
            ("Sports".to_string(), 1.0),
            ("Food".to_string(), 0.7),
        ]);

        let candidates = fetcher.get_candidates(&weights).await.unwrap();
        assert_eq!(candidates.ads.len(), 2);
        assert!(candidates.category_weights.contains_key("Sports"));
        assert!(!candidates.category_weights.contains_key("Food"));
    }

    #[tokio::test]
    async fn test_empty_weights_yield_no_candidates() {
        let fetcher = CandidateFetcher::new(create_catalog());
        let candidates = fetcher.get_candidates(&CategoryWeights::new()).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_propagates() {
        let fetcher = CandidateFetcher::new(Arc::new(DownCatalog));
        let weights = CategoryWeights::from([("Sports".to_string(), 1.0)]);

        let result = fetcher.get_candidates(&weights).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_ordered_categories_ties_by_name() {
        let weights = CategoryWeights::from([
            ("b".to_string(), 0.5),
            ("a".to_string(), 0.5),
            ("c".to_string(), 0.9),
        ]);
        let names: Vec<&str> = ordered_categories(&weights).into_iter().map(|(c, _)| c).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_dedup_ads_keeps_first() {
        let ads = vec![
            Ad::new("x", "A", "first"),
            Ad::new("y", "A", "other"),
            Ad::new("x", "A", "second"),
        ];
        let deduped = dedup_ads(ads);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].description, "first");
    }
}
