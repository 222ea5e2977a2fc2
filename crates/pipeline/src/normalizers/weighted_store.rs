//! Weighted mapping-store normalizer.
//!
//! ## Algorithm
//! 1. For each raw category, in history order, fetch its ad-category mapping
//! 2. Fold every `(ad_category, weight)` in with `new = (old + weight) / 2`,
//!    where `old` is 0 for a category not seen yet
//! 3. Min-max rescale the result into `[0, 1]`, unless all weights are equal
//!
//! The running average is order dependent and discounts early entries;
//! repeated categories keep pulling their ad categories toward the mapped
//! weight.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use data_loader::CategoryWeights;
use sources::{CategoryMappingStore, StoreError};
use tracing::{debug, error, info};

use crate::traits::CategoryNormalizer;

/// Normalizer backed by a `CategoryMappingStore`
#[derive(Clone)]
pub struct WeightedStoreNormalizer {
    store: Arc<dyn CategoryMappingStore>,
}

impl WeightedStoreNormalizer {
    pub fn new(store: Arc<dyn CategoryMappingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CategoryNormalizer for WeightedStoreNormalizer {
    fn name(&self) -> &str {
        "WeightedStoreNormalizer"
    }

    async fn normalize(&self, raw_categories: &[String]) -> Result<CategoryWeights, StoreError> {
        let mut weights = CategoryWeights::new();
        // One store round-trip per distinct raw category
        let mut fetched: HashMap<&str, HashMap<String, f32>> = HashMap::new();

        for raw in raw_categories {
            let raw = raw.as_str();
            if raw.trim().is_empty() {
                debug!("Skipping blank category");
                continue;
            }

            if !fetched.contains_key(raw) {
                let mapping = self.store.fetch_category_mapping(raw).await.map_err(|e| {
                    error!("Category mapping lookup failed for {}: {}", raw, e);
                    e
                })?;
                fetched.insert(raw, mapping);
            }

            match fetched.get(raw) {
                Some(mapping) if !mapping.is_empty() => merge_running_average(&mut weights, mapping),
                _ => info!("No ad category mapping for {}, skipping", raw),
            }
        }

        rescale_min_max(&mut weights);
        debug!("Normalized {} raw categories into {} ad categories", raw_categories.len(), weights.len());
        Ok(weights)
    }
}

/// Fold one mapping into `weights` with `new = (old + incoming) / 2`
pub fn merge_running_average(weights: &mut CategoryWeights, mapping: &HashMap<String, f32>) {
    for (ad_category, incoming) in mapping {
        let entry = weights.entry(ad_category.clone()).or_insert(0.0);
        *entry = (*entry + incoming) / 2.0;
    }
}

/// Rescale so the minimum becomes 0.0 and the maximum 1.0.
///
/// Left unchanged when there are no weights or all weights are equal.
pub fn rescale_min_max(weights: &mut CategoryWeights) {
    let min = weights.values().copied().fold(f32::INFINITY, f32::min);
    let max = weights.values().copied().fold(f32::NEG_INFINITY, f32::max);

    if weights.is_empty() || max <= min {
        return;
    }

    let range = max - min;
    for weight in weights.values_mut() {
        *weight = (*weight - min) / range;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedMappingStore {
        mappings: HashMap<String, HashMap<String, f32>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CategoryMappingStore for FixedMappingStore {
        async fn fetch_category_mapping(
            &self,
            category: &str,
        ) -> Result<HashMap<String, f32>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.mappings.get(category).cloned().unwrap_or_default())
        }
    }

    struct DownMappingStore;

    #[async_trait]
    impl CategoryMappingStore for DownMappingStore {
        async fn fetch_category_mapping(
            &self,
            _category: &str,
        ) -> Result<HashMap<String, f32>, StoreError> {
            Err(StoreError::Unavailable("mapping table offline".to_string()))
        }
    }

    fn create_store() -> Arc<FixedMappingStore> {
        let mut mappings = HashMap::new();
        mappings.insert(
            "Action".to_string(),
            HashMap::from([("Sports".to_string(), 0.8), ("Gaming".to_string(), 0.4)]),
        );
        mappings.insert(
            "Adventure".to_string(),
            HashMap::from([("Travel".to_string(), 0.9), ("Sports".to_string(), 0.2)]),
        );
        Arc::new(FixedMappingStore {
            mappings,
            calls: AtomicUsize::new(0),
        })
    }

    fn raw(categories: &[&str]) -> Vec<String> {
        categories.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_running_average_is_order_dependent() {
        let mut weights = CategoryWeights::new();
        merge_running_average(&mut weights, &HashMap::from([("Sports".to_string(), 0.8)]));
        assert!((weights["Sports"] - 0.4).abs() < 1e-6);

        merge_running_average(&mut weights, &HashMap::from([("Sports".to_string(), 0.2)]));
        assert!((weights["Sports"] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_rescale_into_unit_range() {
        let mut weights = CategoryWeights::from([
            ("a".to_string(), 0.2),
            ("b".to_string(), 0.4),
            ("c".to_string(), 0.6),
        ]);
        rescale_min_max(&mut weights);

        assert!((weights["a"] - 0.0).abs() < 1e-6);
        assert!((weights["b"] - 0.5).abs() < 1e-6);
        assert!((weights["c"] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rescale_leaves_equal_weights() {
        let mut weights = CategoryWeights::from([("a".to_string(), 0.3), ("b".to_string(), 0.3)]);
        rescale_min_max(&mut weights);
        assert_eq!(weights["a"], 0.3);
        assert_eq!(weights["b"], 0.3);

        let mut single = CategoryWeights::from([("a".to_string(), 0.45)]);
        rescale_min_max(&mut single);
        assert_eq!(single["a"], 0.45);
    }

    #[tokio::test]
    async fn test_normalize_history() {
        let normalizer = WeightedStoreNormalizer::new(create_store());
        let weights = normalizer
            .normalize(&raw(&["Action", "Adventure"]))
            .await
            .unwrap();

        // Sports: (0 + 0.8)/2 = 0.4, then (0.4 + 0.2)/2 = 0.3
        // Gaming: 0.2, Travel: 0.45 -> rescaled over [0.2, 0.45]
        assert_eq!(weights.len(), 3);
        assert!((weights["Gaming"] - 0.0).abs() < 1e-6);
        assert!((weights["Travel"] - 1.0).abs() < 1e-6);
        assert!((weights["Sports"] - 0.4).abs() < 1e-5);
        assert!(weights.values().all(|w| (0.0..=1.0).contains(w)));
    }

    #[tokio::test]
    async fn test_unknown_and_blank_categories_skipped() {
        let normalizer = WeightedStoreNormalizer::new(create_store());

        let weights = normalizer.normalize(&raw(&["Western", "  "])).await.unwrap();
        assert!(weights.is_empty());

        assert!(normalizer.normalize(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_categories_fetched_once() {
        let store = create_store();
        let normalizer = WeightedStoreNormalizer::new(store.clone());

        let weights = normalizer
            .normalize(&raw(&["Action", "Action", "Action"]))
            .await
            .unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        // Sports 0.7, Gaming 0.35 after three merges -> rescaled
        assert!((weights["Sports"] - 1.0).abs() < 1e-6);
        assert!((weights["Gaming"] - 0.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let normalizer = WeightedStoreNormalizer::new(Arc::new(DownMappingStore));
        let result = normalizer.normalize(&raw(&["Action"])).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
