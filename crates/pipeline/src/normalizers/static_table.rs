//! Fixed lookup table normalizer.
//!
//! Each raw category maps to at most one ad category. Every mapped ad
//! category gets weight 1.0; unmapped categories are dropped.

use std::collections::HashMap;

use async_trait::async_trait;
use data_loader::CategoryWeights;
use sources::StoreError;
use tracing::debug;

use crate::traits::CategoryNormalizer;

/// Genre -> ad category table used by `StaticTableNormalizer::default()`
pub const DEFAULT_CATEGORY_TABLE: &[(&str, &str)] = &[
    ("action", "Sports"),
    ("adventure", "Travel"),
    ("animation", "Toys"),
    ("children", "Toys"),
    ("comedy", "Entertainment"),
    ("crime", "Security"),
    ("documentary", "Education"),
    ("drama", "Books"),
    ("fantasy", "Games"),
    ("horror", "Games"),
    ("musical", "Music"),
    ("mystery", "Books"),
    ("romance", "Fashion"),
    ("sci-fi", "Technology"),
    ("thriller", "Security"),
    ("war", "Outdoors"),
    ("western", "Outdoors"),
];

/// Case-insensitive static category table
#[derive(Debug, Clone)]
pub struct StaticTableNormalizer {
    /// Keys are lowercased raw categories
    table: HashMap<String, String>,
}

impl StaticTableNormalizer {
    /// Build a normalizer from `(raw category, ad category)` pairs
    pub fn new<K, V>(table: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            table: table
                .into_iter()
                .map(|(raw, ad)| (raw.as_ref().trim().to_lowercase(), ad.into()))
                .collect(),
        }
    }

    /// Ad category for one raw category, if mapped
    pub fn lookup(&self, raw_category: &str) -> Option<&str> {
        self.table
            .get(&raw_category.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Synchronous core of `normalize`
    pub fn normalize_categories(&self, raw_categories: &[String]) -> CategoryWeights {
        let mut weights = CategoryWeights::new();
        for raw in raw_categories {
            if raw.trim().is_empty() {
                debug!("Skipping blank category");
                continue;
            }
            match self.lookup(raw) {
                Some(ad_category) => {
                    weights.insert(ad_category.to_string(), 1.0);
                }
                None => debug!("No static mapping for category {}", raw),
            }
        }
        weights
    }
}

impl Default for StaticTableNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_TABLE.iter().copied())
    }
}

#[async_trait]
impl CategoryNormalizer for StaticTableNormalizer {
    fn name(&self) -> &str {
        "StaticTableNormalizer"
    }

    async fn normalize(&self, raw_categories: &[String]) -> Result<CategoryWeights, StoreError> {
        Ok(self.normalize_categories(raw_categories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(categories: &[&str]) -> Vec<String> {
        categories.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_mapped_categories_get_full_weight() {
        let normalizer = StaticTableNormalizer::default();
        let weights = normalizer.normalize_categories(&raw(&["Action", "Adventure"]));

        assert_eq!(weights.len(), 2);
        assert_eq!(weights.get("Sports"), Some(&1.0));
        assert_eq!(weights.get("Travel"), Some(&1.0));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let normalizer = StaticTableNormalizer::default();
        assert_eq!(normalizer.lookup("ACTION"), Some("Sports"));
        assert_eq!(normalizer.lookup(" sci-fi "), Some("Technology"));
    }

    #[test]
    fn test_duplicates_collapse_and_unknown_dropped() {
        let normalizer = StaticTableNormalizer::default();
        let weights =
            normalizer.normalize_categories(&raw(&["Action", "action", "Noir", "", "Crime", "Thriller"]));

        assert_eq!(weights.len(), 2);
        assert!(weights.contains_key("Sports"));
        assert!(weights.contains_key("Security"));
    }

    #[test]
    fn test_custom_table() {
        let normalizer = StaticTableNormalizer::new([("Cooking", "Food")]);
        let weights = normalizer.normalize_categories(&raw(&["cooking", "Action"]));
        assert_eq!(weights, CategoryWeights::from([("Food".to_string(), 1.0)]));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let normalizer = StaticTableNormalizer::default();
        assert!(normalizer.normalize(&[]).await.unwrap().is_empty());
    }
}
