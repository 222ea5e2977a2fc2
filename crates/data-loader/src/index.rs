//! DataIndex building and indexing logic.
//!
//! This module builds the DataIndex from parsed data:
//! - Primary stores (ads, playback, clicks, category mappings)
//! - Secondary indices (ads by category)
//! - History ordering (most recent first)

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;

impl DataIndex {
    /// Load a whole dataset directory
    ///
    /// Steps:
    /// 1. Parse the four JSON files in parallel
    /// 2. Build primary stores
    /// 3. Build secondary indices and order histories
    /// 4. Validate data integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        let ads_path = data_dir.join("ads.json");
        let playback_path = data_dir.join("playback.json");
        let clicks_path = data_dir.join("ad_clicks.json");
        let mappings_path = data_dir.join("category_mappings.json");

        // Nested joins give four-way parallelism
        let ((ads, mappings), (playback, clicks)) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_ads(&ads_path),
                    || parser::parse_category_mappings(&mappings_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_playback(&playback_path),
                    || parser::parse_clicks(&clicks_path),
                )
            },
        );

        let ads = ads?;
        let mappings = mappings?;
        let playback = playback?;
        let clicks = clicks?;

        let mut index = DataIndex::new();

        let mut seen = HashSet::with_capacity(ads.len());
        for ad in ads {
            if !seen.insert(ad.ad_id.clone()) {
                return Err(DataLoadError::DuplicateAd(ad.ad_id));
            }
            index.insert_ad(ad);
        }

        for mapping in mappings {
            index.insert_category_mapping(mapping);
        }

        for record in playback {
            index.insert_playback(record);
        }

        for record in clicks {
            index.insert_click(record);
        }

        index.build_secondary_indices();
        index.validate()?;

        Ok(index)
    }

    /// Build secondary indices after primary data is loaded
    ///
    /// Rebuilds the category index from catalog order and sorts every
    /// user history most-recent-first. Sorting is stable, so events with
    /// equal timestamps keep their file order.
    pub fn build_secondary_indices(&mut self) {
        self.category_index.clear();
        for ad_id in &self.ad_order {
            if let Some(ad) = self.ads.get(ad_id) {
                self.category_index
                    .entry(ad.category.clone())
                    .or_default()
                    .push(ad_id.clone());
            }
        }

        self.playback
            .par_iter_mut()
            .for_each(|(_, events)| events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)));

        self.clicks
            .par_iter_mut()
            .for_each(|(_, events)| events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)));
    }

    /// Validate data integrity
    ///
    /// Mapping targets must name a category: a blank ad category can never
    /// match a catalog entry. Field-level checks (blank ids, weights) are
    /// done by the parser.
    ///
    /// Clicks on ads missing from the catalog are allowed: the catalog
    /// may have retired the ad after the click was logged.
    pub fn validate(&self) -> Result<()> {
        for (movie_category, ad_categories) in &self.category_mappings {
            if ad_categories.keys().any(|c| c.trim().is_empty()) {
                return Err(DataLoadError::ValidationError(format!(
                    "mapping for {movie_category} has a blank ad category"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(dir: &Path, ads: &str) {
        fs::write(dir.join("ads.json"), ads).unwrap();
        fs::write(
            dir.join("playback.json"),
            r#"[
                {"user_id": "u1", "category": "Action", "timestamp": "2024-01-01T10:00:00Z"},
                {"user_id": "u1", "category": "Comedy", "timestamp": "2024-01-03T10:00:00Z"},
                {"user_id": "u1", "category": "Drama", "timestamp": "2024-01-02T10:00:00Z"}
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("ad_clicks.json"),
            r#"[{"user_id": "u1", "ad_id": "ad2", "timestamp": "2024-01-02T11:00:00Z"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("category_mappings.json"),
            r#"{"Action": {"Sports": 0.9, "Fitness": 0.4}}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_dataset() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            dir.path(),
            r#"[
                {"ad_id": "ad1", "category": "Sports", "description": "Running shoes"},
                {"ad_id": "ad2", "category": "Fitness", "description": "Gym membership"},
                {"ad_id": "ad3", "category": "Sports", "description": "Football tickets"}
            ]"#,
        );

        let index = DataIndex::load_from_files(dir.path()).unwrap();
        let (ads, playback, clicks, mappings) = index.counts();
        assert_eq!((ads, playback, clicks, mappings), (3, 3, 1, 1));

        // Histories come back most recent first
        let categories: Vec<&str> = index
            .get_playback("u1")
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Comedy", "Drama", "Action"]);

        // Category index keeps catalog order
        let sports: Vec<&str> = index
            .get_ads_by_category("Sports")
            .iter()
            .map(|a| a.ad_id.as_str())
            .collect();
        assert_eq!(sports, vec!["ad1", "ad3"]);

        assert_eq!(index.get_category_mapping("Action").unwrap()["Sports"], 0.9);
    }

    #[test]
    fn test_load_rejects_duplicate_ads() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            dir.path(),
            r#"[
                {"ad_id": "ad1", "category": "Sports", "description": "a"},
                {"ad_id": "ad1", "category": "Travel", "description": "b"}
            ]"#,
        );

        let result = DataIndex::load_from_files(dir.path());
        assert!(matches!(result, Err(DataLoadError::DuplicateAd(id)) if id == "ad1"));
    }

    #[test]
    fn test_load_rejects_blank_mapping_target() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            dir.path(),
            r#"[{"ad_id": "ad1", "category": "Sports", "description": "a"}]"#,
        );
        fs::write(
            dir.path().join("category_mappings.json"),
            r#"{"Action": {"Sports": 0.9, "  ": 0.4}}"#,
        )
        .unwrap();

        let result = DataIndex::load_from_files(dir.path());
        assert!(matches!(result, Err(DataLoadError::ValidationError(msg)) if msg.contains("Action")));
    }

    #[test]
    fn test_load_missing_directory() {
        let result = DataIndex::load_from_files(Path::new("/no/such/dataset"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }
}
