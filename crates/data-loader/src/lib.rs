//! # Data Loader Crate
//!
//! This crate holds the domain types of the ad recommender and an
//! in-memory index that can be loaded from a JSON dataset directory.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Ad, InteractionRecord, AdClickRecord, CategoryMapping, DataIndex)
//! - **parser**: Parse the JSON dataset files into Rust structs
//! - **index**: Build lookup indices and validate the dataset
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/sample"))?;
//!
//! let history = index.get_playback("user-1");
//! let sports_ads = index.get_ads_by_category("Sports");
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    AdId,
    CategoryWeights,
    EmbeddingVector,
    UserId,
    // Core types
    Ad,
    AdClickRecord,
    CategoryMapping,
    DataIndex,
    InteractionRecord,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        assert_eq!(index.counts(), (0, 0, 0, 0));
    }

    #[test]
    fn test_insert_ad() {
        let mut index = DataIndex::new();

        let ad = Ad::new("ad1", "Tech", "Latest gadgets and devices")
            .with_keywords(["tech", "gadgets"]);
        index.insert_ad(ad);

        let retrieved = index.get_ad("ad1").unwrap();
        assert_eq!(retrieved.category, "Tech");
        assert_eq!(retrieved.keywords.len(), 2);
    }

    #[test]
    fn test_reinsert_ad_keeps_catalog_order() {
        let mut index = DataIndex::new();
        index.insert_ad(Ad::new("ad1", "Tech", "a"));
        index.insert_ad(Ad::new("ad2", "Tech", "b"));
        index.insert_ad(Ad::new("ad1", "Tech", "a, updated"));
        index.build_secondary_indices();

        let ids: Vec<&str> = index.all_ads().map(|a| a.ad_id.as_str()).collect();
        assert_eq!(ids, vec!["ad1", "ad2"]);
        assert_eq!(index.get_ad("ad1").unwrap().description, "a, updated");
    }

    #[test]
    fn test_insert_playback() {
        let mut index = DataIndex::new();

        index.insert_playback(InteractionRecord {
            user_id: "u1".to_string(),
            category: "Action".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        });

        assert_eq!(index.get_playback("u1").len(), 1);
        assert!(index.has_user("u1"));
        assert_eq!(index.user_ids(), vec!["u1".to_string()]);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        assert!(index.get_ad("missing").is_none());
        assert!(index.get_playback("missing").is_empty());
        assert!(index.get_clicks("missing").is_empty());
        assert!(index.get_ads_by_category("Tech").is_empty());
        assert!(index.get_category_mapping("Action").is_none());
    }
}
