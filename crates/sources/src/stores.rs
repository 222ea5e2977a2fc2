//! Collaborator interfaces the recommendation core reads from.
//!
//! Each store is an async trait so that any backend (a database client,
//! a cache, the in-memory `DataIndex`, a test double) can be injected as
//! `Arc<dyn Store>`.

use std::collections::HashMap;

use async_trait::async_trait;
use data_loader::{Ad, AdId};
use thiserror::Error;

/// Errors a store can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The requested entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The backing store could not be reached or timed out
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Source of per-user playback history.
#[async_trait]
pub trait PlaybackHistoryStore: Send + Sync {
    /// Categories of the content the user played, most recent first.
    ///
    /// Fails with `NotFound` for an unknown user.
    async fn fetch_playback_history(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
}

/// Source of per-user ad-click history.
#[async_trait]
pub trait AdClickStore: Send + Sync {
    /// IDs of the ads the user clicked. Unknown users have no clicks.
    async fn fetch_ad_click_history(&self, user_id: &str) -> Result<Vec<AdId>, StoreError>;
}

/// Source of movie-category to ad-category mappings.
#[async_trait]
pub trait CategoryMappingStore: Send + Sync {
    /// `ad_category -> weight` for one movie category.
    ///
    /// An unmapped category yields an empty map, not an error.
    async fn fetch_category_mapping(
        &self,
        category: &str,
    ) -> Result<HashMap<String, f32>, StoreError>;
}

/// The ad catalog.
#[async_trait]
pub trait AdCatalog: Send + Sync {
    /// All ads of one category. An unknown category yields an empty Vec.
    async fn fetch_ads_by_category(&self, category: &str) -> Result<Vec<Ad>, StoreError>;
}
