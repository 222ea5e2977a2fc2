//! In-memory store backed by a shared `DataIndex`.
//!
//! Implements every collaborator trait so a loaded dataset can stand in
//! for the real history stores, mapping table and ad catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use data_loader::{Ad, AdId, DataIndex};
use tracing::debug;

use crate::stores::{AdCatalog, AdClickStore, CategoryMappingStore, PlaybackHistoryStore, StoreError};

/// Serves all four collaborator interfaces from one `DataIndex`
#[derive(Clone)]
pub struct InMemoryStore {
    data_index: Arc<DataIndex>,
}

impl InMemoryStore {
    pub fn new(data_index: Arc<DataIndex>) -> Self {
        Self { data_index }
    }
}

#[async_trait]
impl PlaybackHistoryStore for InMemoryStore {
    async fn fetch_playback_history(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        if !self.data_index.has_user(user_id) {
            return Err(StoreError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            });
        }

        let history: Vec<String> = self
            .data_index
            .get_playback(user_id)
            .iter()
            .map(|record| record.category.clone())
            .collect();
        debug!("Playback history for {}: {} events", user_id, history.len());
        Ok(history)
    }
}

#[async_trait]
impl AdClickStore for InMemoryStore {
    async fn fetch_ad_click_history(&self, user_id: &str) -> Result<Vec<AdId>, StoreError> {
        Ok(self
            .data_index
            .get_clicks(user_id)
            .iter()
            .map(|record| record.ad_id.clone())
            .collect())
    }
}

#[async_trait]
impl CategoryMappingStore for InMemoryStore {
    async fn fetch_category_mapping(
        &self,
        category: &str,
    ) -> Result<HashMap<String, f32>, StoreError> {
        Ok(self
            .data_index
            .get_category_mapping(category)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AdCatalog for InMemoryStore {
    async fn fetch_ads_by_category(&self, category: &str) -> Result<Vec<Ad>, StoreError> {
        Ok(self
            .data_index
            .get_ads_by_category(category)
            .into_iter()
            .cloned()
            .collect())
    }
}
