//! Core domain types for the ad recommendation dataset.
//!
//! This module defines the records the recommendation core reads:
//! - Playback and ad-click events logged per user
//! - Ads owned by the catalog
//! - Movie-category to ad-category mappings
//! - The in-memory `DataIndex` that serves them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and keep user IDs and ad IDs apart in signatures

/// Identifier for a user (opaque string, e.g. "user-42")
pub type UserId = String;

/// Identifier for an ad, unique within the catalog
pub type AdId = String;

/// Fixed-length embedding produced by the external embedding service.
///
/// All embeddings used in one ranking pass share the same dimension.
pub type EmbeddingVector = Vec<f32>;

/// Ad category -> relevance weight
pub type CategoryWeights = HashMap<String, f32>;

// =============================================================================
// Interaction Records
// =============================================================================

/// One content-playback event.
///
/// Created by an external logging path; read-only to the recommendation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: UserId,
    /// Category of the content that was played (e.g. "Action", "Documentary")
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

/// One ad-click event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdClickRecord {
    pub user_id: UserId,
    pub ad_id: AdId,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Ad Catalog Types
// =============================================================================

/// An advertisement as owned by the ad catalog.
///
/// `keywords` and `target_audience` are sets; `BTreeSet` keeps their
/// iteration order stable for logging and serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub ad_id: AdId,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub target_audience: BTreeSet<String>,
    /// When the ad was created. Only the legacy keyword scorer looks at it.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Ad {
    /// Create an ad with no keywords, audience or creation time
    pub fn new(
        ad_id: impl Into<AdId>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            ad_id: ad_id.into(),
            category: category.into(),
            description: description.into(),
            keywords: BTreeSet::new(),
            target_audience: BTreeSet::new(),
            created_at: None,
        }
    }

    /// Builder-style keyword setter
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Mapping entry for one movie category.
///
/// A weight absent from `ad_categories` means "no relevance" (0.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub movie_category: String,
    pub ad_categories: HashMap<String, f32>,
}

// =============================================================================
// DataIndex - In-Memory Store
// =============================================================================

/// Holds every record of a dataset together with lookup indices.
///
/// Histories are kept most-recent-first once `build_secondary_indices`
/// has run, which is the order the recommendation core expects.
#[derive(Debug)]
pub struct DataIndex {
    // Primary data stores
    pub(crate) ads: HashMap<AdId, Ad>,
    /// Catalog insertion order, so category lookups are deterministic
    pub(crate) ad_order: Vec<AdId>,

    /// Playback events per user
    pub(crate) playback: HashMap<UserId, Vec<InteractionRecord>>,
    /// Ad clicks per user
    pub(crate) clicks: HashMap<UserId, Vec<AdClickRecord>>,

    /// movie_category -> { ad_category -> weight }
    pub(crate) category_mappings: HashMap<String, HashMap<String, f32>>,

    // Secondary indices
    /// Ads grouped by category, in catalog order
    pub(crate) category_index: HashMap<String, Vec<AdId>>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            ads: HashMap::new(),
            ad_order: Vec::new(),
            playback: HashMap::new(),
            clicks: HashMap::new(),
            category_mappings: HashMap::new(),
            category_index: HashMap::new(),
        }
    }

    /// Get an ad by ID
    pub fn get_ad(&self, ad_id: &str) -> Option<&Ad> {
        self.ads.get(ad_id)
    }

    /// All ads of one category, in catalog order.
    ///
    /// Returns an empty Vec if the category has no ads.
    pub fn get_ads_by_category(&self, category: &str) -> Vec<&Ad> {
        self.category_index
            .get(category)
            .map(|ids| ids.iter().filter_map(|id| self.ads.get(id)).collect())
            .unwrap_or_default()
    }

    /// All ads in catalog order
    pub fn all_ads(&self) -> impl Iterator<Item = &Ad> {
        self.ad_order.iter().filter_map(|id| self.ads.get(id))
    }

    /// Playback events for a user, most recent first
    pub fn get_playback(&self, user_id: &str) -> &[InteractionRecord] {
        self.playback
            .get(user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Ad clicks for a user, most recent first
    pub fn get_clicks(&self, user_id: &str) -> &[AdClickRecord] {
        self.clicks
            .get(user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Category mapping for one movie category, if any
    pub fn get_category_mapping(&self, movie_category: &str) -> Option<&HashMap<String, f32>> {
        self.category_mappings.get(movie_category)
    }

    /// Whether the user appears in any history
    pub fn has_user(&self, user_id: &str) -> bool {
        self.playback.contains_key(user_id) || self.clicks.contains_key(user_id)
    }

    /// Every user id that appears in a history, sorted
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self
            .playback
            .keys()
            .chain(self.clicks.keys())
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    // Mutators - used during data loading and by tests

    /// Insert an ad. Re-inserting an existing ID replaces it in place.
    pub fn insert_ad(&mut self, ad: Ad) {
        if !self.ads.contains_key(&ad.ad_id) {
            self.ad_order.push(ad.ad_id.clone());
        }
        self.ads.insert(ad.ad_id.clone(), ad);
    }

    pub fn insert_playback(&mut self, record: InteractionRecord) {
        self.playback
            .entry(record.user_id.clone())
            .or_default()
            .push(record);
    }

    pub fn insert_click(&mut self, record: AdClickRecord) {
        self.clicks
            .entry(record.user_id.clone())
            .or_default()
            .push(record);
    }

    pub fn insert_category_mapping(&mut self, mapping: CategoryMapping) {
        self.category_mappings
            .insert(mapping.movie_category, mapping.ad_categories);
    }

    /// Get counts for debugging/validation: (ads, playback events, clicks, mappings)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let playback = self.playback.values().map(|v| v.len()).sum();
        let clicks = self.clicks.values().map(|v| v.len()).sum();
        (self.ads.len(), playback, clicks, self.category_mappings.len())
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
