//! Types shared between the sources and the scoring pipeline.

use data_loader::{Ad, AdId, CategoryWeights, UserId};

/// Everything known about one user before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSignals {
    pub user_id: UserId,
    /// Played content categories, most recent first (duplicates kept)
    pub playback_categories: Vec<String>,
    /// Clicked ad IDs
    pub clicked_ad_ids: Vec<AdId>,
}

impl UserSignals {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_playback(mut self, categories: Vec<String>) -> Self {
        self.playback_categories = categories;
        self
    }

    pub fn with_clicks(mut self, ad_ids: Vec<AdId>) -> Self {
        self.clicked_ad_ids = ad_ids;
        self
    }

    /// True when the user has played anything
    pub fn has_playback(&self) -> bool {
        !self.playback_categories.is_empty()
    }
}

/// Candidate ads plus the weights of the categories that produced them.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    /// Unique by `ad_id`, in fetch order
    pub ads: Vec<Ad>,
    pub category_weights: CategoryWeights,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }

    /// Description text of every candidate, in candidate order
    pub fn descriptions(&self) -> Vec<String> {
        self.ads.iter().map(|ad| ad.description.clone()).collect()
    }
}
