//! Core traits for the scoring pipeline.
//!
//! This module defines the CategoryNormalizer trait that turns a user's raw
//! content categories into weighted ad categories.

use async_trait::async_trait;
use data_loader::CategoryWeights;
use sources::StoreError;

/// Maps raw content categories to ad categories with weights in `[0, 1]`.
///
/// ## Design Note
/// - `Send + Sync` allows one normalizer to serve concurrent requests
/// - Async because the weighted policy reads an external mapping store
#[async_trait]
pub trait CategoryNormalizer: Send + Sync {
    /// Returns the name of this normalizer (for logging/debugging)
    fn name(&self) -> &str;

    /// Normalize raw categories, in history order.
    ///
    /// # Returns
    /// * `Ok(CategoryWeights)` - Possibly empty
    /// * `Err` - If a backing store is unavailable
    async fn normalize(&self, raw_categories: &[String]) -> Result<CategoryWeights, StoreError>;
}
