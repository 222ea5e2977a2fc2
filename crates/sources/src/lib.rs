//! # Sources Crate
//!
//! This crate defines where the recommendation core gets its data from.
//!
//! ## Components
//!
//! ### Store interfaces
//! Async traits for the four read-only collaborators:
//! - `PlaybackHistoryStore`: played categories per user, most recent first
//! - `AdClickStore`: clicked ad IDs per user
//! - `CategoryMappingStore`: movie category -> weighted ad categories
//! - `AdCatalog`: ads per category
//!
//! ### InMemoryStore
//! Implements all four on top of a loaded `DataIndex`.
//!
//! ### CandidateFetcher
//! Turns weighted ad categories into one deduplicated candidate list.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CandidateFetcher, InMemoryStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new(data_index));
//! let fetcher = CandidateFetcher::new(store.clone());
//!
//! let candidates = fetcher.get_candidates(&category_weights).await?;
//! ```

// Public modules
pub mod candidates;
pub mod memory;
pub mod stores;
pub mod types;

// Re-export commonly used types
pub use candidates::{dedup_ads, CandidateFetcher};
pub use memory::InMemoryStore;
pub use stores::{AdCatalog, AdClickStore, CategoryMappingStore, PlaybackHistoryStore, StoreError};
pub use types::{CandidateSet, UserSignals};
