//! Category normalizer implementations.
//!
//! - `WeightedStoreNormalizer`: running-average merge over an external mapping store
//! - `StaticTableNormalizer`: fixed case-insensitive lookup, every hit weighted 1.0

pub mod static_table;
pub mod weighted_store;

pub use static_table::{StaticTableNormalizer, DEFAULT_CATEGORY_TABLE};
pub use weighted_store::{merge_running_average, rescale_min_max, WeightedStoreNormalizer};
