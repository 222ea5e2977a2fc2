//! Server crate for the ad recommendation engine.
//!
//! This crate contains the orchestrator that coordinates all components
//! of a recommendation request, its configuration and its error taxonomy.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::{NormalizerPolicy, OrchestratorConfig, DEFAULT_EMBEDDING_TIMEOUT, DEFAULT_EMBEDDING_URL};
pub use error::{RecommendationError, Upstream};
pub use orchestrator::{Collaborators, RecommendationOrchestrator};
