//! Orchestrator configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use pipeline::{UserVectorMode, DEFAULT_TOP_N};

/// Default bound on one embedding-provider call
pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the embedding service listens unless configured otherwise
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:5001";

/// Which category normalizer the orchestrator uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalizerPolicy {
    /// Running-average merge over the category mapping store
    #[default]
    WeightedStore,
    /// Fixed genre -> ad category table, every hit weighted 1.0
    StaticTable,
}

impl fmt::Display for NormalizerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizerPolicy::WeightedStore => write!(f, "weighted-store"),
            NormalizerPolicy::StaticTable => write!(f, "static-table"),
        }
    }
}

impl FromStr for NormalizerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weighted-store" | "weighted" => Ok(NormalizerPolicy::WeightedStore),
            "static-table" | "static" => Ok(NormalizerPolicy::StaticTable),
            other => Err(format!("unknown normalizer policy: {}", other)),
        }
    }
}

/// Tunables for one `RecommendationOrchestrator`
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Maximum number of ads returned
    pub top_n: usize,
    /// Bound on every embedding-provider call
    pub embedding_timeout: Duration,
    pub normalizer: NormalizerPolicy,
    pub vector_mode: UserVectorMode,
}

impl OrchestratorConfig {
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedding_timeout = timeout;
        self
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerPolicy) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_vector_mode(mut self, vector_mode: UserVectorMode) -> Self {
        self.vector_mode = vector_mode;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            embedding_timeout: DEFAULT_EMBEDDING_TIMEOUT,
            normalizer: NormalizerPolicy::default(),
            vector_mode: UserVectorMode::default(),
        }
    }
}
