//! Error taxonomy of a recommendation request.

use std::fmt;

use thiserror::Error;

/// External collaborator a request depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    PlaybackHistoryStore,
    AdClickStore,
    CategoryMappingStore,
    AdCatalog,
    EmbeddingProvider,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Upstream::PlaybackHistoryStore => "playback history store",
            Upstream::AdClickStore => "ad click store",
            Upstream::CategoryMappingStore => "category mapping store",
            Upstream::AdCatalog => "ad catalog",
            Upstream::EmbeddingProvider => "embedding provider",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum RecommendationError {
    /// Rejected before any collaborator was called
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A store or the embedding provider failed or timed out
    #[error("{upstream} unavailable: {reason}")]
    UpstreamUnavailable { upstream: Upstream, reason: String },

    /// Nothing to recommend from. Never returned to callers; the
    /// orchestrator turns it into an empty result.
    #[error("no signal: {0}")]
    NoSignal(String),

    #[error("ranking task failed: {0}")]
    RankingTask(#[from] tokio::task::JoinError),
}

impl RecommendationError {
    pub fn upstream(upstream: Upstream, reason: impl fmt::Display) -> Self {
        RecommendationError::UpstreamUnavailable {
            upstream,
            reason: reason.to_string(),
        }
    }

    pub fn no_signal(reason: impl Into<String>) -> Self {
        RecommendationError::NoSignal(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, RecommendationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_names_collaborator() {
        let err = RecommendationError::upstream(Upstream::AdCatalog, "connection refused");
        assert_eq!(err.to_string(), "ad catalog unavailable: connection refused");

        let err = RecommendationError::upstream(Upstream::EmbeddingProvider, "timed out");
        assert!(err.to_string().starts_with("embedding provider"));
    }
}
