//! Embedding client for the external embedding service.
//!
//! This crate provides:
//! - The `EmbeddingProvider` trait the recommendation core depends on
//! - `HttpEmbeddingClient`, which talks to the embedding service over HTTP
//!
//! ## Wire format
//! `POST {base_url}/generate-bert` (or `/generate-tfidf`) with body
//! `{"texts": ["...", ...]}`. The service answers with a JSON array of
//! vectors, one per input text and in the same order.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use data_loader::EmbeddingVector;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors that can occur when interacting with the embedding service
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The service could not be reached or did not answer in time
    #[error("Embedding service unavailable: {0}")]
    ProviderUnavailable(String),

    /// The service answered with a non-success status
    #[error("Embedding service returned HTTP {status}: {body}")]
    ProviderError { status: u16, body: String },

    /// The service answered 2xx but the body was not a list of vectors
    #[error("Invalid response from embedding service: {0}")]
    InvalidResponse(String),

    /// The client itself could not be built
    #[error("Invalid embedding client configuration: {0}")]
    Configuration(String),
}

/// Anything that turns texts into embedding vectors.
///
/// Implementations must return one vector per input text, in input order.
/// Callers treat a shorter answer as a compatibility case and pad it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Embed a batch of texts
    async fn generate_embeddings(
        &self,
        texts: &[String],
    ) -> Result<Vec<EmbeddingVector>, EmbeddingError>;
}

/// Embedding model exposed by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingModel {
    /// Mean-pooled BERT embeddings
    #[default]
    Bert,
    /// TF-IDF vectors fitted on the request batch
    Tfidf,
}

impl EmbeddingModel {
    fn endpoint(self) -> &'static str {
        match self {
            EmbeddingModel::Bert => "/generate-bert",
            EmbeddingModel::Tfidf => "/generate-tfidf",
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingModel::Bert => f.write_str("bert"),
            EmbeddingModel::Tfidf => f.write_str("tfidf"),
        }
    }
}

impl FromStr for EmbeddingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bert" => Ok(EmbeddingModel::Bert),
            "tfidf" | "tf-idf" => Ok(EmbeddingModel::Tfidf),
            other => Err(format!("unknown embedding model: {other}")),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

/// Client for the HTTP embedding service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    model: EmbeddingModel,
}

impl HttpEmbeddingClient {
    /// Build a client for the service at `base_url` (e.g. "http://localhost:5001").
    ///
    /// `timeout` bounds every request end to end; an expired request is
    /// reported as `ProviderUnavailable`.
    pub fn new(
        base_url: impl Into<String>,
        model: EmbeddingModel,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Address of the service this client talks to
    pub fn service_address(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> EmbeddingModel {
        self.model
    }

    fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, self.model.endpoint())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate_embeddings(
        &self,
        texts: &[String],
    ) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint_url();
        debug!("Requesting {} {} embeddings from {}", texts.len(), self.model, url);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { texts })
            .send()
            .await
            .map_err(|e| {
                error!("Embedding service unreachable at {}: {}", url, e);
                EmbeddingError::ProviderUnavailable(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read embedding response body: {}", e);
            EmbeddingError::ProviderUnavailable(e.to_string())
        })?;

        if !status.is_success() {
            warn!("Embedding service error: HTTP {}", status.as_u16());
            return Err(EmbeddingError::ProviderError {
                status: status.as_u16(),
                body,
            });
        }

        let embeddings: Vec<EmbeddingVector> = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode embedding response: {}", e);
            EmbeddingError::InvalidResponse(e.to_string())
        })?;

        if embeddings.len() != texts.len() {
            warn!(
                "Embedding count mismatch: sent {} texts, received {} vectors",
                texts.len(),
                embeddings.len()
            );
        }

        Ok(embeddings)
    }
}
