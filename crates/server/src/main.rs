//! Simple test harness for the recommendation orchestrator.
//!
//! Loads a dataset, connects to the embedding service and prints the
//! recommendations for one user.
//!
//! Usage: `server [USER_ID]`
//!
//! Environment:
//! - `AD_RECS_DATA_DIR` (default `data/sample`)
//! - `AD_RECS_EMBEDDING_URL` (default `http://localhost:5001`)
//! - `AD_RECS_EMBEDDING_MODEL` (`bert` or `tfidf`, default `bert`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use data_loader::DataIndex;
use embedding_client::{EmbeddingModel, HttpEmbeddingClient};
use server::{Collaborators, OrchestratorConfig, RecommendationOrchestrator, DEFAULT_EMBEDDING_URL};
use sources::InMemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,sources=debug,pipeline=debug")),
        )
        .init();

    info!("Starting ad recommendation test harness");

    let data_dir = PathBuf::from(
        std::env::var("AD_RECS_DATA_DIR").unwrap_or_else(|_| "data/sample".to_string()),
    );
    let embedding_url =
        std::env::var("AD_RECS_EMBEDDING_URL").unwrap_or_else(|_| DEFAULT_EMBEDDING_URL.to_string());
    let model: EmbeddingModel = std::env::var("AD_RECS_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "bert".to_string())
        .parse()
        .map_err(anyhow::Error::msg)?;
    let user_id = std::env::args().nth(1).unwrap_or_else(|| "user_1".to_string());

    info!("Loading data index from {}...", data_dir.display());
    let data_index = Arc::new(
        DataIndex::load_from_files(&data_dir)
            .with_context(|| format!("Failed to load dataset from {}", data_dir.display()))?,
    );
    info!("Data index loaded successfully");

    let config = OrchestratorConfig::default();
    let client = HttpEmbeddingClient::new(&embedding_url, model, config.embedding_timeout)
        .context("Failed to build embedding client")?;
    info!("Using embedding service at {} ({})", client.service_address(), model);

    let store = Arc::new(InMemoryStore::new(data_index));
    let orchestrator =
        RecommendationOrchestrator::new(Collaborators::from_store(store, Arc::new(client)), config);

    info!("Getting recommendations for user {}", user_id);
    let recommendations = orchestrator
        .generate_scored_recommendations(&user_id)
        .await
        .with_context(|| format!("Recommendation request for {} failed", user_id))?;

    info!("Received {} recommendations:", recommendations.len());
    for (i, rec) in recommendations.iter().enumerate() {
        info!(
            "{}. [{}] {} - Score: {:.3}",
            i + 1,
            rec.ad.category,
            rec.ad.description,
            rec.score
        );
        info!(
            "   category={:.3} embedding={:.3}",
            rec.category_score, rec.embedding_score
        );
    }

    Ok(())
}
