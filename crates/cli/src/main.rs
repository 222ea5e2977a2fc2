use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{Ad, DataIndex, UserId};
use embedding_client::{EmbeddingModel, HttpEmbeddingClient};
use pipeline::{KeywordScorer, ScoredAd, UserInterests, UserVectorMode};
use rand::seq::IndexedRandom;
use server::{
    Collaborators, NormalizerPolicy, OrchestratorConfig, RecommendationOrchestrator, DEFAULT_EMBEDDING_URL,
};
use sources::InMemoryStore;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// AdRecs - Ad Recommendation Engine
#[derive(Parser)]
#[command(name = "ad-recs")]
#[command(about = "Ad recommendations from playback history and text embeddings", long_about = None)]
struct Cli {
    /// Path to the dataset directory
    #[arg(short, long, env = "AD_RECS_DATA_DIR", default_value = "data/sample")]
    data_dir: PathBuf,

    /// Base URL of the embedding service
    #[arg(long, env = "AD_RECS_EMBEDDING_URL", default_value = DEFAULT_EMBEDDING_URL)]
    embedding_url: String,

    /// Embedding model (bert or tfidf)
    #[arg(long, env = "AD_RECS_EMBEDDING_MODEL", default_value = "bert")]
    embedding_model: EmbeddingModel,

    /// Timeout for one embedding request, in milliseconds
    #[arg(long, env = "AD_RECS_EMBEDDING_TIMEOUT_MS", default_value = "10000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get ad recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,

        /// Show the score components of each recommendation
        #[arg(long)]
        explain: bool,

        /// Category normalizer (weighted-store or static-table)
        #[arg(long, default_value = "weighted-store")]
        normalizer: NormalizerPolicy,

        /// User vector mode (history-mean or category-accumulation)
        #[arg(long, default_value = "history-mean")]
        vector_mode: UserVectorMode,

        /// Scoring strategy
        #[arg(long, value_enum, default_value_t = Scorer::Hybrid)]
        scorer: Scorer,

        /// Category boost for the keyword scorer, as CATEGORY=FACTOR (repeatable)
        #[arg(long = "boost", value_parser = parse_boost)]
        boosts: Vec<(String, f32)>,
    },

    /// Show a user's playback and click history
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Search the ad catalog by category or keyword
    Search {
        /// Exact category (case-insensitive)
        #[arg(long, conflicts_with = "keyword", required_unless_present = "keyword")]
        category: Option<String>,

        /// Keyword or description substring (case-insensitive)
        #[arg(long)]
        keyword: Option<String>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scorer {
    /// Category weight blended with embedding similarity
    Hybrid,
    /// Keyword overlap with recency boost, no embeddings needed
    Keyword,
}

/// Parse `CATEGORY=FACTOR`
fn parse_boost(s: &str) -> std::result::Result<(String, f32), String> {
    let (category, factor) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=FACTOR, got '{}'", s))?;
    let factor: f32 = factor
        .trim()
        .parse()
        .map_err(|e| format!("invalid boost factor '{}': {}", factor, e))?;
    Ok((category.trim().to_string(), factor))
}

/// Connection settings shared by the commands that call the embedding service
struct EmbeddingSettings {
    url: String,
    model: EmbeddingModel,
    timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading ad dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(&cli.data_dir).context("Failed to load ad dataset")?,
    );
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    let embedding = EmbeddingSettings {
        url: cli.embedding_url,
        model: cli.embedding_model,
        timeout: Duration::from_millis(cli.timeout_ms),
    };

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
            normalizer,
            vector_mode,
            scorer,
            boosts,
        } => match scorer {
            Scorer::Hybrid => {
                let config = OrchestratorConfig::default()
                    .with_top_n(limit)
                    .with_embedding_timeout(embedding.timeout)
                    .with_normalizer(normalizer)
                    .with_vector_mode(vector_mode);
                handle_recommend(data_index, &embedding, config, user_id, explain).await?
            }
            Scorer::Keyword => handle_keyword_recommend(data_index, user_id, limit, boosts, explain)?,
        },
        Commands::User { user_id } => handle_user(data_index, user_id)?,
        Commands::Search { category, keyword } => handle_search(data_index, category, keyword)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(data_index, &embedding, requests, concurrent).await?,
    }

    Ok(())
}

fn build_orchestrator(
    data_index: Arc<DataIndex>,
    embedding: &EmbeddingSettings,
    config: OrchestratorConfig,
) -> Result<RecommendationOrchestrator> {
    let client = HttpEmbeddingClient::new(embedding.url.as_str(), embedding.model, embedding.timeout)
        .context("Failed to build embedding client")?;
    tracing::debug!("Embedding service at {} ({})", client.service_address(), client.model());
    let store = Arc::new(InMemoryStore::new(data_index));
    Ok(RecommendationOrchestrator::new(
        Collaborators::from_store(store, Arc::new(client)),
        config,
    ))
}

/// Handle the 'recommend' command with the hybrid ranker
async fn handle_recommend(
    data_index: Arc<DataIndex>,
    embedding: &EmbeddingSettings,
    config: OrchestratorConfig,
    user_id: UserId,
    explain: bool,
) -> Result<()> {
    if !data_index.has_user(&user_id) {
        println!("{} No playback history for user {}", "!".yellow(), user_id);
    }

    let orchestrator = build_orchestrator(data_index, embedding, config)?;
    if explain {
        let config = orchestrator.config();
        println!(
            "Normalizer: {}, vector mode: {}, top {}, embeddings: {} ({}, timeout {:?})",
            config.normalizer,
            config.vector_mode,
            config.top_n,
            embedding.url,
            embedding.model,
            config.embedding_timeout
        );
    }

    let recommendations = orchestrator
        .generate_scored_recommendations(&user_id)
        .await
        .with_context(|| format!("Failed to recommend ads for {}", user_id))?;

    print_recommendations(&recommendations, explain);
    Ok(())
}

/// Handle the 'recommend --scorer keyword' command
fn handle_keyword_recommend(
    data_index: Arc<DataIndex>,
    user_id: UserId,
    limit: usize,
    boosts: Vec<(String, f32)>,
    explain: bool,
) -> Result<()> {
    // Interests: played categories plus the keywords of clicked ads
    let mut interests =
        UserInterests::from_categories(data_index.get_playback(&user_id).iter().map(|r| &r.category));
    for click in data_index.get_clicks(&user_id) {
        if let Some(ad) = data_index.get_ad(&click.ad_id) {
            for keyword in &ad.keywords {
                interests.add(keyword, 1);
            }
        }
    }

    if interests.is_empty() {
        println!("{} No history for user {}, nothing to match", "!".yellow(), user_id);
        return Ok(());
    }

    let scorer = boosts
        .iter()
        .fold(KeywordScorer::new().with_top_n(limit), |scorer, (category, factor)| {
            scorer.with_category_boost(category, *factor)
        });

    let ads: Vec<Ad> = data_index.all_ads().cloned().collect();
    let recommendations = scorer.rank(ads, &interests, Utc::now());

    if explain {
        println!("Interest profile: {} entries", interests.len());
    }
    print_recommendations(&recommendations, explain);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(data_index: Arc<DataIndex>, user_id: UserId) -> Result<()> {
    if !data_index.has_user(&user_id) {
        return Err(anyhow!("User {} not found", user_id));
    }

    let playback = data_index.get_playback(&user_id);
    let clicks = data_index.get_clicks(&user_id);

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    println!("{}Playback events: {}", "• ".green(), playback.len());
    println!("{}Ad clicks: {}", "• ".green(), clicks.len());

    println!("Recent playback:");
    for record in playback.iter().take(10) {
        println!("  - {} ({})", record.category, record.timestamp.format("%Y-%m-%d %H:%M"));
    }

    // Category counts, most played first
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in playback {
        *counts.entry(record.category.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<(&str, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    println!("Category preferences:");
    for (category, count) in counts {
        println!("  - {}: {} plays", category, count);
    }

    println!("Clicked ads:");
    for click in clicks {
        match data_index.get_ad(&click.ad_id) {
            Some(ad) => println!("  - {} [{}] {}", ad.ad_id, ad.category, ad.description),
            None => println!("  - {} {}", click.ad_id, "(no longer in catalog)".dimmed()),
        }
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(
    data_index: Arc<DataIndex>,
    category: Option<String>,
    keyword: Option<String>,
) -> Result<()> {
    let (label, matches): (String, Vec<&Ad>) = match (category, keyword) {
        (Some(category), _) => (
            format!("category '{}'", category),
            data_index
                .all_ads()
                .filter(|ad| ad.category.eq_ignore_ascii_case(category.trim()))
                .collect(),
        ),
        (None, Some(keyword)) => {
            let needle = keyword.trim().to_lowercase();
            let mut matches: Vec<(&Ad, usize)> = data_index
                .all_ads()
                .filter_map(|ad| {
                    // Keyword hits rank before description hits
                    if ad.keywords.iter().any(|k| k.to_lowercase() == needle) {
                        Some((ad, 0))
                    } else if ad.description.to_lowercase().contains(&needle) {
                        Some((ad, 1))
                    } else {
                        None
                    }
                })
                .collect();
            matches.sort_by_key(|(_, relevance)| *relevance);
            (
                format!("keyword '{}'", keyword),
                matches.into_iter().map(|(ad, _)| ad).collect(),
            )
        }
        (None, None) => return Err(anyhow!("Pass --category or --keyword")),
    };

    println!("{}", format!("Search results for {}:", label).bold().blue());
    if matches.is_empty() {
        println!("  (no ads found)");
    }
    for ad in matches.iter().take(20) {
        let keywords = ad.keywords.iter().cloned().collect::<Vec<_>>().join(", ");
        println!(
            "{}: {} [{}] keywords: {}",
            ad.ad_id.green(),
            ad.description,
            ad.category,
            keywords
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    data_index: Arc<DataIndex>,
    embedding: &EmbeddingSettings,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let users = data_index.user_ids();
    if users.is_empty() || requests == 0 {
        return Err(anyhow!("Nothing to benchmark: dataset has no users or no requests asked"));
    }

    let config = OrchestratorConfig::default().with_embedding_timeout(embedding.timeout);
    let orchestrator = build_orchestrator(data_index, embedding, config)?;

    // Random users from the dataset
    let user_ids: Vec<UserId> = {
        let mut rng = rand::rng();
        (0..requests)
            .filter_map(|_| users.choose(&mut rng).cloned())
            .collect()
    };

    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();
    let mut handles = vec![];
    for user in user_ids {
        let orchestrator = orchestrator.clone();
        let semaphore = semaphore.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let start = Instant::now();
            orchestrator.generate_recommendations(&user).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    let total_time = wall_clock.elapsed();

    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = timings.len() as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", timings.len(), concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[ScoredAd], explain: bool) {
    println!("{}", "Ad Recommendations:".bold().blue());
    if recommendations.is_empty() {
        println!("  (no recommendations)");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}] {} - Score: {:.3}",
            (i + 1).to_string().green(),
            rec.ad.ad_id,
            rec.ad.category,
            rec.ad.description,
            rec.score
        );
        if explain {
            println!(
                "   category: {:.3}, embedding: {:.3}",
                rec.category_score, rec.embedding_score
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boost() {
        assert_eq!(parse_boost("Travel=1.5"), Ok(("Travel".to_string(), 1.5)));
        assert_eq!(parse_boost(" Books = 2 "), Ok(("Books".to_string(), 2.0)));
        assert!(parse_boost("Travel").is_err());
        assert!(parse_boost("Travel=fast").is_err());
    }

    #[test]
    fn test_cli_parses_recommend_flags() {
        let cli = Cli::try_parse_from([
            "ad-recs",
            "recommend",
            "--user-id",
            "user_1",
            "--normalizer",
            "static-table",
            "--vector-mode",
            "category-accumulation",
            "--scorer",
            "keyword",
            "--boost",
            "Travel=1.5",
        ])
        .unwrap();

        match cli.command {
            Commands::Recommend {
                user_id,
                limit,
                normalizer,
                vector_mode,
                scorer,
                boosts,
                ..
            } => {
                assert_eq!(user_id, "user_1");
                assert_eq!(limit, 5);
                assert_eq!(normalizer, NormalizerPolicy::StaticTable);
                assert_eq!(vector_mode, UserVectorMode::CategoryAccumulation);
                assert_eq!(scorer, Scorer::Keyword);
                assert_eq!(boosts, vec![("Travel".to_string(), 1.5)]);
            }
            _ => panic!("expected recommend"),
        }
    }

    #[test]
    fn test_search_requires_a_filter() {
        assert!(Cli::try_parse_from(["ad-recs", "search"]).is_err());
        assert!(Cli::try_parse_from(["ad-recs", "search", "--category", "Travel", "--keyword", "x"]).is_err());
        assert!(Cli::try_parse_from(["ad-recs", "search", "--keyword", "travel"]).is_ok());
    }
}
