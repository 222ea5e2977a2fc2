//! Benchmarks for the scoring core
//!
//! Run with: cargo bench --package pipeline
//!
//! Ranks synthetic candidate sets of realistic size (384-dim embeddings,
//! a few hundred ads) with the hybrid ranker and the keyword scorer.

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Ad, CategoryWeights, EmbeddingVector};
use pipeline::{history_mean, HybridRanker, KeywordScorer, UserInterests};

const DIMENSION: usize = 384;
const CATEGORIES: [&str; 6] = ["Sports", "Travel", "Books", "Games", "Music", "Fashion"];

fn synthetic_embedding(seed: usize) -> EmbeddingVector {
    (0..DIMENSION)
        .map(|i| (((seed * 31 + i * 17) % 97) as f32 / 97.0) - 0.5)
        .collect()
}

fn synthetic_ads(count: usize) -> Vec<Ad> {
    let now = Utc::now();
    (0..count)
        .map(|i| {
            let category = CATEGORIES[i % CATEGORIES.len()];
            Ad::new(format!("ad{}", i), category, format!("{} offer {}", category, i))
                .with_keywords([category.to_lowercase(), format!("kw{}", i % 13)])
                .with_created_at(now - Duration::days((i % 45) as i64))
        })
        .collect()
}

fn bench_hybrid_rank(c: &mut Criterion) {
    let ads = synthetic_ads(300);
    let embeddings: Vec<EmbeddingVector> = (0..ads.len()).map(synthetic_embedding).collect();
    let history: Vec<EmbeddingVector> = (1000..1020).map(synthetic_embedding).collect();
    let user_vector = history_mean(&history, Some(DIMENSION)).expect("dimension is known");
    let weights: CategoryWeights = CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, c)| (c.to_string(), i as f32 / CATEGORIES.len() as f32))
        .collect();
    let ranker = HybridRanker::default();

    c.bench_function("hybrid_rank_300", |b| {
        b.iter(|| {
            let ranked = ranker.rank(
                black_box(&ads),
                black_box(&embeddings),
                black_box(&user_vector),
                black_box(&weights),
            );
            black_box(ranked)
        })
    });
}

fn bench_history_mean(c: &mut Criterion) {
    let history: Vec<EmbeddingVector> = (0..200).map(synthetic_embedding).collect();

    c.bench_function("history_mean_200", |b| {
        b.iter(|| black_box(history_mean(black_box(&history), Some(DIMENSION))))
    });
}

fn bench_keyword_rank(c: &mut Criterion) {
    let ads = synthetic_ads(300);
    let interests = UserInterests::from_categories(["sports", "travel", "kw3", "kw7"]);
    let scorer = KeywordScorer::new().with_category_boost("Travel", 1.5);
    let now = Utc::now();

    c.bench_function("keyword_rank_300", |b| {
        b.iter(|| black_box(scorer.rank(ads.clone(), black_box(&interests), now)))
    });
}

criterion_group!(benches, bench_hybrid_rank, bench_history_mean, bench_keyword_rank);
criterion_main!(benches);
