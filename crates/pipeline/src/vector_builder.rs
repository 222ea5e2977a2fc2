//! User vector construction.
//!
//! Two modes produce the vector the candidates are compared against:
//!
//! - **History mean**: coordinate-wise mean of the embeddings of the user's
//!   raw playback categories.
//! - **Category accumulation**: sum of candidate ad embeddings whose category
//!   the user played (weight 1.0) or that the user clicked (weight 1.5),
//!   L2-normalized.
//!
//! Every embedding is conformed to the pass dimension `D`: shorter vectors
//! read as zero-padded, longer ones are truncated.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use data_loader::{Ad, EmbeddingVector};
use sources::UserSignals;
use thiserror::Error;
use tracing::{debug, warn};

use crate::similarity::l2_norm;

/// Multiplier for ads the user clicked
pub const CLICK_WEIGHT: f32 = 1.5;

/// Multiplier for ads in a category the user played
pub const PLAYBACK_WEIGHT: f32 = 1.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("embedding dimension unknown: no embeddings available")]
    UnknownDimension,
}

/// How the user vector is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserVectorMode {
    #[default]
    HistoryMean,
    CategoryAccumulation,
}

impl fmt::Display for UserVectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserVectorMode::HistoryMean => write!(f, "history-mean"),
            UserVectorMode::CategoryAccumulation => write!(f, "category-accumulation"),
        }
    }
}

impl FromStr for UserVectorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "history-mean" | "mean" => Ok(UserVectorMode::HistoryMean),
            "category-accumulation" | "accumulation" => Ok(UserVectorMode::CategoryAccumulation),
            other => Err(format!("unknown vector mode: {}", other)),
        }
    }
}

/// Pad `embeddings` with zero vectors up to `target_len`.
///
/// The padding dimension comes from the first embedding. An empty input is
/// returned unchanged since no dimension can be inferred.
pub fn pad_embeddings(mut embeddings: Vec<EmbeddingVector>, target_len: usize) -> Vec<EmbeddingVector> {
    let Some(dimension) = embeddings.first().map(Vec::len) else {
        return embeddings;
    };

    if embeddings.len() < target_len {
        warn!(
            "Got {} embeddings for {} items, padding with zero vectors of dimension {}",
            embeddings.len(),
            target_len,
            dimension
        );
        embeddings.resize(target_len, vec![0.0; dimension]);
    }
    embeddings
}

/// Scale `v` to unit length. A zero vector is returned unchanged.
pub fn l2_normalize(mut v: EmbeddingVector) -> EmbeddingVector {
    let norm = l2_norm(&v);
    if norm == 0.0 || !norm.is_finite() {
        return v;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    v
}

/// Coordinate-wise mean of `history`.
///
/// `dimension` fixes `D` when known (e.g. from the candidate embeddings);
/// otherwise it is taken from the first history embedding. Empty history
/// yields the zero vector of dimension `D`.
pub fn history_mean(
    history: &[EmbeddingVector],
    dimension: Option<usize>,
) -> Result<EmbeddingVector, VectorError> {
    let dimension = dimension
        .or_else(|| history.first().map(Vec::len))
        .ok_or(VectorError::UnknownDimension)?;

    let mut mean = vec![0.0; dimension];
    if history.is_empty() {
        return Ok(mean);
    }

    for embedding in history {
        add_scaled(&mut mean, embedding, 1.0);
    }
    let count = history.len() as f32;
    for x in mean.iter_mut() {
        *x /= count;
    }
    Ok(mean)
}

/// Accumulate the embeddings of candidate ads the user has engaged with.
///
/// `embeddings[i]` belongs to `ads[i]`; missing trailing embeddings are
/// zero-padded. Category matching is case-insensitive and an ad matching
/// both signals counts once with `CLICK_WEIGHT`.
pub fn category_accumulation(
    signals: &UserSignals,
    ads: &[Ad],
    embeddings: &[EmbeddingVector],
) -> Result<EmbeddingVector, VectorError> {
    let dimension = embeddings
        .first()
        .map(Vec::len)
        .ok_or(VectorError::UnknownDimension)?;
    let embeddings: Cow<'_, [EmbeddingVector]> = if embeddings.len() < ads.len() {
        Cow::Owned(pad_embeddings(embeddings.to_vec(), ads.len()))
    } else {
        Cow::Borrowed(embeddings)
    };

    let played: HashSet<String> = signals
        .playback_categories
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();
    let clicked: HashSet<&str> = signals.clicked_ad_ids.iter().map(String::as_str).collect();

    let mut user_vector = vec![0.0; dimension];
    let mut contributing = 0usize;

    // Padded above, so every ad has an embedding
    for (ad, embedding) in ads.iter().zip(embeddings.iter()) {
        let weight = if clicked.contains(ad.ad_id.as_str()) {
            CLICK_WEIGHT
        } else if played.contains(&ad.category.trim().to_lowercase()) {
            PLAYBACK_WEIGHT
        } else {
            continue;
        };

        add_scaled(&mut user_vector, embedding, weight);
        contributing += 1;
    }

    debug!(
        "Accumulated {} of {} candidate embeddings for user {}",
        contributing,
        ads.len(),
        signals.user_id
    );
    Ok(l2_normalize(user_vector))
}

/// `acc += scale * v`, conforming `v` to `acc.len()`
fn add_scaled(acc: &mut [f32], v: &[f32], scale: f32) {
    if v.len() != acc.len() {
        warn!(
            "Embedding dimension {} differs from {}, conforming",
            v.len(),
            acc.len()
        );
    }
    for (a, x) in acc.iter_mut().zip(v.iter()) {
        *a += scale * x;
    }
}
