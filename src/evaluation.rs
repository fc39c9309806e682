//! # Playlist Evaluation
//!
//! Aggregate quality measures over an already-built list of track IDs:
//!
//! ```text
//! intra_list_diversity = mean over unordered pairs (i, j) of 1 - sim(tᵢ, tⱼ)
//! avg_similarity       = mean over (track, seed) pairs of sim(track, seed)
//! tag_coverage         = |{ facet:tag on any track }|
//! ```
//!
//! `sim` is combined similarity with the caller's weights. Empty inputs (no
//! pairs) score 0.
//!
//! [`similarity_folds`] is a quick sanity check of score distributions: each
//! of the first `k` tracks in turn acts as a seed against all the others.

use crate::error::{EngineError, Result};
use crate::similarity::{combined_similarity, SimilarityWeights};
use crate::store::TrackStore;
use crate::track::{Facet, Track};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    pub weights: SimilarityWeights,
}

impl EvaluationOptions {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub intra_list_diversity: f64,
    pub avg_similarity_to_seeds: f64,
    pub tag_coverage: usize,
}

/// Per-seed similarity distribution from [`similarity_folds`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    pub seed_id: String,
    pub similarities: Vec<f64>,
    pub mean: f64,
}

#[allow(clippy::cast_precision_loss)]
fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Mean pairwise dissimilarity. Fewer than two tracks score 0.
#[must_use]
pub fn intra_list_diversity(tracks: &[&Track], weights: &SimilarityWeights) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0;
    for (i, a) in tracks.iter().enumerate() {
        for b in &tracks[i + 1..] {
            total += 1.0 - combined_similarity(a, b, weights);
            pairs += 1;
        }
    }
    mean(total, pairs)
}

/// Mean similarity over every (playlist track, seed) pair.
#[must_use]
pub fn avg_similarity_to_seeds(tracks: &[&Track], seeds: &[&Track], weights: &SimilarityWeights) -> f64 {
    let total: f64 = tracks
        .iter()
        .flat_map(|t| seeds.iter().map(move |s| combined_similarity(t, s, weights)))
        .sum();
    mean(total, tracks.len() * seeds.len())
}

/// Number of distinct facet-qualified tags across the tracks.
#[must_use]
pub fn tag_coverage(tracks: &[&Track]) -> usize {
    tracks
        .iter()
        .flat_map(|track| {
            Facet::ALL.into_iter().flat_map(move |facet| {
                track
                    .facet_tags(facet)
                    .into_iter()
                    .flatten()
                    .map(move |tag| (facet, tag.as_str()))
            })
        })
        .collect::<HashSet<_>>()
        .len()
}

/// Evaluate a playlist against its seeds.
///
/// # Errors
///
/// [`EngineError::NotFound`] for any unknown ID, [`EngineError::InvalidArgument`]
/// for bad weights or an empty playlist.
pub fn evaluate(
    store: &TrackStore,
    seed_ids: &[String],
    playlist_ids: &[String],
    options: &EvaluationOptions,
) -> Result<EvaluationReport> {
    options.validate()?;
    if playlist_ids.is_empty() {
        return Err(EngineError::invalid("playlist_track_ids", "nothing to evaluate"));
    }
    let seeds = resolve(store, seed_ids)?;
    let tracks = resolve(store, playlist_ids)?;

    Ok(EvaluationReport {
        intra_list_diversity: intra_list_diversity(&tracks, &options.weights),
        avg_similarity_to_seeds: avg_similarity_to_seeds(&tracks, &seeds, &options.weights),
        tag_coverage: tag_coverage(&tracks),
    })
}

/// Treat each of the first `k` tracks as a seed and score it against the rest.
///
/// # Errors
///
/// `k` must be between 1 and the number of tracks; unknown IDs are
/// [`EngineError::NotFound`].
pub fn similarity_folds(
    store: &TrackStore,
    track_ids: &[String],
    k: usize,
    weights: &SimilarityWeights,
) -> Result<Vec<FoldResult>> {
    weights.validate()?;
    if k == 0 || k > track_ids.len() {
        return Err(EngineError::invalid(
            "k",
            format!("must be between 1 and {} (got {k})", track_ids.len()),
        ));
    }
    let tracks = resolve(store, track_ids)?;

    Ok(tracks
        .iter()
        .take(k)
        .enumerate()
        .map(|(fold, seed)| {
            let similarities: Vec<f64> = tracks
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != fold)
                .map(|(_, other)| combined_similarity(seed, other, weights))
                .collect();
            FoldResult {
                seed_id: seed.id.clone(),
                mean: mean(similarities.iter().sum(), similarities.len()),
                similarities,
            }
        })
        .collect())
}

fn resolve<'s>(store: &'s TrackStore, ids: &[String]) -> Result<Vec<&'s Track>> {
    ids.iter().map(|id| store.track(id)).collect()
}
