//! Nearest-neighbour retrieval over the whole corpus.
//!
//! Every track is scored against the source in parallel, then results are
//! ordered by similarity (descending) with corpus position as the tiebreak,
//! so output is deterministic for a fixed corpus.

use crate::error::{EngineError, Result};
use crate::similarity::{self, SimilarityMode, SimilarityWeights};
use crate::store::TrackStore;
use crate::track::Track;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One retrieved neighbour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub track_id: String,
    pub similarity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_seed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindOptions {
    pub limit: usize,
    pub mode: SimilarityMode,
    pub weights: SimilarityWeights,
    pub min_similarity: f64,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            mode: SimilarityMode::Combined,
            weights: SimilarityWeights::default(),
            min_similarity: 0.1,
        }
    }
}

impl FindOptions {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(EngineError::invalid("limit", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(EngineError::invalid(
                "min_similarity",
                format!("must be within [0, 1] (got {})", self.min_similarity),
            ));
        }
        self.weights.validate()
    }
}

/// Top-`limit` tracks most similar to `source_id`, excluding the source.
///
/// # Errors
///
/// [`EngineError::NotFound`] if the source does not resolve, plus option
/// validation and store readiness errors.
pub fn find_similar(store: &TrackStore, source_id: &str, options: &FindOptions) -> Result<Vec<SimilarityResult>> {
    options.validate()?;
    let source = store.track(source_id)?;
    Ok(find_similar_to(source, store.all_tracks()?, options))
}

/// Same as [`find_similar`] for an already-resolved source track.
///
/// Results carry `matched_seed = source.id`.
#[must_use]
pub fn find_similar_to(source: &Track, corpus: &[Track], options: &FindOptions) -> Vec<SimilarityResult> {
    let mut scored: Vec<(usize, f64)> = corpus
        .par_iter()
        .enumerate()
        .filter(|(_, track)| track.id != source.id)
        .map(|(position, track)| {
            let score = similarity::similarity(source, track, options.mode, &options.weights);
            (position, score)
        })
        .filter(|&(_, score)| score >= options.min_similarity)
        .collect();

    debug!(
        "{} of {} tracks reach {:.2} {} similarity to {}",
        scored.len(),
        corpus.len().saturating_sub(1),
        options.min_similarity,
        options.mode,
        source.id
    );

    scored.sort_by(|(pos_a, a), (pos_b, b)| {
        b.partial_cmp(a).unwrap_or(Ordering::Equal).then(pos_a.cmp(pos_b))
    });
    scored.truncate(options.limit);

    scored
        .into_iter()
        .map(|(position, score)| SimilarityResult {
            track_id: corpus[position].id.clone(),
            similarity: score,
            matched_seed: Some(source.id.clone()),
        })
        .collect()
}
