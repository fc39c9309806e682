//! # Playlist Assembly
//!
//! Builds an ordered playlist from one or more seed tracks:
//!
//! 1. Resolve the seeds (unknown IDs are skipped; none resolving is an error).
//! 2. Retrieve up to `2 * max_tracks` neighbours per seed.
//! 3. Merge across seeds, keeping each candidate's best score.
//! 4. Apply the variation policy ([`VariationResolver`]).
//! 5. Re-rank for diversity ([`RerankStrategy`]).
//! 6. Prepend the seeds, cap at `max_tracks`, enforce `min_tracks`.
//!
//! ## Diversity re-ranking
//!
//! The default [`GreedyDiversityReranker`] starts from the most similar
//! candidate and repeatedly picks the candidate maximising
//!
//! ```text
//! score(c) = similarity(c) · (1 - f) + mean_{s ∈ selected}(1 - sim₅₀/₅₀(c, s)) · f
//! ```
//!
//! where `f` is the diversity factor and `sim₅₀/₅₀` is combined similarity
//! with an even semantic/audio split.

use crate::error::{EngineError, Result};
use crate::fuzzy::{NormalizedLevenshtein, StringDistance};
use crate::retrieval::{self, FindOptions};
use crate::similarity::{combined_similarity, SimilarityMode, SimilarityWeights, DIVERSITY_WEIGHTS};
use crate::store::TrackStore;
use crate::track::Track;
use crate::variation::VariationResolver;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Upper bound on `max_tracks`.
pub const MAX_TRACKS_CAP: usize = 100;

/// Playlist generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistOptions {
    pub min_tracks: usize,
    pub max_tracks: usize,
    pub similarity_type: SimilarityMode,
    pub semantic_weight: f64,
    pub audio_weight: f64,
    pub diversity_factor: f64,
    pub include_seed_tracks: bool,
    pub allow_track_variations: bool,
    pub min_similarity: f64,
}

impl Default for PlaylistOptions {
    fn default() -> Self {
        Self {
            min_tracks: 10,
            max_tracks: 30,
            similarity_type: SimilarityMode::Combined,
            semantic_weight: 0.5,
            audio_weight: 0.5,
            diversity_factor: 0.3,
            include_seed_tracks: true,
            allow_track_variations: true,
            min_similarity: 0.1,
        }
    }
}

impl PlaylistOptions {
    #[must_use]
    pub fn weights(&self) -> SimilarityWeights {
        SimilarityWeights {
            semantic: self.semantic_weight,
            audio: self.audio_weight,
        }
    }

    /// Check ranges: `1 <= min_tracks <= max_tracks <= 100`,
    /// `diversity_factor` and `min_similarity` in [0, 1], weights non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.max_tracks == 0 || self.max_tracks > MAX_TRACKS_CAP {
            return Err(EngineError::invalid(
                "max_tracks",
                format!("must be between 1 and {MAX_TRACKS_CAP} (got {})", self.max_tracks),
            ));
        }
        if self.min_tracks == 0 || self.min_tracks > self.max_tracks {
            return Err(EngineError::invalid(
                "min_tracks",
                format!("must be between 1 and max_tracks={} (got {})", self.max_tracks, self.min_tracks),
            ));
        }
        if !self.diversity_factor.is_finite() || !(0.0..=1.0).contains(&self.diversity_factor) {
            return Err(EngineError::invalid(
                "diversity_factor",
                format!("must be within [0, 1] (got {})", self.diversity_factor),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(EngineError::invalid(
                "min_similarity",
                format!("must be within [0, 1] (got {})", self.min_similarity),
            ));
        }
        self.weights().validate()
    }
}

/// A track under consideration for the playlist.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub track: &'a Track,
    pub similarity: f64,
    pub matched_seed: Option<String>,
    pub is_variation: bool,
    pub variation_of: Option<String>,
    /// Number of mutual variations this candidate stands in for.
    pub variation_group_size: Option<usize>,
}

impl<'a> Candidate<'a> {
    #[must_use]
    pub fn new(track: &'a Track, similarity: f64, matched_seed: Option<String>) -> Self {
        Self {
            track,
            similarity,
            matched_seed,
            is_variation: false,
            variation_of: None,
            variation_group_size: None,
        }
    }
}

/// One entry of a finished playlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistTrack {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub similarity: f64,
    pub is_seed: bool,
    pub is_variation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_of: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_group_size: Option<usize>,
}

impl PlaylistTrack {
    fn seed(track: &Track) -> Self {
        Self {
            track_id: track.id.clone(),
            name: track.display_name().to_string(),
            artist: track.display_artist().to_string(),
            similarity: 1.0,
            is_seed: true,
            is_variation: false,
            variation_of: None,
            matched_seed: None,
            variation_group_size: None,
        }
    }
}

impl From<Candidate<'_>> for PlaylistTrack {
    fn from(candidate: Candidate<'_>) -> Self {
        Self {
            track_id: candidate.track.id.clone(),
            name: candidate.track.display_name().to_string(),
            artist: candidate.track.display_artist().to_string(),
            similarity: candidate.similarity,
            is_seed: false,
            is_variation: candidate.is_variation,
            variation_of: candidate.variation_of,
            matched_seed: candidate.matched_seed,
            variation_group_size: candidate.variation_group_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistStats {
    pub track_count: usize,
    pub seed_count: usize,
    /// Mean similarity of the non-seed tracks; 0 if there are none.
    pub avg_similarity: f64,
    pub unique_artists: usize,
    pub variation_count: usize,
}

impl PlaylistStats {
    fn from_tracks(tracks: &[PlaylistTrack]) -> Self {
        let recommended: Vec<f64> = tracks.iter().filter(|t| !t.is_seed).map(|t| t.similarity).collect();
        #[allow(clippy::cast_precision_loss)]
        let avg_similarity = if recommended.is_empty() {
            0.0
        } else {
            recommended.iter().sum::<f64>() / recommended.len() as f64
        };

        Self {
            track_count: tracks.len(),
            seed_count: tracks.iter().filter(|t| t.is_seed).count(),
            avg_similarity,
            unique_artists: tracks.iter().map(|t| t.artist.as_str()).collect::<HashSet<_>>().len(),
            variation_count: tracks.iter().filter(|t| t.is_variation).count(),
        }
    }
}

/// A finished playlist. Built fresh per request and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub tracks: Vec<PlaylistTrack>,
    pub seed_track_ids: Vec<String>,
    pub options: PlaylistOptions,
    pub stats: PlaylistStats,
}

// =============================================================================
// RE-RANKING STRATEGIES
// =============================================================================

/// Orders candidates and keeps at most `take` of them.
pub trait RerankStrategy: Send + Sync {
    fn rerank<'a>(&self, candidates: Vec<Candidate<'a>>, take: usize, diversity_factor: f64) -> Vec<Candidate<'a>>;
}

/// Plain similarity ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityOnlyReranker;

impl RerankStrategy for SimilarityOnlyReranker {
    fn rerank<'a>(&self, mut candidates: Vec<Candidate<'a>>, take: usize, _diversity_factor: f64) -> Vec<Candidate<'a>> {
        sort_by_similarity(&mut candidates);
        candidates.truncate(take);
        candidates
    }
}

/// Greedy diversity-aware selection (maximal-marginal-relevance style).
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyDiversityReranker;

impl RerankStrategy for GreedyDiversityReranker {
    fn rerank<'a>(&self, mut candidates: Vec<Candidate<'a>>, take: usize, diversity_factor: f64) -> Vec<Candidate<'a>> {
        sort_by_similarity(&mut candidates);
        if diversity_factor <= 0.0 || candidates.len() < 2 {
            debug!("Skipping diversity re-rank (factor {diversity_factor}, {} candidates)", candidates.len());
            candidates.truncate(take);
            return candidates;
        }
        if take == 0 {
            return Vec::new();
        }

        let mut remaining = candidates;
        let mut selected = vec![remaining.remove(0)];
        // Running Σ(1 - sim(candidate, selected)) for each remaining candidate.
        let mut diversity_sums: Vec<f64> = remaining
            .iter()
            .map(|c| 1.0 - combined_similarity(c.track, selected[0].track, &DIVERSITY_WEIGHTS))
            .collect();

        while selected.len() < take && !remaining.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let selected_count = selected.len() as f64;

            let mut best_idx = 0;
            let mut best_score = f64::NEG_INFINITY;
            for (idx, candidate) in remaining.iter().enumerate() {
                let avg_diversity = diversity_sums[idx] / selected_count;
                let score = candidate.similarity * (1.0 - diversity_factor) + avg_diversity * diversity_factor;
                if score > best_score {
                    best_score = score;
                    best_idx = idx;
                }
            }

            let chosen = remaining.remove(best_idx);
            diversity_sums.remove(best_idx);
            log::trace!("Selected {} (score {best_score:.4})", chosen.track.id);

            for (candidate, sum) in remaining.iter().zip(diversity_sums.iter_mut()) {
                *sum += 1.0 - combined_similarity(candidate.track, chosen.track, &DIVERSITY_WEIGHTS);
            }
            selected.push(chosen);
        }

        selected
    }
}

fn sort_by_similarity(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Playlist generator over a loaded store.
pub struct PlaylistGenerator<'s, R = GreedyDiversityReranker, D = NormalizedLevenshtein>
where
    R: RerankStrategy,
    D: StringDistance,
{
    store: &'s TrackStore,
    reranker: R,
    variations: VariationResolver<D>,
}

impl<'s> PlaylistGenerator<'s> {
    #[must_use]
    pub fn new(store: &'s TrackStore) -> Self {
        Self {
            store,
            reranker: GreedyDiversityReranker,
            variations: VariationResolver::default(),
        }
    }
}

impl<'s, R: RerankStrategy, D: StringDistance> PlaylistGenerator<'s, R, D> {
    /// Swap the re-ranking strategy.
    pub fn with_reranker<R2: RerankStrategy>(self, reranker: R2) -> PlaylistGenerator<'s, R2, D> {
        PlaylistGenerator {
            store: self.store,
            reranker,
            variations: self.variations,
        }
    }

    /// Swap the variation resolver.
    pub fn with_variation_resolver<D2: StringDistance>(
        self,
        variations: VariationResolver<D2>,
    ) -> PlaylistGenerator<'s, R, D2> {
        PlaylistGenerator {
            store: self.store,
            reranker: self.reranker,
            variations,
        }
    }

    /// Generate a playlist, drawing the playlist ID from OS entropy.
    ///
    /// # Errors
    ///
    /// See [`PlaylistGenerator::generate_with_rng`].
    pub fn generate(&self, seed_ids: &[String], options: &PlaylistOptions) -> Result<Playlist> {
        self.generate_with_rng(seed_ids, options, &mut StdRng::from_entropy())
    }

    /// Generate a playlist using `rng` for the playlist ID.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidArgument`] for bad options, an empty seed list,
    ///   no resolvable seeds, or more seeds than `max_tracks`
    /// - [`EngineError::InsufficientResults`] if fewer than `min_tracks` remain
    /// - [`EngineError::NotReady`] if the store is not loaded
    pub fn generate_with_rng<G: Rng + ?Sized>(
        &self,
        seed_ids: &[String],
        options: &PlaylistOptions,
        rng: &mut G,
    ) -> Result<Playlist> {
        options.validate()?;
        let seeds = self.resolve_seeds(seed_ids)?;
        if options.include_seed_tracks && seeds.len() > options.max_tracks {
            return Err(EngineError::invalid(
                "seed_track_ids",
                format!("{} seeds do not fit in max_tracks={}", seeds.len(), options.max_tracks),
            ));
        }
        info!("Generating playlist from {} seeds", seeds.len());

        let candidates = self.gather_candidates(&seeds, options)?;
        debug!("{} unique candidates after merging", candidates.len());

        let candidates = self
            .variations
            .apply(candidates, &seeds, options.allow_track_variations);
        debug!("{} candidates after variation policy", candidates.len());

        let slots = if options.include_seed_tracks {
            options.max_tracks - seeds.len()
        } else {
            options.max_tracks
        };
        let ranked = self.reranker.rerank(candidates, slots, options.diversity_factor);

        let mut tracks: Vec<PlaylistTrack> = Vec::with_capacity(options.max_tracks);
        if options.include_seed_tracks {
            tracks.extend(seeds.iter().map(|seed| PlaylistTrack::seed(seed)));
        }
        tracks.extend(ranked.into_iter().map(PlaylistTrack::from));
        tracks.truncate(options.max_tracks);

        validate_playlist_size(&tracks, options)?;

        let playlist = Playlist {
            id: format!("pl-{:016x}", rng.gen::<u64>()),
            name: playlist_name(&seeds),
            stats: PlaylistStats::from_tracks(&tracks),
            seed_track_ids: seeds.iter().map(|s| s.id.clone()).collect(),
            options: options.clone(),
            tracks,
        };
        info!(
            "Generated \"{}\" with {} tracks (avg similarity {:.3})",
            playlist.name, playlist.stats.track_count, playlist.stats.avg_similarity
        );
        Ok(playlist)
    }

    fn resolve_seeds(&self, seed_ids: &[String]) -> Result<Vec<&'s Track>> {
        if seed_ids.is_empty() {
            return Err(EngineError::invalid("seed_track_ids", "at least one seed track is required"));
        }

        let mut seen = HashSet::new();
        let mut seeds = Vec::new();
        for id in seed_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.store.get_track_by_id(id)? {
                Some(track) => seeds.push(track),
                None => warn!("Skipping unknown seed track {id}"),
            }
        }

        if seeds.is_empty() {
            return Err(EngineError::invalid("seed_track_ids", "none of the seed tracks were found"));
        }
        Ok(seeds)
    }

    /// Retrieve neighbours for every seed and keep each track's best score.
    fn gather_candidates(&self, seeds: &[&'s Track], options: &PlaylistOptions) -> Result<Vec<Candidate<'s>>> {
        let corpus = self.store.all_tracks()?;
        let find = FindOptions {
            limit: options.max_tracks * 2,
            mode: options.similarity_type,
            weights: options.weights(),
            min_similarity: options.min_similarity,
        };
        let seed_ids: HashSet<&str> = seeds.iter().map(|s| s.id.as_str()).collect();

        let mut merged: Vec<Candidate<'s>> = Vec::new();
        let mut positions: HashMap<&'s str, usize> = HashMap::new();

        for seed in seeds {
            for result in retrieval::find_similar_to(seed, corpus, &find) {
                if options.include_seed_tracks && seed_ids.contains(result.track_id.as_str()) {
                    continue;
                }
                let track = self.store.track(&result.track_id)?;
                match positions.get(track.id.as_str()) {
                    Some(&pos) => {
                        if result.similarity > merged[pos].similarity {
                            merged[pos].similarity = result.similarity;
                            merged[pos].matched_seed = result.matched_seed;
                        }
                    }
                    None => {
                        positions.insert(track.id.as_str(), merged.len());
                        merged.push(Candidate::new(track, result.similarity, result.matched_seed));
                    }
                }
            }
        }

        Ok(merged)
    }
}

/// Fail rather than hand back a playlist shorter than asked for.
fn validate_playlist_size(tracks: &[PlaylistTrack], options: &PlaylistOptions) -> Result<()> {
    if tracks.len() < options.min_tracks {
        warn!(
            "Playlist too short: {} tracks (minimum: {})",
            tracks.len(),
            options.min_tracks
        );
        return Err(EngineError::InsufficientResults {
            found: tracks.len(),
            required: options.min_tracks,
        });
    }
    Ok(())
}

/// Human-readable playlist title derived from the seeds.
#[must_use]
pub fn playlist_name(seeds: &[&Track]) -> String {
    match seeds {
        [] => "Untitled Mix".to_string(),
        [only] => format!("Songs like {} by {}", only.display_name(), only.display_artist()),
        [first, second] => format!("Mix of {} and {}", first.display_artist(), second.display_artist()),
        [first, second, rest @ ..] => format!(
            "Mix of {}, {}, and {} more",
            first.display_artist(),
            second.display_artist(),
            rest.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Facet;

    fn tagged(id: &str, tags: &[&str]) -> Track {
        Track::new(id)
            .with_title(format!("Title {id}"), format!("Artist {id}"))
            .with_tags(Facet::EmotionalTone, tags.iter().copied())
    }

    #[test]
    fn test_option_validation() {
        assert!(PlaylistOptions::default().validate().is_ok());

        let cases = [
            PlaylistOptions { max_tracks: 0, ..PlaylistOptions::default() },
            PlaylistOptions { max_tracks: 101, ..PlaylistOptions::default() },
            PlaylistOptions { min_tracks: 0, ..PlaylistOptions::default() },
            PlaylistOptions { min_tracks: 31, ..PlaylistOptions::default() },
            PlaylistOptions { diversity_factor: 1.5, ..PlaylistOptions::default() },
            PlaylistOptions { semantic_weight: -1.0, ..PlaylistOptions::default() },
        ];
        for options in cases {
            assert_eq!(options.validate().unwrap_err().kind(), "invalid_argument", "{options:?}");
        }
    }

    #[test]
    fn test_playlist_names() {
        let a = Track::new("a").with_title("Hurt", "Johnny Cash");
        let b = Track::new("b").with_title("Pink Moon", "Nick Drake");
        let c = Track::new("c");
        let d = Track::new("d");

        assert_eq!(playlist_name(&[&a]), "Songs like Hurt by Johnny Cash");
        assert_eq!(playlist_name(&[&a, &b]), "Mix of Johnny Cash and Nick Drake");
        assert_eq!(
            playlist_name(&[&a, &b, &c, &d]),
            "Mix of Johnny Cash, Nick Drake, and 2 more"
        );
        assert_eq!(playlist_name(&[&c]), "Songs like Unknown Track by Unknown Artist");
    }

    #[test]
    fn test_greedy_rerank_prefers_diverse_candidates() {
        let near_a = tagged("near_a", &["calm", "warm"]);
        let near_b = tagged("near_b", &["calm", "warm"]);
        let far = tagged("far", &["angry"]);

        let candidates = vec![
            Candidate::new(&near_a, 0.9, None),
            Candidate::new(&near_b, 0.85, None),
            Candidate::new(&far, 0.6, None),
        ];

        let plain = GreedyDiversityReranker.rerank(candidates.clone(), 3, 0.0);
        let ids: Vec<_> = plain.iter().map(|c| c.track.id.as_str()).collect();
        assert_eq!(ids, ["near_a", "near_b", "far"]);

        let diverse = GreedyDiversityReranker.rerank(candidates, 3, 0.8);
        let ids: Vec<_> = diverse.iter().map(|c| c.track.id.as_str()).collect();
        assert_eq!(ids, ["near_a", "far", "near_b"]);
    }

    #[test]
    fn test_rerank_respects_take() {
        let tracks: Vec<Track> = (0..6).map(|i| tagged(&format!("t{i}"), &["x"])).collect();
        let candidates: Vec<_> = tracks
            .iter()
            .enumerate()
            .map(|(i, t)| Candidate::new(t, 1.0 - i as f64 * 0.1, None))
            .collect();

        assert_eq!(GreedyDiversityReranker.rerank(candidates.clone(), 4, 0.5).len(), 4);
        assert!(GreedyDiversityReranker.rerank(candidates.clone(), 0, 0.5).is_empty());
        assert_eq!(SimilarityOnlyReranker.rerank(candidates, 2, 0.9).len(), 2);
    }

    #[test]
    fn test_stats_exclude_seeds_from_average() {
        let seed = Track::new("s").with_title("Seed", "A");
        let mut tracks = vec![PlaylistTrack::seed(&seed)];
        let other = Track::new("o").with_title("Other", "B");
        let mut item = PlaylistTrack::from(Candidate::new(&other, 0.4, Some("s".into())));
        item.is_variation = true;
        tracks.push(item);

        let stats = PlaylistStats::from_tracks(&tracks);
        assert_eq!(stats.track_count, 2);
        assert_eq!(stats.seed_count, 1);
        assert!((stats.avg_similarity - 0.4).abs() < 1e-12);
        assert_eq!(stats.unique_artists, 2);
        assert_eq!(stats.variation_count, 1);
    }

    #[test]
    fn test_merge_keeps_best_score_per_candidate() {
        let store = TrackStore::from_tracks(vec![
            tagged("s1", &["calm", "warm"]),
            tagged("s2", &["calm", "cold"]),
            tagged("both", &["calm", "cold", "x"]),
        ])
        .unwrap();

        let generator = PlaylistGenerator::new(&store);
        let seeds = vec![store.track("s1").unwrap(), store.track("s2").unwrap()];
        let options = PlaylistOptions {
            similarity_type: SimilarityMode::Semantic,
            min_similarity: 0.05,
            ..PlaylistOptions::default()
        };
        let candidates = generator.gather_candidates(&seeds, &options).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].track.id, "both");
        assert_eq!(candidates[0].matched_seed.as_deref(), Some("s2"));
    }

    #[test]
    fn test_empty_and_unknown_seeds_rejected() {
        let store = TrackStore::from_tracks(vec![tagged("a", &["x"])]).unwrap();
        let generator = PlaylistGenerator::new(&store);

        let err = generator.generate(&[], &PlaylistOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");

        let err = generator
            .generate(&["nope".to_string()], &PlaylistOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }
}
