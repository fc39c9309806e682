//! # Recommender
//!
//! One entry point for everything a boundary layer (CLI, HTTP handler) needs.
//! Owns a shared handle to the loaded [`TrackStore`] and wires it into
//! retrieval, playlist assembly and evaluation.
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tagmix::playlist::PlaylistOptions;
//! use tagmix::recommender::Recommender;
//! use tagmix::store::TrackStore;
//!
//! let store = TrackStore::new();
//! store.load_from_files(Path::new("tracks.json"), Path::new("features.json"))?;
//! let recommender = Recommender::new(Arc::new(store));
//!
//! let playlist = recommender.generate_playlist(&["t1".to_string()], &PlaylistOptions::default())?;
//! println!("{}: {} tracks", playlist.name, playlist.tracks.len());
//! # Ok::<(), tagmix::error::EngineError>(())
//! ```

use crate::breakdown::{self, SimilarityBreakdown};
use crate::error::Result;
use crate::evaluation::{self, EvaluationOptions, EvaluationReport, FoldResult};
use crate::playlist::{Playlist, PlaylistGenerator, PlaylistOptions};
use crate::retrieval::{self, FindOptions, SimilarityResult};
use crate::similarity::{self, SimilarityMode, SimilarityWeights};
use crate::store::TrackStore;
use rand::Rng;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Recommender {
    store: Arc<TrackStore>,
}

impl Recommender {
    #[must_use]
    pub fn new(store: Arc<TrackStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    /// Build a playlist from seed track IDs.
    ///
    /// # Errors
    ///
    /// See [`PlaylistGenerator::generate_with_rng`].
    pub fn generate_playlist(&self, seed_ids: &[String], options: &PlaylistOptions) -> Result<Playlist> {
        PlaylistGenerator::new(&self.store).generate(seed_ids, options)
    }

    /// Like [`Recommender::generate_playlist`] with a caller-supplied RNG for the playlist ID.
    pub fn generate_playlist_with_rng<R: Rng + ?Sized>(
        &self,
        seed_ids: &[String],
        options: &PlaylistOptions,
        rng: &mut R,
    ) -> Result<Playlist> {
        PlaylistGenerator::new(&self.store).generate_with_rng(seed_ids, options, rng)
    }

    pub fn find_similar_tracks(&self, track_id: &str, options: &FindOptions) -> Result<Vec<SimilarityResult>> {
        retrieval::find_similar(&self.store, track_id, options)
    }

    /// Similarity between two tracks in the given mode.
    ///
    /// # Errors
    ///
    /// [`crate::error::EngineError::NotFound`] if either ID is unknown.
    pub fn similarity(
        &self,
        track_id1: &str,
        track_id2: &str,
        mode: SimilarityMode,
        weights: &SimilarityWeights,
    ) -> Result<f64> {
        weights.validate()?;
        let a = self.store.track(track_id1)?;
        let b = self.store.track(track_id2)?;
        Ok(similarity::similarity(a, b, mode, weights))
    }

    pub fn similarity_breakdown(
        &self,
        track_id1: &str,
        track_id2: &str,
        weights: &SimilarityWeights,
    ) -> Result<SimilarityBreakdown> {
        weights.validate()?;
        let a = self.store.track(track_id1)?;
        let b = self.store.track(track_id2)?;
        Ok(breakdown::similarity_breakdown(a, b, weights))
    }

    pub fn evaluate_playlist(
        &self,
        seed_ids: &[String],
        playlist_ids: &[String],
        options: &EvaluationOptions,
    ) -> Result<EvaluationReport> {
        evaluation::evaluate(&self.store, seed_ids, playlist_ids, options)
    }

    pub fn similarity_folds(
        &self,
        track_ids: &[String],
        k: usize,
        weights: &SimilarityWeights,
    ) -> Result<Vec<FoldResult>> {
        evaluation::similarity_folds(&self.store, track_ids, k, weights)
    }
}
