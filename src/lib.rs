//! Track similarity and playlist assembly over semantic tags and audio features.
//!
//! Core modules:
//! - [`similarity`] - Semantic, audio and combined similarity
//! - [`retrieval`] - Nearest-neighbour search over the corpus
//! - [`variation`] - Remix/live/cover detection and the variation policy
//! - [`playlist`] - Seed-driven playlist assembly with diversity re-ranking
//! - [`evaluation`] - Playlist quality measures
//!
//! ### Supporting Modules
//!
//! - [`track`] - Track record, facets and audio features
//! - [`store`] - Read-only corpus loaded once from two JSON files
//! - [`breakdown`] - Per-facet and per-feature similarity explanations
//! - [`fuzzy`] - Pluggable string distances
//! - [`recommender`] - Facade over all of the above
//! - [`config`] - Data directory, config file and option defaults
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start Example
//!
//! ```
//! use tagmix::playlist::{PlaylistGenerator, PlaylistOptions};
//! use tagmix::similarity::{similarity, SimilarityMode, SimilarityWeights};
//! use tagmix::store::TrackStore;
//! use tagmix::track::{Facet, Track};
//!
//! let tracks = (0..12)
//!     .map(|i| {
//!         Track::new(format!("t{i}"))
//!             .with_title(format!("Song {i}"), format!("Artist {}", i % 4))
//!             .with_tags(Facet::EmotionalTone, ["melancholy", if i % 2 == 0 { "tender" } else { "bitter" }])
//!     })
//!     .collect();
//! let store = TrackStore::from_tracks(tracks)?;
//!
//! let t0 = store.track("t0")?;
//! assert_eq!(similarity(t0, t0, SimilarityMode::Combined, &SimilarityWeights::default()), 1.0);
//!
//! let options = PlaylistOptions {
//!     min_tracks: 5,
//!     max_tracks: 8,
//!     similarity_type: SimilarityMode::Semantic,
//!     ..PlaylistOptions::default()
//! };
//! let playlist = PlaylistGenerator::new(&store).generate(&["t0".to_string()], &options)?;
//! assert!(playlist.tracks[0].is_seed);
//! assert!(playlist.tracks.len() <= 8);
//! # Ok::<(), tagmix::error::EngineError>(())
//! ```
//!
//! ## Similarity Model
//!
//! ### Semantic
//! - Four facets (emotional tone, thematic content, narrative structure,
//!   lyrical style), each compared with confidence-weighted Jaccard
//! - Tracks tagged in two or more shared facets also get a co-occurrence
//!   score (cosine over tag and cross-facet tag-pair vectors), blended 40/60
//!
//! ### Audio
//! - Weighted Euclidean distance over normalized features
//!
//! ### Combined
//! - Caller-weighted mix of the two, weights normalized on use

pub mod breakdown;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod fuzzy;
pub mod playlist;
pub mod recommender;
pub mod retrieval;
pub mod similarity;
pub mod store;
pub mod track;
pub mod variation;

pub use error::{EngineError, Result};
pub use playlist::{Playlist, PlaylistGenerator, PlaylistOptions};
pub use recommender::Recommender;
pub use store::TrackStore;
pub use track::{Facet, Track};
