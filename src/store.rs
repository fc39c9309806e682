//! In-memory track store.
//!
//! The corpus is read once from two flat JSON files (semantic tags and audio
//! features), merged by track ID and then only ever read. The store is created
//! empty, loaded exactly once and shared behind an `Arc` by everything that
//! queries it. Reads before the load completes fail with
//! [`EngineError::NotReady`].
//!
//! ## File formats
//!
//! Tags file, an array of:
//!
//! ```json
//! { "id": "t1", "name": "Hurt", "artist": "Johnny Cash", "lyrics": "...",
//!   "tags":   { "Emotional_Tone": ["melancholy"] },
//!   "scores": { "Emotional_Tone": { "melancholy": 0.9 } } }
//! ```
//!
//! Features file, an array of:
//!
//! ```json
//! { "id": "t1", "danceability": 0.4, "energy": 0.2, "tempo": 92.0, "mode": 1 }
//! ```

use crate::error::{EngineError, Result};
use crate::similarity::{LOUDNESS_RANGE, TEMPO_RANGE};
use crate::track::{AudioFeatures, Facet, Track};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Raw record from the tags file.
#[derive(Debug, Deserialize)]
struct TagRecord {
    id: String,
    name: Option<String>,
    artist: Option<String>,
    lyrics: Option<String>,
    #[serde(default)]
    tags: HashMap<String, Vec<String>>,
    #[serde(default)]
    scores: HashMap<String, HashMap<String, f64>>,
}

/// Raw record from the features file.
#[derive(Debug, Deserialize)]
struct FeatureRecord {
    id: String,
    name: Option<String>,
    artist: Option<String>,
    #[serde(flatten)]
    features: AudioFeatures,
}

#[derive(Debug, Default)]
struct Corpus {
    tracks: Vec<Track>,
    index: HashMap<String, usize>,
}

/// Summary counts over the loaded corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub track_count: usize,
    pub with_tags: usize,
    pub with_features: usize,
    pub with_lyrics: usize,
}

/// Read-only corpus of tracks, loaded once.
#[derive(Debug, Default)]
pub struct TrackStore {
    corpus: OnceLock<Corpus>,
}

impl TrackStore {
    /// Create an empty, not-yet-loaded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ready store from in-memory tracks, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateTrack`] if two tracks share an ID.
    pub fn from_tracks(tracks: Vec<Track>) -> Result<Self> {
        let store = Self::new();
        store.install(index_tracks(tracks)?)?;
        Ok(store)
    }

    /// Read and merge the tags and features files into the store.
    ///
    /// Must be called exactly once, and must complete before any query.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed files, duplicate IDs in the tags file,
    /// or if the store was already loaded.
    pub fn load_from_files(&self, tags_path: &Path, features_path: &Path) -> Result<()> {
        if self.is_loaded() {
            return Err(EngineError::invalid("store", "corpus is already loaded"));
        }

        info!(
            "Loading corpus from {} and {}",
            tags_path.display(),
            features_path.display()
        );
        let tag_records: Vec<TagRecord> = read_json(tags_path)?;
        let feature_records: Vec<FeatureRecord> = read_json(features_path)?;

        let corpus = merge_records(tag_records, feature_records)?;
        info!("Loaded {} tracks", corpus.tracks.len());
        self.install(corpus)
    }

    fn install(&self, corpus: Corpus) -> Result<()> {
        self.corpus
            .set(corpus)
            .map_err(|_| EngineError::invalid("store", "corpus is already loaded"))
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.corpus.get().is_some()
    }

    fn corpus(&self) -> Result<&Corpus> {
        self.corpus.get().ok_or(EngineError::NotReady)
    }

    /// Look up a track, returning `Ok(None)` for unknown IDs.
    pub fn get_track_by_id(&self, id: &str) -> Result<Option<&Track>> {
        let corpus = self.corpus()?;
        Ok(corpus.index.get(id).map(|&i| &corpus.tracks[i]))
    }

    /// Look up a track, treating unknown IDs as [`EngineError::NotFound`].
    pub fn track(&self, id: &str) -> Result<&Track> {
        self.get_track_by_id(id)?
            .ok_or_else(|| EngineError::not_found(id))
    }

    /// Every track, in corpus order.
    pub fn all_tracks(&self) -> Result<&[Track]> {
        Ok(&self.corpus()?.tracks)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.corpus()?.tracks.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let tracks = self.all_tracks()?;
        Ok(StoreStats {
            track_count: tracks.len(),
            with_tags: tracks.iter().filter(|t| t.has_tags()).count(),
            with_features: tracks.iter().filter(|t| t.audio().is_some()).count(),
            with_lyrics: tracks
                .iter()
                .filter(|t| t.lyrics.as_deref().is_some_and(|l| !l.trim().is_empty()))
                .count(),
        })
    }

    /// Sample up to `count` distinct tracks using the supplied RNG.
    pub fn random_tracks<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<&Track>> {
        Ok(self.all_tracks()?.choose_multiple(rng, count).collect())
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| EngineError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn index_tracks(tracks: Vec<Track>) -> Result<Corpus> {
    let mut index = HashMap::with_capacity(tracks.len());
    for (i, track) in tracks.iter().enumerate() {
        if index.insert(track.id.clone(), i).is_some() {
            return Err(EngineError::DuplicateTrack { id: track.id.clone() });
        }
    }
    Ok(Corpus { tracks, index })
}

/// Merge tag and feature records by ID.
///
/// Tag records keep their file order; feature-only tracks follow in
/// features-file order.
fn merge_records(tag_records: Vec<TagRecord>, feature_records: Vec<FeatureRecord>) -> Result<Corpus> {
    let mut corpus = index_tracks(tag_records.into_iter().map(track_from_tag_record).collect())?;

    let mut orphans = 0usize;
    for record in feature_records {
        match corpus.index.get(&record.id) {
            Some(&i) => {
                let track = &mut corpus.tracks[i];
                if track.features.is_some() {
                    warn!("Duplicate feature row for track {}; keeping the first", record.id);
                    continue;
                }
                track.features = Some(record.features);
                if track.name.is_none() {
                    track.name = record.name;
                }
                if track.artist.is_none() {
                    track.artist = record.artist;
                }
            }
            None => {
                orphans += 1;
                let track = Track {
                    id: record.id.clone(),
                    name: record.name,
                    artist: record.artist,
                    features: Some(record.features),
                    ..Track::default()
                };
                corpus.index.insert(record.id, corpus.tracks.len());
                corpus.tracks.push(track);
            }
        }
    }

    if orphans > 0 {
        warn!("{orphans} feature rows had no tag record; added as feature-only tracks");
    }
    let out_of_range = corpus
        .tracks
        .iter()
        .filter_map(|t| t.features.as_ref())
        .filter(|f| outside(f.tempo, TEMPO_RANGE) || outside(f.loudness, LOUDNESS_RANGE))
        .count();
    if out_of_range > 0 {
        warn!("{out_of_range} tracks have tempo or loudness outside the normalization range; values will be clamped");
    }
    Ok(corpus)
}

fn outside(value: Option<f64>, (lo, hi): (f64, f64)) -> bool {
    value.is_some_and(|v| v < lo || v > hi)
}

fn track_from_tag_record(record: TagRecord) -> Track {
    let mut tags: BTreeMap<Facet, BTreeSet<String>> = BTreeMap::new();
    for (facet_name, facet_tags) in record.tags {
        match facet_name.parse::<Facet>() {
            Ok(facet) => {
                let set: BTreeSet<String> = facet_tags
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                if !set.is_empty() {
                    tags.insert(facet, set);
                }
            }
            Err(_) => warn!("Track {}: ignoring unknown facet `{facet_name}`", record.id),
        }
    }

    let mut scores: BTreeMap<Facet, HashMap<String, f64>> = BTreeMap::new();
    for (facet_name, facet_scores) in record.scores {
        let Ok(facet) = facet_name.parse::<Facet>() else {
            continue;
        };
        let cleaned: HashMap<String, f64> = facet_scores
            .into_iter()
            .filter(|(_, conf)| conf.is_finite())
            .map(|(tag, conf)| (tag.trim().to_string(), conf.clamp(0.0, 1.0)))
            .collect();
        if !cleaned.is_empty() {
            scores.insert(facet, cleaned);
        }
    }

    debug!("Parsed track {} with {} tagged facets", record.id, tags.len());
    Track {
        id: record.id,
        name: record.name,
        artist: record.artist,
        tags,
        scores,
        features: None,
        lyrics: record.lyrics,
    }
}
