//! # Configuration Module
//!
//! Locates the corpus files and the option defaults used by the `tagmix`
//! binary.
//!
//! ## Data Storage
//!
//! Corpus files live in the platform-standard data directory:
//! - Linux: `~/.local/share/tagmix/`
//! - macOS: `~/Library/Application Support/tagmix/`
//! - Windows: `%APPDATA%\tagmix\`
//!
//! The directory holds `tracks.json` (tags, scores, lyrics) and
//! `features.json` (audio features).
//!
//! ## Config File
//!
//! An optional `config.json` in the platform config directory
//! (`~/.config/tagmix/config.json` on Linux) overrides the defaults:
//!
//! ```json
//! {
//!   "tracks_path": "/srv/music/tracks.json",
//!   "defaults": { "max_tracks": 50, "diversity_factor": 0.5 }
//! }
//! ```
//!
//! Command-line flags take precedence over both.

use crate::evaluation::EvaluationOptions;
use crate::playlist::PlaylistOptions;
use crate::retrieval::FindOptions;
use crate::similarity::{SimilarityMode, SimilarityWeights};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tagmix";
const TRACKS_FILE: &str = "tracks.json";
const FEATURES_FILE: &str = "features.json";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform data directory for tagmix, creating it if needed.
///
/// # Errors
///
/// Fails if the platform has no data directory or it cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Pass --tracks and --features explicitly."
        )
    })?;

    let tagmix_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&tagmix_dir).with_context(|| {
        format!(
            "Failed to create tagmix data directory at {}. Please check file permissions.",
            tagmix_dir.display()
        )
    })?;

    Ok(tagmix_dir)
}

/// Default location of the config file, if the platform has a config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Option defaults applied to every command unless overridden by flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionDefaults {
    pub min_tracks: usize,
    pub max_tracks: usize,
    pub similarity_type: SimilarityMode,
    pub diversity_factor: f64,
    pub min_similarity: f64,
    pub semantic_weight: f64,
    pub audio_weight: f64,
    pub include_seed_tracks: bool,
    pub allow_track_variations: bool,
    pub limit: usize,
}

impl Default for OptionDefaults {
    fn default() -> Self {
        let playlist = PlaylistOptions::default();
        Self {
            min_tracks: playlist.min_tracks,
            max_tracks: playlist.max_tracks,
            similarity_type: playlist.similarity_type,
            diversity_factor: playlist.diversity_factor,
            min_similarity: playlist.min_similarity,
            semantic_weight: playlist.semantic_weight,
            audio_weight: playlist.audio_weight,
            include_seed_tracks: playlist.include_seed_tracks,
            allow_track_variations: playlist.allow_track_variations,
            limit: FindOptions::default().limit,
        }
    }
}

impl OptionDefaults {
    #[must_use]
    pub fn weights(&self) -> SimilarityWeights {
        SimilarityWeights {
            semantic: self.semantic_weight,
            audio: self.audio_weight,
        }
    }

    #[must_use]
    pub fn playlist_options(&self) -> PlaylistOptions {
        PlaylistOptions {
            min_tracks: self.min_tracks,
            max_tracks: self.max_tracks,
            similarity_type: self.similarity_type,
            semantic_weight: self.semantic_weight,
            audio_weight: self.audio_weight,
            diversity_factor: self.diversity_factor,
            include_seed_tracks: self.include_seed_tracks,
            allow_track_variations: self.allow_track_variations,
            min_similarity: self.min_similarity,
        }
    }

    #[must_use]
    pub fn find_options(&self) -> FindOptions {
        FindOptions {
            limit: self.limit,
            mode: self.similarity_type,
            weights: self.weights(),
            min_similarity: self.min_similarity,
        }
    }

    #[must_use]
    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            weights: self.weights(),
        }
    }
}

/// Runtime configuration for the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Tags/scores/lyrics file
    pub tracks_path: PathBuf,
    /// Audio features file
    pub features_path: PathBuf,
    pub defaults: OptionDefaults,
}

impl Default for RuntimeConfig {
    /// Corpus files in the platform data directory. Nothing is created on disk.
    fn default() -> Self {
        let data_dir = dirs::data_dir().map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR));
        Self {
            tracks_path: data_dir.join(TRACKS_FILE),
            features_path: data_dir.join(FEATURES_FILE),
            defaults: OptionDefaults::default(),
        }
    }
}

impl RuntimeConfig {
    /// Configuration with corpus files in the platform data directory.
    pub fn new() -> Result<Self> {
        let data_dir = get_data_dir()?;
        Ok(Self::with_corpus_paths(
            data_dir.join(TRACKS_FILE),
            data_dir.join(FEATURES_FILE),
        ))
    }

    /// Configuration with explicit corpus files.
    #[must_use]
    pub fn with_corpus_paths(tracks_path: PathBuf, features_path: PathBuf) -> Self {
        Self {
            tracks_path,
            features_path,
            defaults: OptionDefaults::default(),
        }
    }

    /// Read a config file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::new();
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply command-line overrides for the corpus files.
    #[must_use]
    pub fn with_overrides(mut self, tracks: Option<PathBuf>, features: Option<PathBuf>) -> Self {
        if let Some(tracks) = tracks {
            self.tracks_path = tracks;
        }
        if let Some(features) = features {
            self.features_path = features;
        }
        self
    }
}
