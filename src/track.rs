//! Track records as held by the store: facet tags, tag confidences and audio features.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// One of the four fixed semantic tagging dimensions.
///
/// Declaration order is the canonical facet order used when keying
/// cross-facet tag pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Facet {
    #[serde(rename = "Emotional_Tone")]
    EmotionalTone,
    #[serde(rename = "Thematic_Content")]
    ThematicContent,
    #[serde(rename = "Narrative_Structure")]
    NarrativeStructure,
    #[serde(rename = "Lyrical_Style")]
    LyricalStyle,
}

impl Facet {
    pub const ALL: [Facet; 4] = [
        Facet::EmotionalTone,
        Facet::ThematicContent,
        Facet::NarrativeStructure,
        Facet::LyricalStyle,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Facet::EmotionalTone => "Emotional_Tone",
            Facet::ThematicContent => "Thematic_Content",
            Facet::NarrativeStructure => "Narrative_Structure",
            Facet::LyricalStyle => "Lyrical_Style",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facet::ALL
            .into_iter()
            .find(|facet| facet.as_str() == s)
            .ok_or_else(|| format!("unknown facet `{s}`"))
    }
}

/// Named numeric audio attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFeature {
    Danceability,
    Energy,
    Acousticness,
    Instrumentalness,
    Valence,
    Tempo,
    Loudness,
    Speechiness,
    Liveness,
    Mode,
    Popularity,
}

impl AudioFeature {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AudioFeature::Danceability => "danceability",
            AudioFeature::Energy => "energy",
            AudioFeature::Acousticness => "acousticness",
            AudioFeature::Instrumentalness => "instrumentalness",
            AudioFeature::Valence => "valence",
            AudioFeature::Tempo => "tempo",
            AudioFeature::Loudness => "loudness",
            AudioFeature::Speechiness => "speechiness",
            AudioFeature::Liveness => "liveness",
            AudioFeature::Mode => "mode",
            AudioFeature::Popularity => "popularity",
        }
    }
}

impl fmt::Display for AudioFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio attributes of a track. Every field is optional.
///
/// Natural ranges: `tempo` in BPM, `loudness` in dB (roughly -60..0),
/// `mode` is 0 (minor) or 1 (major), `popularity` is 0..100, the rest are
/// already in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub loudness: Option<f64>,
    pub speechiness: Option<f64>,
    pub liveness: Option<f64>,
    pub mode: Option<f64>,
    pub popularity: Option<f64>,
}

impl AudioFeatures {
    #[must_use]
    pub fn get(&self, feature: AudioFeature) -> Option<f64> {
        let value = match feature {
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Energy => self.energy,
            AudioFeature::Acousticness => self.acousticness,
            AudioFeature::Instrumentalness => self.instrumentalness,
            AudioFeature::Valence => self.valence,
            AudioFeature::Tempo => self.tempo,
            AudioFeature::Loudness => self.loudness,
            AudioFeature::Speechiness => self.speechiness,
            AudioFeature::Liveness => self.liveness,
            AudioFeature::Mode => self.mode,
            AudioFeature::Popularity => self.popularity,
        };
        value.filter(|v| v.is_finite())
    }

    /// True when no attribute carries a usable value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            self.danceability,
            self.energy,
            self.acousticness,
            self.instrumentalness,
            self.valence,
            self.tempo,
            self.loudness,
            self.speechiness,
            self.liveness,
            self.mode,
            self.popularity,
        ]
        .iter()
        .all(|v| v.map_or(true, |v| !v.is_finite()))
    }
}

/// A track as loaded into memory. Never mutated after load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: Option<String>,
    pub artist: Option<String>,
    /// Facet → set of tags. Facets without tags are simply absent.
    #[serde(default)]
    pub tags: BTreeMap<Facet, BTreeSet<String>>,
    /// Facet → tag → confidence in [0, 1]. May be sparse.
    #[serde(default)]
    pub scores: BTreeMap<Facet, HashMap<String, f64>>,
    pub features: Option<AudioFeatures>,
    pub lyrics: Option<String>,
}

impl Track {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Tags for `facet`, or `None` when the facet is missing or empty.
    #[must_use]
    pub fn facet_tags(&self, facet: Facet) -> Option<&BTreeSet<String>> {
        self.tags.get(&facet).filter(|tags| !tags.is_empty())
    }

    /// Stored confidence for a tag, if any.
    #[must_use]
    pub fn confidence(&self, facet: Facet, tag: &str) -> Option<f64> {
        self.scores.get(&facet).and_then(|scores| scores.get(tag)).copied()
    }

    #[must_use]
    pub fn has_tags(&self) -> bool {
        Facet::ALL.iter().any(|&facet| self.facet_tags(facet).is_some())
    }

    /// Audio features, treating an all-empty record as absent.
    #[must_use]
    pub fn audio(&self) -> Option<&AudioFeatures> {
        self.features.as_ref().filter(|features| !features.is_empty())
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(UNKNOWN_TRACK)
    }

    #[must_use]
    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().filter(|a| !a.trim().is_empty()).unwrap_or(UNKNOWN_ARTIST)
    }

    /// Builder-style helper: set tags for a facet.
    #[must_use]
    pub fn with_tags<I, S>(mut self, facet: Facet, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.insert(facet, tags.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style helper: set a tag confidence.
    #[must_use]
    pub fn with_score(mut self, facet: Facet, tag: impl Into<String>, confidence: f64) -> Self {
        self.scores.entry(facet).or_default().insert(tag.into(), confidence);
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: AudioFeatures) -> Self {
        self.features = Some(features);
        self
    }

    #[must_use]
    pub fn with_title(mut self, name: impl Into<String>, artist: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = Some(lyrics.into());
        self
    }
}
