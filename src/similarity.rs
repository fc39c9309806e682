//! Track-to-track similarity: semantic (tag facets), audio (features) and
//! their weighted combination.
//!
//! All scores are in [0, 1]. Two tracks with the same ID always score exactly
//! 1, whatever the mode.

use crate::error::{EngineError, Result};
use crate::track::{AudioFeature, AudioFeatures, Facet, Track};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fixed per-facet weights for the basic semantic score.
pub const FACET_WEIGHTS: [(Facet, f64); 4] = [
    (Facet::EmotionalTone, 0.4),
    (Facet::ThematicContent, 0.3),
    (Facet::NarrativeStructure, 0.1),
    (Facet::LyricalStyle, 0.2),
];

/// Fixed per-feature weights for audio distance. Sums to 1.0.
///
/// `popularity` is carried on tracks but deliberately unweighted.
pub const FEATURE_WEIGHTS: [(AudioFeature, f64); 10] = [
    (AudioFeature::Danceability, 0.15),
    (AudioFeature::Energy, 0.15),
    (AudioFeature::Acousticness, 0.1),
    (AudioFeature::Instrumentalness, 0.1),
    (AudioFeature::Valence, 0.15),
    (AudioFeature::Tempo, 0.1),
    (AudioFeature::Loudness, 0.05),
    (AudioFeature::Speechiness, 0.1),
    (AudioFeature::Liveness, 0.05),
    (AudioFeature::Mode, 0.05),
];

pub const TEMPO_RANGE: (f64, f64) = (40.0, 200.0);
pub const LOUDNESS_RANGE: (f64, f64) = (-60.0, 0.0);

const BASIC_BLEND: f64 = 0.4;
const CO_OCCURRENCE_BLEND: f64 = 0.6;

/// Which similarity measure to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMode {
    Semantic,
    Audio,
    #[default]
    Combined,
}

impl SimilarityMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SimilarityMode::Semantic => "semantic",
            SimilarityMode::Audio => "audio",
            SimilarityMode::Combined => "combined",
        }
    }
}

impl fmt::Display for SimilarityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semantic" => Ok(SimilarityMode::Semantic),
            "audio" => Ok(SimilarityMode::Audio),
            "combined" => Ok(SimilarityMode::Combined),
            other => Err(EngineError::invalid(
                "similarity_type",
                format!("unknown similarity type `{other}` (expected semantic, audio or combined)"),
            )),
        }
    }
}

/// Relative weights of the semantic and audio scores in combined mode.
///
/// Weights need not sum to 1; they are normalized on use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub semantic: f64,
    pub audio: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            semantic: 0.5,
            audio: 0.5,
        }
    }
}

/// Even split used to measure diversity between candidates, independent of
/// what the caller asked for.
pub const DIVERSITY_WEIGHTS: SimilarityWeights = SimilarityWeights {
    semantic: 0.5,
    audio: 0.5,
};

impl SimilarityWeights {
    /// Build validated weights.
    ///
    /// # Errors
    ///
    /// Negative or non-finite weights are rejected.
    pub fn new(semantic: f64, audio: f64) -> Result<Self> {
        let weights = Self { semantic, audio };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        for (param, value) in [("semantic_weight", self.semantic), ("audio_weight", self.audio)] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid(
                    param,
                    format!("must be a finite, non-negative number (got {value})"),
                ));
            }
        }
        Ok(())
    }

    /// Weights scaled to sum to 1, or `None` when both are zero.
    #[must_use]
    pub fn normalized(&self) -> Option<(f64, f64)> {
        let total = self.semantic + self.audio;
        (total > 0.0).then(|| (self.semantic / total, self.audio / total))
    }
}

/// Weight of a facet in the basic semantic score.
#[must_use]
pub fn facet_weight(facet: Facet) -> f64 {
    FACET_WEIGHTS
        .iter()
        .find(|(f, _)| *f == facet)
        .map_or(0.0, |(_, w)| *w)
}

// =============================================================================
// SEMANTIC SIMILARITY
// =============================================================================

/// Similarity of one facet shared by both tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacetScore {
    pub facet: Facet,
    pub similarity: f64,
    pub weight: f64,
}

/// Intermediate results of the semantic computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticParts {
    /// Facets tagged on both sides, in canonical order.
    pub facets: Vec<FacetScore>,
    /// Average of `similarity * weight` over `facets`.
    pub basic: f64,
    /// Cosine over tag/tag-pair vectors; only when 2+ facets qualify.
    pub co_occurrence: Option<f64>,
}

impl SemanticParts {
    #[must_use]
    pub fn score(&self) -> f64 {
        match self.co_occurrence {
            Some(co) => BASIC_BLEND * self.basic + CO_OCCURRENCE_BLEND * co,
            None => self.basic,
        }
    }
}

/// Confidence-weighted Jaccard for one facet, or `None` if either track lacks
/// tags for it.
///
/// ```text
/// J = Σ min(confA(t), confB(t)) / Σ max(confA(t), confB(t))   over t ∈ A ∪ B
/// ```
///
/// Missing confidences count as 0. If both sums come out at 0 the plain set
/// Jaccard `|A ∩ B| / |A ∪ B|` is used instead.
#[must_use]
pub fn facet_similarity(a: &Track, b: &Track, facet: Facet) -> Option<f64> {
    let tags_a = a.facet_tags(facet)?;
    let tags_b = b.facet_tags(facet)?;

    let mut intersection = 0.0;
    let mut union = 0.0;
    for tag in tags_a.union(tags_b) {
        let conf_a = if tags_a.contains(tag) { a.confidence(facet, tag).unwrap_or(0.0) } else { 0.0 };
        let conf_b = if tags_b.contains(tag) { b.confidence(facet, tag).unwrap_or(0.0) } else { 0.0 };
        intersection += conf_a.min(conf_b);
        union += conf_a.max(conf_b);
    }

    if intersection == 0.0 && union == 0.0 {
        let shared = tags_a.intersection(tags_b).count();
        let total = tags_a.union(tags_b).count();
        #[allow(clippy::cast_precision_loss)]
        return Some(if total == 0 { 0.0 } else { shared as f64 / total as f64 });
    }

    Some(if union > 0.0 { intersection / union } else { 0.0 })
}

/// Run the semantic computation and keep the intermediate values.
#[must_use]
pub fn semantic_parts(a: &Track, b: &Track) -> SemanticParts {
    let facets: Vec<FacetScore> = FACET_WEIGHTS
        .iter()
        .filter_map(|&(facet, weight)| {
            facet_similarity(a, b, facet).map(|similarity| FacetScore {
                facet,
                similarity,
                weight,
            })
        })
        .collect();

    if facets.is_empty() {
        return SemanticParts {
            facets,
            basic: 0.0,
            co_occurrence: None,
        };
    }

    // Divides by the number of facets, not by the sum of their weights.
    let weighted_sum: f64 = facets.iter().map(|f| f.similarity * f.weight).sum();
    #[allow(clippy::cast_precision_loss)]
    let basic = weighted_sum / facets.len() as f64;

    let co_occurrence = (facets.len() >= 2)
        .then(|| cosine_similarity(&tag_vector(a), &tag_vector(b)));

    SemanticParts {
        facets,
        basic,
        co_occurrence,
    }
}

/// Semantic similarity between two tracks.
#[must_use]
pub fn semantic_similarity(a: &Track, b: &Track) -> f64 {
    if a.id == b.id {
        return 1.0;
    }
    semantic_parts(a, b).score()
}

/// Key of a single-tag entry in a tag vector.
#[must_use]
pub fn tag_key(facet: Facet, tag: &str) -> String {
    format!("{facet}:{tag}")
}

/// Key of a cross-facet pair entry in a tag vector.
#[must_use]
pub fn pair_key(facet1: Facet, tag1: &str, facet2: Facet, tag2: &str) -> String {
    format!("{facet1}:{tag1}|{facet2}:{tag2}")
}

/// Sparse tag vector for co-occurrence similarity.
///
/// Contains one entry per tag (`facet:tag` → confidence) and one per pair of
/// tags from two different facets (`f1:t1|f2:t2` → product of confidences),
/// with pairs keyed in canonical facet order. Missing confidences count as 1.
#[must_use]
pub fn tag_vector(track: &Track) -> BTreeMap<String, f64> {
    let tagged: Vec<(Facet, Vec<(&str, f64)>)> = Facet::ALL
        .iter()
        .filter_map(|&facet| {
            track.facet_tags(facet).map(|tags| {
                let weighted = tags
                    .iter()
                    .map(|tag| (tag.as_str(), track.confidence(facet, tag).unwrap_or(1.0)))
                    .collect();
                (facet, weighted)
            })
        })
        .collect();

    let mut vector = BTreeMap::new();
    for (facet, tags) in &tagged {
        for &(tag, conf) in tags {
            vector.insert(tag_key(*facet, tag), conf);
        }
    }

    for (i, (facet1, tags1)) in tagged.iter().enumerate() {
        for (facet2, tags2) in &tagged[i + 1..] {
            for &(tag1, conf1) in tags1 {
                for &(tag2, conf2) in tags2 {
                    vector.insert(pair_key(*facet1, tag1, *facet2, tag2), conf1 * conf2);
                }
            }
        }
    }

    vector
}

/// Cosine similarity between two sparse vectors; 0 if either norm is 0.
#[must_use]
pub fn cosine_similarity(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(key, va)| b.get(key).map(|vb| va * vb))
        .sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}

// =============================================================================
// AUDIO SIMILARITY
// =============================================================================

/// Map a raw feature value onto [0, 1].
///
/// Tempo uses the 40..200 BPM domain, loudness -60..0 dB; values outside the
/// domain are clamped. Everything else is assumed to be in [0, 1] already.
#[must_use]
pub fn normalize_feature(feature: AudioFeature, value: f64) -> f64 {
    match feature {
        AudioFeature::Tempo => min_max(value, TEMPO_RANGE),
        AudioFeature::Loudness => min_max(value, LOUDNESS_RANGE),
        _ => value,
    }
}

#[inline]
fn min_max(value: f64, (lo, hi): (f64, f64)) -> f64 {
    ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Absolute difference between two values of one feature, after normalization.
/// `mode` is binary: 0 when equal, 1 otherwise.
#[must_use]
pub fn feature_difference(feature: AudioFeature, a: f64, b: f64) -> f64 {
    match feature {
        AudioFeature::Mode => {
            if a.round() == b.round() {
                0.0
            } else {
                1.0
            }
        }
        _ => (normalize_feature(feature, a) - normalize_feature(feature, b)).abs(),
    }
}

/// Weighted Euclidean-style similarity over the features both sides carry.
///
/// ```text
/// sim = 1 - min(1, sqrt( Σ w·diff² / Σ w ))
/// ```
#[must_use]
pub fn feature_similarity(a: &AudioFeatures, b: &AudioFeatures) -> f64 {
    let mut sum_sq = 0.0;
    let mut total_weight = 0.0;

    for &(feature, weight) in &FEATURE_WEIGHTS {
        if let (Some(va), Some(vb)) = (a.get(feature), b.get(feature)) {
            let diff = feature_difference(feature, va, vb);
            sum_sq += weight * diff * diff;
            total_weight += weight;
        }
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    1.0 - (sum_sq / total_weight).sqrt().min(1.0)
}

/// Audio similarity between two tracks; 0 if either has no features.
#[must_use]
pub fn audio_similarity(a: &Track, b: &Track) -> f64 {
    if a.id == b.id {
        return 1.0;
    }
    match (a.audio(), b.audio()) {
        (Some(fa), Some(fb)) => feature_similarity(fa, fb),
        _ => 0.0,
    }
}

// =============================================================================
// COMBINATION
// =============================================================================

/// Weighted combination of semantic and audio similarity.
///
/// Each side is computed fresh; a zero weight skips that computation. Both
/// weights zero yields 0.
#[must_use]
pub fn combined_similarity(a: &Track, b: &Track, weights: &SimilarityWeights) -> f64 {
    if a.id == b.id {
        return 1.0;
    }
    let Some((semantic_weight, audio_weight)) = weights.normalized() else {
        return 0.0;
    };

    let semantic = if semantic_weight > 0.0 { semantic_similarity(a, b) } else { 0.0 };
    let audio = if audio_weight > 0.0 { audio_similarity(a, b) } else { 0.0 };
    (semantic * semantic_weight + audio * audio_weight).clamp(0.0, 1.0)
}

/// Similarity in the requested mode. `weights` only matter for combined mode.
#[must_use]
pub fn similarity(a: &Track, b: &Track, mode: SimilarityMode, weights: &SimilarityWeights) -> f64 {
    let score = match mode {
        SimilarityMode::Semantic => semantic_similarity(a, b),
        SimilarityMode::Audio => audio_similarity(a, b),
        SimilarityMode::Combined => combined_similarity(a, b, weights),
    };
    log::trace!("{mode} similarity {} ~ {} = {score:.4}", a.id, b.id);
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn features(values: &[(AudioFeature, f64)]) -> AudioFeatures {
        let mut f = AudioFeatures::default();
        for &(feature, v) in values {
            let slot = match feature {
                AudioFeature::Danceability => &mut f.danceability,
                AudioFeature::Energy => &mut f.energy,
                AudioFeature::Acousticness => &mut f.acousticness,
                AudioFeature::Instrumentalness => &mut f.instrumentalness,
                AudioFeature::Valence => &mut f.valence,
                AudioFeature::Tempo => &mut f.tempo,
                AudioFeature::Loudness => &mut f.loudness,
                AudioFeature::Speechiness => &mut f.speechiness,
                AudioFeature::Liveness => &mut f.liveness,
                AudioFeature::Mode => &mut f.mode,
                AudioFeature::Popularity => &mut f.popularity,
            };
            *slot = Some(v);
        }
        f
    }

    fn rich_track(id: &str) -> Track {
        Track::new(id)
            .with_tags(Facet::EmotionalTone, ["melancholy", "hopeful"])
            .with_score(Facet::EmotionalTone, "melancholy", 0.8)
            .with_score(Facet::EmotionalTone, "hopeful", 0.4)
            .with_tags(Facet::ThematicContent, ["loss"])
            .with_score(Facet::ThematicContent, "loss", 0.9)
            .with_features(features(&[
                (AudioFeature::Energy, 0.3),
                (AudioFeature::Tempo, 90.0),
                (AudioFeature::Mode, 0.0),
            ]))
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = FEATURE_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < EPS);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Semantic".parse::<SimilarityMode>().unwrap(), SimilarityMode::Semantic);
        assert_eq!(" audio ".parse::<SimilarityMode>().unwrap(), SimilarityMode::Audio);
        let err = "lyrics".parse::<SimilarityMode>().unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_identity_is_one_in_every_mode() {
        let bare = Track::new("x");
        for mode in [SimilarityMode::Semantic, SimilarityMode::Audio, SimilarityMode::Combined] {
            assert_eq!(similarity(&bare, &bare, mode, &SimilarityWeights::default()), 1.0);
        }
    }

    #[test]
    fn test_weighted_jaccard_uses_confidences() {
        let a = Track::new("a")
            .with_tags(Facet::EmotionalTone, ["melancholy"])
            .with_score(Facet::EmotionalTone, "melancholy", 0.8);
        let b = Track::new("b")
            .with_tags(Facet::EmotionalTone, ["melancholy"])
            .with_score(Facet::EmotionalTone, "melancholy", 0.9);

        let sim = facet_similarity(&a, &b, Facet::EmotionalTone).unwrap();
        assert!((sim - 0.8 / 0.9).abs() < EPS);
    }

    #[test]
    fn test_jaccard_falls_back_to_sets_without_confidences() {
        let a = Track::new("a").with_tags(Facet::LyricalStyle, ["direct", "poetic"]);
        let b = Track::new("b").with_tags(Facet::LyricalStyle, ["poetic", "abstract", "sparse"]);

        let sim = facet_similarity(&a, &b, Facet::LyricalStyle).unwrap();
        assert!((sim - 0.25).abs() < EPS);
    }

    #[test]
    fn test_missing_facet_is_skipped_not_zeroed() {
        let a = Track::new("a").with_tags(Facet::EmotionalTone, ["calm"]);
        let b = Track::new("b")
            .with_tags(Facet::EmotionalTone, ["calm"])
            .with_tags(Facet::ThematicContent, ["nature"]);

        let parts = semantic_parts(&a, &b);
        assert_eq!(parts.facets.len(), 1);
        assert!(parts.co_occurrence.is_none());
        // 1.0 * 0.4 averaged over a single facet
        assert!((parts.basic - 0.4).abs() < EPS);
        assert!((semantic_similarity(&a, &b) - 0.4).abs() < EPS);
    }

    #[test]
    fn test_basic_score_divides_by_facet_count() {
        let a = Track::new("a")
            .with_tags(Facet::EmotionalTone, ["calm"])
            .with_tags(Facet::ThematicContent, ["nature"]);
        let b = a.clone();
        let b = Track { id: "b".into(), ..b };

        let parts = semantic_parts(&a, &b);
        assert!((parts.basic - (0.4 + 0.3) / 2.0).abs() < EPS);
        let co = parts.co_occurrence.unwrap();
        assert!((co - 1.0).abs() < EPS);
        assert!((parts.score() - (0.4 * 0.35 + 0.6)).abs() < EPS);
    }

    #[test]
    fn test_co_occurrence_blend_with_partial_overlap() {
        let a = Track::new("a")
            .with_tags(Facet::EmotionalTone, ["sad"])
            .with_score(Facet::EmotionalTone, "sad", 0.8)
            .with_tags(Facet::ThematicContent, ["loss"])
            .with_score(Facet::ThematicContent, "loss", 0.5);
        let b = Track::new("b")
            .with_tags(Facet::EmotionalTone, ["sad"])
            .with_score(Facet::EmotionalTone, "sad", 0.4)
            .with_tags(Facet::ThematicContent, ["loss", "love"])
            .with_score(Facet::ThematicContent, "loss", 0.5)
            .with_score(Facet::ThematicContent, "love", 1.0);

        let parts = semantic_parts(&a, &b);
        // ET: 0.4 / 0.8, TC: 0.5 / 1.5
        assert!((parts.facets[0].similarity - 0.5).abs() < EPS);
        assert!((parts.facets[1].similarity - 1.0 / 3.0).abs() < EPS);
        let basic = (0.5 * 0.4 + (1.0 / 3.0) * 0.3) / 2.0;
        assert!((parts.basic - basic).abs() < EPS);

        // a: sad .8, loss .5, sad|loss .4
        // b: sad .4, loss .5, love 1.0, sad|loss .2, sad|love .4
        let dot = 0.8 * 0.4 + 0.5 * 0.5 + 0.4 * 0.2;
        let cosine = dot / ((0.64_f64 + 0.25 + 0.16) * (0.16 + 0.25 + 1.0 + 0.04 + 0.16)).sqrt();
        assert!((parts.co_occurrence.unwrap() - cosine).abs() < EPS);

        let expected = 0.4 * basic + 0.6 * cosine;
        assert!((semantic_similarity(&a, &b) - expected).abs() < EPS);
        assert!((semantic_similarity(&b, &a) - expected).abs() < EPS);
    }

    #[test]
    fn test_tag_vector_pairs() {
        let track = Track::new("t")
            .with_tags(Facet::EmotionalTone, ["sad"])
            .with_score(Facet::EmotionalTone, "sad", 0.5)
            .with_tags(Facet::LyricalStyle, ["poetic", "plain"]);

        let vector = tag_vector(&track);
        assert_eq!(vector.len(), 3 + 2);
        assert_eq!(vector["Emotional_Tone:sad"], 0.5);
        assert_eq!(vector["Lyrical_Style:poetic"], 1.0);
        assert_eq!(vector["Emotional_Tone:sad|Lyrical_Style:poetic"], 0.5);
    }

    #[test]
    fn test_semantic_and_audio_symmetry() {
        let a = rich_track("a");
        let b = Track::new("b")
            .with_tags(Facet::EmotionalTone, ["melancholy", "angry"])
            .with_score(Facet::EmotionalTone, "melancholy", 0.3)
            .with_tags(Facet::ThematicContent, ["loss", "war"])
            .with_tags(Facet::NarrativeStructure, ["linear"])
            .with_features(features(&[
                (AudioFeature::Energy, 0.9),
                (AudioFeature::Tempo, 170.0),
                (AudioFeature::Mode, 1.0),
                (AudioFeature::Valence, 0.2),
            ]));

        assert_eq!(semantic_similarity(&a, &b), semantic_similarity(&b, &a));
        assert_eq!(audio_similarity(&a, &b), audio_similarity(&b, &a));
    }

    #[test]
    fn test_audio_normalizes_tempo_and_loudness() {
        let a = Track::new("a").with_features(features(&[(AudioFeature::Tempo, 40.0)]));
        let b = Track::new("b").with_features(features(&[(AudioFeature::Tempo, 200.0)]));
        assert!(audio_similarity(&a, &b).abs() < EPS);

        let c = Track::new("c").with_features(features(&[(AudioFeature::Loudness, -30.0)]));
        let d = Track::new("d").with_features(features(&[(AudioFeature::Loudness, -15.0)]));
        assert!((audio_similarity(&c, &d) - 0.75).abs() < EPS);
    }

    #[test]
    fn test_audio_mode_is_binary() {
        assert_eq!(feature_difference(AudioFeature::Mode, 1.0, 1.0), 0.0);
        assert_eq!(feature_difference(AudioFeature::Mode, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_audio_only_compares_shared_features() {
        let a = Track::new("a").with_features(features(&[
            (AudioFeature::Energy, 0.5),
            (AudioFeature::Valence, 0.1),
        ]));
        let b = Track::new("b").with_features(features(&[
            (AudioFeature::Energy, 0.5),
            (AudioFeature::Danceability, 0.9),
        ]));
        assert!((audio_similarity(&a, &b) - 1.0).abs() < EPS);

        let c = Track::new("c").with_features(features(&[(AudioFeature::Liveness, 0.5)]));
        assert_eq!(audio_similarity(&a, &c), 0.0);
        assert_eq!(audio_similarity(&a, &Track::new("none")), 0.0);
    }

    #[test]
    fn test_combined_degenerates_to_single_measure() {
        let a = rich_track("a");
        let mut b = rich_track("b");
        b.features = Some(features(&[(AudioFeature::Energy, 0.8), (AudioFeature::Tempo, 150.0)]));
        b.tags.remove(&Facet::ThematicContent);

        let audio_only = SimilarityWeights { semantic: 0.0, audio: 1.0 };
        let semantic_only = SimilarityWeights { semantic: 2.0, audio: 0.0 };
        assert!((combined_similarity(&a, &b, &audio_only) - audio_similarity(&a, &b)).abs() < EPS);
        assert!((combined_similarity(&a, &b, &semantic_only) - semantic_similarity(&a, &b)).abs() < EPS);

        let none = SimilarityWeights { semantic: 0.0, audio: 0.0 };
        assert_eq!(combined_similarity(&a, &b, &none), 0.0);
    }

    #[test]
    fn test_disjoint_tags_without_features_score_zero() {
        let a = Track::new("a").with_tags(Facet::EmotionalTone, ["joyful"]);
        let b = Track::new("b").with_tags(Facet::EmotionalTone, ["angry"]);
        assert_eq!(combined_similarity(&a, &b, &SimilarityWeights::default()), 0.0);
    }

    #[test]
    fn test_negative_weights_rejected() {
        assert!(SimilarityWeights::new(-0.1, 1.0).is_err());
        assert!(SimilarityWeights::new(0.5, f64::NAN).is_err());
        assert!(SimilarityWeights::new(0.0, 0.0).is_ok());
    }
}
