//! Detailed similarity breakdown between two tracks, for diagnostics and tuning.

use crate::similarity::{
    self, combined_similarity, feature_difference, normalize_feature, semantic_parts,
    SimilarityWeights, FEATURE_WEIGHTS,
};
use crate::track::{AudioFeature, Facet, Track};
use serde::Serialize;
use std::collections::BTreeMap;

/// How many co-occurrence patterns to report.
const TOP_PATTERNS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct SimilarityBreakdown {
    pub track1: String,
    pub track2: String,
    pub combined: f64,
    pub weights: SimilarityWeights,
    pub semantic: SemanticBreakdown,
    pub audio: AudioBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticBreakdown {
    pub score: f64,
    pub basic: f64,
    pub co_occurrence: Option<f64>,
    pub facets: BTreeMap<Facet, FacetBreakdown>,
    pub top_patterns: Vec<CoOccurrencePattern>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacetBreakdown {
    pub similarity: f64,
    pub weight: f64,
    pub matching_tags: Vec<String>,
}

/// A cross-facet tag pair present on both tracks.
#[derive(Debug, Clone, Serialize)]
pub struct CoOccurrencePattern {
    pub pattern: String,
    pub confidence1: f64,
    pub confidence2: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioBreakdown {
    pub score: f64,
    pub features: Vec<FeatureBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureBreakdown {
    pub feature: AudioFeature,
    pub weight: f64,
    pub value1: f64,
    pub value2: f64,
    pub normalized1: f64,
    pub normalized2: f64,
    pub similarity: f64,
}

/// Compute every score the engine knows about for a pair of tracks, plus the
/// evidence behind them.
#[must_use]
pub fn similarity_breakdown(a: &Track, b: &Track, weights: &SimilarityWeights) -> SimilarityBreakdown {
    SimilarityBreakdown {
        track1: a.id.clone(),
        track2: b.id.clone(),
        combined: combined_similarity(a, b, weights),
        weights: *weights,
        semantic: semantic_breakdown(a, b),
        audio: audio_breakdown(a, b),
    }
}

fn semantic_breakdown(a: &Track, b: &Track) -> SemanticBreakdown {
    let parts = semantic_parts(a, b);

    let facets = parts
        .facets
        .iter()
        .map(|score| {
            let matching_tags = match (a.facet_tags(score.facet), b.facet_tags(score.facet)) {
                (Some(ta), Some(tb)) => ta.intersection(tb).cloned().collect(),
                _ => Vec::new(),
            };
            (
                score.facet,
                FacetBreakdown {
                    similarity: score.similarity,
                    weight: score.weight,
                    matching_tags,
                },
            )
        })
        .collect();

    let top_patterns = if parts.co_occurrence.is_some() {
        top_patterns(a, b)
    } else {
        Vec::new()
    };

    SemanticBreakdown {
        score: similarity::semantic_similarity(a, b),
        basic: parts.basic,
        co_occurrence: parts.co_occurrence,
        facets,
        top_patterns,
    }
}

/// Shared cross-facet pairs, highest average confidence first.
fn top_patterns(a: &Track, b: &Track) -> Vec<CoOccurrencePattern> {
    let vector_a = similarity::tag_vector(a);
    let vector_b = similarity::tag_vector(b);

    let mut patterns: Vec<CoOccurrencePattern> = vector_a
        .iter()
        .filter(|(key, _)| key.contains('|'))
        .filter_map(|(key, &conf1)| {
            vector_b.get(key).map(|&conf2| CoOccurrencePattern {
                pattern: key.clone(),
                confidence1: conf1,
                confidence2: conf2,
                average: (conf1 + conf2) / 2.0,
            })
        })
        .collect();

    // Stable sort keeps key order among equal averages.
    patterns.sort_by(|x, y| y.average.partial_cmp(&x.average).unwrap_or(std::cmp::Ordering::Equal));
    patterns.truncate(TOP_PATTERNS);
    patterns
}

fn audio_breakdown(a: &Track, b: &Track) -> AudioBreakdown {
    let features = match (a.audio(), b.audio()) {
        (Some(fa), Some(fb)) => FEATURE_WEIGHTS
            .iter()
            .filter_map(|&(feature, weight)| {
                let (v1, v2) = (fa.get(feature)?, fb.get(feature)?);
                Some(FeatureBreakdown {
                    feature,
                    weight,
                    value1: v1,
                    value2: v2,
                    normalized1: normalize_feature(feature, v1),
                    normalized2: normalize_feature(feature, v2),
                    similarity: 1.0 - feature_difference(feature, v1, v2).min(1.0),
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    AudioBreakdown {
        score: similarity::audio_similarity(a, b),
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::AudioFeatures;

    #[test]
    fn test_single_shared_tag_breakdown() {
        let a = Track::new("a")
            .with_tags(Facet::EmotionalTone, ["melancholy", "tender"])
            .with_score(Facet::EmotionalTone, "melancholy", 0.8);
        let b = Track::new("b")
            .with_tags(Facet::EmotionalTone, ["melancholy"])
            .with_score(Facet::EmotionalTone, "melancholy", 0.9);

        let breakdown = similarity_breakdown(&a, &b, &SimilarityWeights::default());
        let facet = &breakdown.semantic.facets[&Facet::EmotionalTone];

        assert_eq!(facet.matching_tags, vec!["melancholy".to_string()]);
        // "tender" has no confidence, so it adds 0 to both sums.
        assert!((facet.similarity - 0.8 / 0.9).abs() < 1e-12);
        assert!(breakdown.semantic.top_patterns.is_empty());
        assert!(breakdown.audio.features.is_empty());
    }

    #[test]
    fn test_top_patterns_sorted_and_capped() {
        let emotions = ["a", "b", "c"];
        let themes = ["x", "y"];
        let mut t1 = Track::new("t1")
            .with_tags(Facet::EmotionalTone, emotions)
            .with_tags(Facet::ThematicContent, themes);
        let mut t2 = Track::new("t2")
            .with_tags(Facet::EmotionalTone, emotions)
            .with_tags(Facet::ThematicContent, themes);
        for (i, tag) in emotions.iter().enumerate() {
            let conf = 0.3 + 0.2 * i as f64;
            t1 = t1.with_score(Facet::EmotionalTone, *tag, conf);
            t2 = t2.with_score(Facet::EmotionalTone, *tag, conf);
        }

        let breakdown = similarity_breakdown(&t1, &t2, &SimilarityWeights::default());
        let patterns = &breakdown.semantic.top_patterns;

        assert_eq!(patterns.len(), TOP_PATTERNS);
        assert!(patterns.windows(2).all(|w| w[0].average >= w[1].average));
        assert!(patterns[0].pattern.starts_with("Emotional_Tone:c|"));
    }

    #[test]
    fn test_feature_rows_report_normalized_values() {
        let a = Track::new("a").with_features(AudioFeatures {
            tempo: Some(120.0),
            mode: Some(1.0),
            ..AudioFeatures::default()
        });
        let b = Track::new("b").with_features(AudioFeatures {
            tempo: Some(80.0),
            mode: Some(0.0),
            ..AudioFeatures::default()
        });

        let breakdown = similarity_breakdown(&a, &b, &SimilarityWeights::default());
        let tempo = breakdown
            .audio
            .features
            .iter()
            .find(|f| f.feature == AudioFeature::Tempo)
            .unwrap();
        assert!((tempo.normalized1 - 0.5).abs() < 1e-12);
        assert!((tempo.normalized2 - 0.25).abs() < 1e-12);
        assert!((tempo.similarity - 0.75).abs() < 1e-12);

        let mode = breakdown.audio.features.iter().find(|f| f.feature == AudioFeature::Mode).unwrap();
        assert_eq!(mode.similarity, 0.0);
    }
}
