//! Variation detection: remixes, live takes, covers and other alternate
//! renditions of "the same song".
//!
//! Titles are reduced to a base name by stripping qualifier groups such as
//! `(Remix)`, `[Live at ...]` or `- Acoustic Version`, then compared with a
//! pluggable [`StringDistance`]. Lyrics, when both tracks have them, give a
//! second, looser signal.

use crate::fuzzy::{normalize, NormalizedLevenshtein, StringDistance};
use crate::playlist::Candidate;
use crate::track::Track;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

/// Base-name distance below which two titles are the same song.
pub const TITLE_THRESHOLD: f64 = 0.3;
/// Lyrics distance below which two tracks are the same song.
pub const LYRICS_THRESHOLD: f64 = 0.65;
/// Only the opening of the lyrics is compared.
const LYRICS_SAMPLE_CHARS: usize = 1000;

const QUALIFIERS: &str =
    r"remix(?:ed)?|version|edit|mix|feat|featuring|ft|cover|live|acoustic|instrumental|original|remaster(?:ed)?";

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(&format!(
        r"(?i)\s*[\(\[\{{][^\)\]\}}]*\b(?:{QUALIFIERS})\b[^\)\]\}}]*[\)\]\}}]"
    ))
    .expect("bracketed qualifier pattern is valid");
    static ref DASH_SUFFIX: Regex = Regex::new(&format!(
        r"(?i)\s+[-–—]\s*(?:[\w']+\s+){{0,3}}?(?:{QUALIFIERS})\b.*$"
    ))
    .expect("dash qualifier pattern is valid");
    static ref TRAILING_FEAT: Regex =
        Regex::new(r"(?i)\s+(?:feat\.?|ft\.|featuring)\s+.+$").expect("featuring pattern is valid");
}

/// Strip version qualifiers from a title.
///
/// Best effort: `"Blue Monday (Live) - 2011 Remaster"` → `"Blue Monday"`.
/// Falls back to the trimmed input when stripping would leave nothing.
#[must_use]
pub fn base_name(title: &str) -> String {
    let stripped = BRACKETED.replace_all(title, "");
    let stripped = DASH_SUFFIX.replace(&stripped, "");
    let stripped = TRAILING_FEAT.replace(&stripped, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        title.trim().to_string()
    } else {
        collapsed
    }
}

/// Decides which tracks are variations of each other and applies the
/// playlist's variation policy.
pub struct VariationResolver<D: StringDistance = NormalizedLevenshtein> {
    distance: D,
    title_threshold: f64,
    lyrics_threshold: f64,
}

impl Default for VariationResolver<NormalizedLevenshtein> {
    fn default() -> Self {
        Self::with_distance(NormalizedLevenshtein)
    }
}

impl<D: StringDistance> VariationResolver<D> {
    pub fn with_distance(distance: D) -> Self {
        Self {
            distance,
            title_threshold: TITLE_THRESHOLD,
            lyrics_threshold: LYRICS_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, title: f64, lyrics: f64) -> Self {
        self.title_threshold = title;
        self.lyrics_threshold = lyrics;
        self
    }

    /// Fuzzy check: similar base names, or similar lyrics when both have them.
    ///
    /// Titles with no letters or digits carry no signal and never match.
    pub fn is_variation(&self, a: &Track, b: &Track) -> bool {
        if let (Some(base_a), Some(base_b)) = (title_sample(a), title_sample(b)) {
            if self.distance.distance(&base_a, &base_b) < self.title_threshold {
                return true;
            }
        }

        match (lyrics_sample(a), lyrics_sample(b)) {
            (Some(la), Some(lb)) => self.distance.distance(&la, &lb) < self.lyrics_threshold,
            _ => false,
        }
    }

    /// Apply the variation policy to deduplicated candidates.
    ///
    /// With `allow_variations` every candidate is kept, and those whose base
    /// name exactly matches a seed's are flagged. Without it, variations of a
    /// seed are dropped and each group of mutual variations collapses to its
    /// highest-similarity member.
    pub fn apply<'a>(
        &self,
        candidates: Vec<Candidate<'a>>,
        seeds: &[&Track],
        allow_variations: bool,
    ) -> Vec<Candidate<'a>> {
        if allow_variations {
            self.annotate(candidates, seeds)
        } else {
            self.filter_and_group(candidates, seeds)
        }
    }

    fn annotate<'a>(&self, mut candidates: Vec<Candidate<'a>>, seeds: &[&Track]) -> Vec<Candidate<'a>> {
        let seed_bases: Vec<(&str, Option<String>)> = seeds
            .iter()
            .map(|seed| (seed.id.as_str(), seed.name.as_deref().map(comparable_base)))
            .collect();

        for candidate in &mut candidates {
            let Some(name) = candidate.track.name.as_deref() else {
                continue;
            };
            let base = comparable_base(name);
            if let Some((seed_id, _)) = seed_bases
                .iter()
                .find(|(id, seed_base)| *id != candidate.track.id && seed_base.as_deref() == Some(base.as_str()))
            {
                candidate.is_variation = true;
                candidate.variation_of = Some((*seed_id).to_string());
            }
        }
        candidates
    }

    fn filter_and_group<'a>(&self, candidates: Vec<Candidate<'a>>, seeds: &[&Track]) -> Vec<Candidate<'a>> {
        let before = candidates.len();
        let mut kept: Vec<Candidate<'a>> = candidates
            .into_iter()
            .filter(|c| !seeds.iter().any(|seed| self.is_variation(c.track, seed)))
            .collect();
        debug!("Dropped {} variations of seed tracks", before - kept.len());

        // Highest similarity first, so each group's representative is its best member.
        kept.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));

        let mut groups: Vec<Vec<Candidate<'a>>> = Vec::new();
        for candidate in kept {
            match groups
                .iter_mut()
                .find(|group| self.is_variation(group[0].track, candidate.track))
            {
                Some(group) => group.push(candidate),
                None => groups.push(vec![candidate]),
            }
        }

        let collapsed = groups.iter().filter(|g| g.len() > 1).count();
        if collapsed > 0 {
            debug!("Collapsed {collapsed} groups of mutual variations");
        }

        groups
            .into_iter()
            .filter_map(|group| {
                let size = group.len();
                let mut best = group.into_iter().next()?;
                if size > 1 {
                    best.variation_group_size = Some(size);
                }
                Some(best)
            })
            .collect()
    }
}

fn comparable_base(name: &str) -> String {
    base_name(name).to_lowercase()
}

fn title_sample(track: &Track) -> Option<String> {
    let base = base_name(track.name.as_deref()?);
    (!normalize(&base).is_empty()).then_some(base)
}

fn lyrics_sample(track: &Track) -> Option<String> {
    let lyrics = track.lyrics.as_deref()?;
    let sample: String = lyrics.chars().take(LYRICS_SAMPLE_CHARS).collect();
    let sample = normalize(&sample);
    (!sample.is_empty()).then_some(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::TokenSetDistance;

    fn named(id: &str, name: &str) -> Track {
        Track::new(id).with_title(name, "Artist")
    }

    fn candidate(track: &Track, similarity: f64) -> Candidate<'_> {
        Candidate::new(track, similarity, Some("seed".to_string()))
    }

    #[test]
    fn test_base_name_strips_qualifiers() {
        assert_eq!(base_name("Song (Remix)"), "Song");
        assert_eq!(base_name("Song [Live at Wembley]"), "Song");
        assert_eq!(base_name("Song {Acoustic Version}"), "Song");
        assert_eq!(base_name("Song - Radio Edit"), "Song");
        assert_eq!(base_name("Song - Live"), "Song");
        assert_eq!(base_name("Song (feat. Someone)"), "Song");
        assert_eq!(base_name("Song feat. Someone"), "Song");
        assert_eq!(base_name("Song (Original)"), "Song");
        assert_eq!(base_name("  Plain Title  "), "Plain Title");
        assert_eq!(base_name("Mixed Emotions"), "Mixed Emotions");
        assert_eq!(base_name("(Live)"), "(Live)");
    }

    #[test]
    fn test_titles_match_fuzzily() {
        let resolver = VariationResolver::default();
        assert!(resolver.is_variation(&named("a", "Hallelujah"), &named("b", "Halleluja (Live)")));
        assert!(!resolver.is_variation(&named("a", "Hallelujah"), &named("b", "Yesterday")));
    }

    #[test]
    fn test_symbol_only_titles_never_match() {
        let resolver = VariationResolver::default();
        assert!(!resolver.is_variation(&named("a", "!!!"), &named("b", "???")));
        assert!(!resolver.is_variation(&named("a", "♥"), &named("b", "♥")));
        assert!(!resolver.is_variation(&named("a", "!!!"), &named("b", "Song")));

        let seed = named("s", "...");
        let x = named("x", "***");
        let y = named("y", "---");
        let candidates = vec![candidate(&x, 0.9), candidate(&y, 0.8)];
        let result = resolver.apply(candidates, &[&seed], false);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.variation_group_size.is_none()));
    }

    #[test]
    fn test_lyrics_match_when_titles_differ() {
        let lyrics = "I hurt myself today to see if I still feel";
        let a = named("a", "Hurt").with_lyrics(lyrics);
        let b = named("b", "Cash Sessions #4").with_lyrics(format!("{lyrics}, I focus on the pain"));
        assert!(VariationResolver::default().is_variation(&a, &b));

        let c = named("c", "Other").with_lyrics("Completely unrelated words about the sea and the sky");
        assert!(!VariationResolver::default().is_variation(&a, &c));
    }

    #[test]
    fn test_strict_mode_drops_seed_variations_and_groups_the_rest() {
        let seed = named("s", "Song (Original)");
        let remix = named("r", "Song (Remix)");
        let other_a = named("o1", "Northern Sky");
        let other_b = named("o2", "Northern Sky (Live)");
        let lone = named("l", "Pink Moon");

        let candidates = vec![
            candidate(&remix, 0.9),
            candidate(&other_b, 0.5),
            candidate(&other_a, 0.7),
            candidate(&lone, 0.6),
        ];
        let result = VariationResolver::default().apply(candidates, &[&seed], false);

        let ids: Vec<_> = result.iter().map(|c| c.track.id.as_str()).collect();
        assert_eq!(ids, ["o1", "l"]);
        assert_eq!(result[0].variation_group_size, Some(2));
        assert_eq!(result[1].variation_group_size, None);
    }

    #[test]
    fn test_lenient_mode_flags_exact_base_matches_only() {
        let seed = named("s", "Song (Original)");
        let remix = named("r", "song (Remix)");
        let near = named("n", "Songs");

        let candidates = vec![candidate(&remix, 0.9), candidate(&near, 0.8)];
        let result = VariationResolver::default().apply(candidates, &[&seed], true);

        assert_eq!(result.len(), 2);
        assert!(result[0].is_variation);
        assert_eq!(result[0].variation_of.as_deref(), Some("s"));
        assert!(!result[1].is_variation);
    }

    #[test]
    fn test_distance_is_swappable() {
        let resolver = VariationResolver::with_distance(TokenSetDistance).with_thresholds(0.1, 0.5);
        assert!(resolver.is_variation(&named("a", "Tear Us Apart Love"), &named("b", "Love Tear Us Apart")));
    }
}
