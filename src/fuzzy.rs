//! Normalized string distances used for variation detection.
//!
//! Distances are in [0, 1]: 0 means identical, 1 means nothing in common.
//! Inputs are compared case-insensitively with whitespace collapsed.

use std::collections::BTreeSet;

/// A normalized string distance.
pub trait StringDistance: Send + Sync {
    /// Distance between `a` and `b` in [0, 1].
    fn distance(&self, a: &str, b: &str) -> f64;
}

/// `1 - normalized Levenshtein similarity` over normalized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl StringDistance for NormalizedLevenshtein {
    fn distance(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (normalize(a), normalize(b));
        if a.is_empty() && b.is_empty() {
            return 0.0;
        }
        (1.0 - strsim::normalized_levenshtein(&a, &b)).clamp(0.0, 1.0)
    }
}

/// Token-set distance: order and duplicate words don't matter.
///
/// Compares the sorted shared tokens against each side's full sorted token
/// string and keeps the best (smallest) distance, so "song remix live" and
/// "live song" come out close.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetDistance;

impl StringDistance for TokenSetDistance {
    fn distance(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (normalize(a), normalize(b));
        let tokens_a: BTreeSet<&str> = a.split(' ').filter(|t| !t.is_empty()).collect();
        let tokens_b: BTreeSet<&str> = b.split(' ').filter(|t| !t.is_empty()).collect();

        if tokens_a.is_empty() && tokens_b.is_empty() {
            return 0.0;
        }
        if tokens_a.is_empty() || tokens_b.is_empty() {
            return 1.0;
        }

        let shared = join(tokens_a.intersection(&tokens_b));
        let only_a = join(tokens_a.difference(&tokens_b));
        let only_b = join(tokens_b.difference(&tokens_a));

        let combined_a = join_nonempty(&shared, &only_a);
        let combined_b = join_nonempty(&shared, &only_b);

        let best = [
            strsim::normalized_levenshtein(&shared, &combined_a),
            strsim::normalized_levenshtein(&shared, &combined_b),
            strsim::normalized_levenshtein(&combined_a, &combined_b),
        ]
        .into_iter()
        .fold(0.0_f64, f64::max);

        // A shared core of nothing should not look like a perfect match.
        let best = if shared.is_empty() {
            strsim::normalized_levenshtein(&combined_a, &combined_b)
        } else {
            best
        };
        (1.0 - best).clamp(0.0, 1.0)
    }
}

fn join<'a>(tokens: impl Iterator<Item = &'a &'a str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

/// Lowercase, replace punctuation with spaces, collapse whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_lowercase().next().unwrap_or(c) } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
