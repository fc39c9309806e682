//! # Command-Line Interface Module
//!
//! Clap definitions for the `tagmix` binary. Every command loads the corpus
//! once, runs a single query and prints JSON to stdout.
//!
//! ## Commands
//!
//! - `similar`: nearest neighbours of one track
//! - `compare`: similarity (or full breakdown) between two tracks
//! - `playlist`: build a playlist from seed tracks
//! - `evaluate`: score an existing playlist against its seeds
//! - `folds`: similarity distributions for sanity checks
//! - `stats`, `random`: corpus inspection
//!
//! ## Examples
//!
//! ```bash
//! tagmix similar 4uLU6hMCjMI75M1A2tKUQC --limit 20
//! tagmix compare t1 t2 --breakdown
//! tagmix playlist t1 t2 --max-tracks 25 --diversity 0.5 --strict-variations
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tagmix::similarity::SimilarityMode;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Similarity measure, as accepted on the command line.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Mode {
    Semantic,
    Audio,
    Combined,
}

impl From<Mode> for SimilarityMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Semantic => SimilarityMode::Semantic,
            Mode::Audio => SimilarityMode::Audio,
            Mode::Combined => SimilarityMode::Combined,
        }
    }
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "tagmix")]
#[command(about = "tagmix: playlists from semantic tags and audio features")]
#[command(version)]
pub struct Args {
    /// Tags file (JSON array of tracks with facet tags, scores and lyrics)
    #[arg(long, global = true, env = "TAGMIX_TRACKS", value_hint = clap::ValueHint::FilePath)]
    pub tracks: Option<PathBuf>,

    /// Audio features file (JSON array)
    #[arg(long, global = true, env = "TAGMIX_FEATURES", value_hint = clap::ValueHint::FilePath)]
    pub features: Option<PathBuf>,

    /// Config file (defaults to <config dir>/tagmix/config.json)
    #[arg(long, global = true, env = "TAGMIX_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Similarity knobs shared by several commands. Unset values fall back to
/// the config file defaults.
#[derive(ClapArgs, Debug, Default)]
pub struct SimilarityArgs {
    /// Similarity measure
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Weight of the semantic (tag) score in combined mode
    #[arg(long)]
    pub semantic_weight: Option<f64>,

    /// Weight of the audio feature score in combined mode
    #[arg(long)]
    pub audio_weight: Option<f64>,

    /// Drop candidates scoring below this
    #[arg(long)]
    pub min_similarity: Option<f64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find the tracks most similar to one track
    ///
    /// Scores every track in the corpus against the source and prints the
    /// best matches, most similar first. The source itself is never listed.
    Similar {
        /// Source track ID
        #[arg(value_hint = clap::ValueHint::Other)]
        track: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        similarity: SimilarityArgs,
    },

    /// Compare two tracks
    ///
    /// Prints a single similarity score, or with --breakdown the per-facet
    /// tag overlap, strongest co-occurring tag pairs and per-feature audio
    /// comparison behind it.
    Compare {
        /// First track ID
        track1: String,

        /// Second track ID
        track2: String,

        /// Show the full breakdown instead of a single score
        #[arg(short, long)]
        breakdown: bool,

        #[command(flatten)]
        similarity: SimilarityArgs,
    },

    /// Generate a playlist from seed tracks
    ///
    /// Gathers neighbours of every seed, applies the variation policy
    /// (remixes, live takes, covers), re-ranks for diversity and prepends
    /// the seeds. Fails if fewer than --min-tracks tracks survive.
    Playlist {
        /// Seed track IDs
        #[arg(required = true, value_hint = clap::ValueHint::Other)]
        seeds: Vec<String>,

        /// Fail if the playlist would be shorter than this
        #[arg(long)]
        min_tracks: Option<usize>,

        /// Playlist length cap (at most 100)
        #[arg(long)]
        max_tracks: Option<usize>,

        /// Trade-off between similarity (0) and variety (1)
        #[arg(short, long)]
        diversity: Option<f64>,

        /// Leave the seed tracks out of the playlist
        #[arg(long)]
        no_seeds: bool,

        /// Drop versions of the seeds and keep one version of everything else
        #[arg(long)]
        strict_variations: bool,

        #[command(flatten)]
        similarity: SimilarityArgs,

        /// Print a human-readable listing instead of JSON
        #[arg(short, long)]
        verbose: bool,
    },

    /// Evaluate a playlist against its seeds
    ///
    /// Reports intra-list diversity, average similarity to the seeds and
    /// the number of distinct tags covered.
    Evaluate {
        /// Seed track IDs
        #[arg(long, required = true, num_args = 1.., value_delimiter = ',')]
        seeds: Vec<String>,

        /// Playlist track IDs
        #[arg(long, required = true, num_args = 1.., value_delimiter = ',')]
        playlist: Vec<String>,

        #[command(flatten)]
        similarity: SimilarityArgs,
    },

    /// Similarity distributions with each of the first K tracks as seed
    Folds {
        /// Track IDs
        #[arg(required = true, value_name = "TRACK")]
        ids: Vec<String>,

        /// Number of folds (defaults to the number of tracks)
        #[arg(short)]
        k: Option<usize>,

        #[command(flatten)]
        similarity: SimilarityArgs,
    },

    /// Show corpus statistics
    Stats,

    /// Pick random tracks from the corpus
    Random {
        /// How many tracks
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// RNG seed for reproducible picks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate shell completions
    ///
    /// Usage: tagmix completion bash > ~/.local/share/bash-completion/completions/tagmix
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List track IDs for completion (hidden command)
    #[command(hide = true)]
    CompleteTracks,
}
