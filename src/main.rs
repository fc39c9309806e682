//! # tagmix
//!
//! Command-line front end for the similarity engine: loads the corpus once,
//! runs one query and prints the result as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Corpus statistics
//! tagmix --tracks tracks.json --features features.json stats
//!
//! # Nearest neighbours
//! tagmix similar t1 --limit 20 --mode semantic
//!
//! # Playlist from two seeds
//! tagmix playlist t1 t2 --max-tracks 25 --verbose
//! ```

mod cli;
mod completion;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tagmix::config::{self, OptionDefaults, RuntimeConfig};
use tagmix::playlist::Playlist;
use tagmix::recommender::Recommender;
use tagmix::store::TrackStore;

/// Resolve the runtime configuration: config file, then command-line overrides.
fn load_config(args: &cli::Args) -> Result<RuntimeConfig> {
    let config = match args.config.clone().or_else(config::default_config_path) {
        Some(path) => RuntimeConfig::load(&path)?,
        None => RuntimeConfig::new()?,
    };
    Ok(config.with_overrides(args.tracks.clone(), args.features.clone()))
}

/// Load the corpus. Failure here ends the process.
fn load_store(config: &RuntimeConfig) -> Result<Arc<TrackStore>> {
    let store = TrackStore::new();
    store
        .load_from_files(&config.tracks_path, &config.features_path)
        .context("Failed to load the track corpus")?;
    Ok(Arc::new(store))
}

/// Fold command-line similarity flags into the configured defaults.
fn apply_similarity_args(mut defaults: OptionDefaults, args: &cli::SimilarityArgs) -> OptionDefaults {
    if let Some(mode) = args.mode {
        defaults.similarity_type = mode.into();
    }
    if let Some(weight) = args.semantic_weight {
        defaults.semantic_weight = weight;
    }
    if let Some(weight) = args.audio_weight {
        defaults.audio_weight = weight;
    }
    if let Some(min) = args.min_similarity {
        defaults.min_similarity = min;
    }
    defaults
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_playlist(playlist: &Playlist) {
    println!("{} ({})", playlist.name, playlist.id);
    println!("{}", "=".repeat(60));
    for (i, track) in playlist.tracks.iter().enumerate() {
        let marker = if track.is_seed {
            " [seed]"
        } else if track.is_variation {
            " [variation]"
        } else {
            ""
        };
        println!(
            "{:3}. {:.3}  {} - {}{marker}",
            i + 1,
            track.similarity,
            track.artist,
            track.name
        );
    }
    println!("{}", "=".repeat(60));
    println!(
        "{} tracks, {} artists, average similarity {:.3}",
        playlist.stats.track_count, playlist.stats.unique_artists, playlist.stats.avg_similarity
    );
}

/// Main entry point for the tagmix binary.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=debug tagmix playlist t1` - Enable debug logging
/// - `RUST_LOG=tagmix::variation=debug tagmix playlist t1 --strict-variations` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    if let cli::Command::Completion { shell } = args.command {
        let mut cmd = cli::Args::command();
        completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        return Ok(());
    }

    let config = load_config(&args)?;
    debug!("Using corpus {} + {}", config.tracks_path.display(), config.features_path.display());
    let store = load_store(&config)?;
    let recommender = Recommender::new(Arc::clone(&store));

    match args.command {
        cli::Command::Similar { track, limit, similarity } => {
            let defaults = apply_similarity_args(config.defaults, &similarity);
            let mut options = defaults.find_options();
            if let Some(limit) = limit {
                options.limit = limit;
            }
            info!("Finding tracks similar to {track}");
            print_json(&recommender.find_similar_tracks(&track, &options)?)?;
        }
        cli::Command::Compare { track1, track2, breakdown, similarity } => {
            let defaults = apply_similarity_args(config.defaults, &similarity);
            if breakdown {
                print_json(&recommender.similarity_breakdown(&track1, &track2, &defaults.weights())?)?;
            } else {
                let score =
                    recommender.similarity(&track1, &track2, defaults.similarity_type, &defaults.weights())?;
                print_json(&serde_json::json!({
                    "track1": track1,
                    "track2": track2,
                    "mode": defaults.similarity_type,
                    "similarity": score,
                }))?;
            }
        }
        cli::Command::Playlist {
            seeds,
            min_tracks,
            max_tracks,
            diversity,
            no_seeds,
            strict_variations,
            similarity,
            verbose,
        } => {
            let defaults = apply_similarity_args(config.defaults, &similarity);
            let mut options = defaults.playlist_options();
            if let Some(max) = max_tracks {
                options.max_tracks = max;
            }
            if let Some(min) = min_tracks {
                options.min_tracks = min;
            }
            if let Some(factor) = diversity {
                options.diversity_factor = factor;
            }
            if no_seeds {
                options.include_seed_tracks = false;
            }
            if strict_variations {
                options.allow_track_variations = false;
            }

            let playlist = recommender.generate_playlist(&seeds, &options)?;
            if verbose {
                print_playlist(&playlist);
            } else {
                print_json(&playlist)?;
            }
        }
        cli::Command::Evaluate { seeds, playlist, similarity } => {
            let defaults = apply_similarity_args(config.defaults, &similarity);
            print_json(&recommender.evaluate_playlist(&seeds, &playlist, &defaults.evaluation_options())?)?;
        }
        cli::Command::Folds { ids, k, similarity } => {
            let defaults = apply_similarity_args(config.defaults, &similarity);
            let k = k.unwrap_or(ids.len());
            print_json(&recommender.similarity_folds(&ids, k, &defaults.weights())?)?;
        }
        cli::Command::Stats => {
            print_json(&store.stats()?)?;
        }
        cli::Command::Random { count, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let ids: Vec<&str> = store
                .random_tracks(count, &mut rng)?
                .into_iter()
                .map(|t| t.id.as_str())
                .collect();
            print_json(&ids)?;
        }
        cli::Command::CompleteTracks => {
            completion::print_track_completions(&store)?;
        }
        // Already printed before the corpus was loaded.
        cli::Command::Completion { .. } => {}
    }

    Ok(())
}
