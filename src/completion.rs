//! # Shell Completion Module
//!
//! Static completion scripts come from `clap_complete`; track IDs for
//! dynamic completion come from the hidden `complete-tracks` command.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! tagmix completion bash > ~/.local/share/bash-completion/completions/tagmix
//!
//! # Generate zsh completions
//! tagmix completion zsh > ~/.config/zsh/completions/_tagmix
//! ```

use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};
use tagmix::store::TrackStore;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
pub fn shell_to_completion_shell(shell: crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Track IDs in corpus order, with the title as a description when known.
pub fn track_completions(store: &TrackStore) -> Result<Vec<String>> {
    Ok(store
        .all_tracks()?
        .iter()
        .map(|track| match track.name.as_deref() {
            Some(name) => format!("{}\t{name}", track.id),
            None => track.id.clone(),
        })
        .collect())
}

/// Print one completion candidate per line.
pub fn print_track_completions(store: &TrackStore) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in track_completions(store)? {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagmix::track::Track;

    #[test]
    fn test_track_completions_include_titles() {
        let store = TrackStore::from_tracks(vec![
            Track::new("a").with_title("Hurt", "Johnny Cash"),
            Track::new("b"),
        ])
        .unwrap();
        assert_eq!(track_completions(&store).unwrap(), ["a\tHurt", "b"]);
    }
}
