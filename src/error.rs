//! Error taxonomy shared by the similarity engine, retrieval and playlist assembly.
//!
//! Every failure is local and deterministic for a given input, so nothing here
//! is ever worth retrying. The boundary layer maps [`EngineError::kind`] to
//! whatever status codes it speaks.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A caller-supplied argument is empty, malformed or out of range.
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument { param: String, reason: String },

    /// A track ID does not resolve in the store.
    #[error("track not found: {id}")]
    NotFound { id: String },

    /// The store was queried before the corpus finished loading.
    #[error("track store has not been loaded yet")]
    NotReady,

    /// Filtering left fewer tracks than the caller asked for.
    #[error("only {found} tracks available after filtering (minimum: {required})")]
    InsufficientResults { found: usize, required: usize },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate track id in corpus: {id}")]
    DuplicateTrack { id: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Stable identifier for the error class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::NotFound { .. } => "not_found",
            Self::NotReady => "not_ready",
            Self::InsufficientResults { .. } => "insufficient_results",
            Self::Io { .. } | Self::Parse { .. } | Self::DuplicateTrack { .. } => "load_failed",
        }
    }

    /// Retrying with identical input yields the identical failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            EngineError::invalid("max_tracks", "must be at most 100"),
            EngineError::not_found("t1"),
            EngineError::NotReady,
            EngineError::InsufficientResults { found: 3, required: 10 },
        ];

        let kinds: std::collections::HashSet<_> = errors.iter().map(EngineError::kind).collect();
        assert_eq!(kinds.len(), errors.len());
        assert!(errors.iter().all(|e| !e.is_retryable()));
    }

    #[test]
    fn test_error_messages_carry_detail() {
        let err = EngineError::not_found("abc123");
        assert!(err.to_string().contains("abc123"));

        let err = EngineError::invalid("similarity_type", "unknown mode `lyrics`");
        let msg = err.to_string();
        assert!(msg.contains("similarity_type"));
        assert!(msg.contains("lyrics"));
    }
}
