//! `StaticWorld` load-time error type (§7 `LoadError`).

use thiserror::Error;

/// Errors surfaced from [`crate::world::StaticWorldBuilder::load`]. Fatal to
/// the enclosing construction — no partial `StaticWorld` is ever retained.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileMissing { path: String },

    #[error("malformed input in {file} ({context}): {reason}")]
    Malformed {
        file: &'static str,
        context: String,
        reason: String,
    },

    #[error("unexpected end of file in {file} ({context})")]
    UnexpectedEof { file: &'static str, context: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type LoadResult<T> = Result<T, LoadError>;
