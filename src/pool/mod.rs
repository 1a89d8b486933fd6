//! Prefix pool loading.
//!
//! The pool is the flat, ordered list of name-path segments that an
//! experiment hands out to routers. It is read once per run from either a
//! line-per-entry file or a tabular file with a `prefix` column, and is
//! never mutated afterwards.

pub mod source;
pub mod types;

pub use source::{load_pool, SourceFormat};
pub use types::{Prefix, PrefixPool};

use std::path::PathBuf;

/// Errors raised while reading a prefix pool
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Prefix source not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Prefix source {path} contains no usable entries")]
    EmptyPool { path: PathBuf },

    #[error("Prefix source {path} has no 'prefix' column")]
    MissingColumn { path: PathBuf },

    #[error("Failed to read prefix source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed tabular prefix source {path}: {source}")]
    Tabular {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
