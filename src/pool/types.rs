//! Prefix and pool value types.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A name-path segment published by a router, e.g. `videoA/chunk1`.
///
/// Leading separators and surrounding whitespace are removed on construction,
/// so a `Prefix` can always be appended to `namespace/router/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Prefix(String);

impl Prefix {
    /// Normalize a raw entry. Returns `None` when nothing usable remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_start_matches('/');
        if cleaned.is_empty() {
            None
        } else {
            Some(Prefix(cleaned.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, immutable prefix pool together with the file it came from
#[derive(Debug, Clone)]
pub struct PrefixPool {
    entries: Vec<Prefix>,
    source: PathBuf,
}

impl PrefixPool {
    pub fn new(entries: Vec<Prefix>, source: impl Into<PathBuf>) -> Self {
        Self {
            entries,
            source: source.into(),
        }
    }

    pub fn entries(&self) -> &[Prefix] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}
