//! Full name construction: `<namespace>/<router>/<prefix>`.

use crate::pool::Prefix;
use serde::Serialize;
use std::fmt;

/// Network prefix under which every published name is rooted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Trailing separators are dropped so names never contain `//`
    pub fn new(raw: &str) -> Self {
        Namespace(raw.trim().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name under which `router` publishes `prefix`
    pub fn full_name(&self, router: &str, prefix: &Prefix) -> String {
        format!("{}/{}/{}", self.0, router, prefix.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
