//! Route table snapshots and name matching.
//!
//! Route tables arrive as free-form command output. Two ways of deciding
//! whether a full name is present are offered:
//! - `substring`: the name occurs anywhere in the text (compatibility mode,
//!   so `/n/a/p1` also matches a table that only lists `/n/a/p10`)
//! - `exact`: name tokens are extracted from the text and compared whole

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Name tokens: a `/`-rooted run of non-space characters, optionally behind `key=`
static NAME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s=("'])(/[^\s,;)"']+)"#).expect("Invalid route name regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Exact,
}

/// One router's route table at one poll tick
#[derive(Debug, Clone)]
pub struct RouteTable {
    raw: String,
    names: HashSet<String>,
}

impl RouteTable {
    pub fn parse(raw: String) -> Self {
        let names = NAME_TOKEN
            .captures_iter(&raw)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches('/').to_string())
            .collect();
        Self { raw, names }
    }

    pub fn contains(&self, name: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Substring => self.raw.contains(name),
            MatchMode::Exact => self.names.contains(name),
        }
    }

    /// Distinct names found in the table
    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }
}
