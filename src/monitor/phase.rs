use serde::Serialize;
use std::fmt;

/// Which prefix set a convergence check covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Every cycle's prefixes for every router
    AllCycles,
    /// One cycle (zero-based index)
    Cycle(usize),
    /// Extra prefixes published through the designated router
    SecondPhase,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::AllCycles => write!(f, "All cycles"),
            Phase::Cycle(c) => write!(f, "Cycle {}", c + 1),
            Phase::SecondPhase => write!(f, "Second phase"),
        }
    }
}
