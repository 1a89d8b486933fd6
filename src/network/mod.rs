//! Boundary to the emulated network.
//!
//! Everything the convergence engine needs from the outside world goes
//! through [`RouterControl`]: the list of polled hosts, a way to publish a
//! name on a router, a way to read a router's route table, and a way to read
//! its local advertisement log. Topology bring-up and process supervision
//! stay on the other side of this trait.

pub mod route_table;
pub mod shell;

pub use route_table::{MatchMode, RouteTable};
pub use shell::ShellNetwork;

use std::path::PathBuf;

/// Errors from dispatching a command against a router
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Router not found: {0}")]
    RouterNotFound(String),

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Refusing to pass '{0}' to the shell: it contains shell metacharacters")]
    UnsafeName(String),

    #[error("No advertisement log for {router} at {path}")]
    LogUnavailable { router: String, path: PathBuf },
}

/// Operations the engine performs against routers
pub trait RouterControl: Sync {
    /// Every node whose route table must converge
    fn hosts(&self) -> &[String];

    /// Fire-and-forget publish of a full name on `router`
    fn publish(&self, router: &str, name: &str) -> Result<(), CommandError>;

    /// Current route table of `router` as unstructured text
    fn route_table(&self, router: &str) -> Result<String, CommandError>;

    /// Contents of `router`'s local advertisement log
    fn advert_log(&self, router: &str) -> Result<String, CommandError>;

    /// Best-effort cleanup of anything the run started
    fn teardown(&self) {}

    fn has_host(&self, router: &str) -> bool {
        self.hosts().iter().any(|h| h == router)
    }
}
