//! Per-run experiment context.
//!
//! Values shared by every component of one run (namespace, payload file,
//! trust anchor) are created once here and passed explicitly to whoever
//! needs them. There is no process-wide state.

use crate::config::Config;
use crate::plan::Namespace;

#[derive(Debug, Clone)]
pub struct ExperimentContext {
    namespace: Namespace,
    payload: String,
    trust_anchor: Option<String>,
}

impl ExperimentContext {
    pub fn new(namespace: Namespace, payload: impl Into<String>, trust_anchor: Option<String>) -> Self {
        Self {
            namespace,
            payload: payload.into(),
            trust_anchor,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Namespace::new(&config.general.namespace),
            config.network.payload.path.to_string_lossy(),
            config.general.trust_anchor.clone(),
        )
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn trust_anchor(&self) -> Option<&str> {
        self.trust_anchor.as_deref()
    }

    /// Template variables for a command issued against `router`
    pub fn template_vars<'a>(&'a self, router: &'a str, name: &'a str) -> [(&'a str, &'a str); 5] {
        [
            ("router", router),
            ("name", name),
            ("payload", self.payload.as_str()),
            ("namespace", self.namespace.as_str()),
            ("trust_anchor", self.trust_anchor().unwrap_or("")),
        ]
    }
}
