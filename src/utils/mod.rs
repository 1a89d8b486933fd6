//! Shared utilities: command templates and payload generation.

pub mod payload;
pub mod template;

pub use payload::ensure_payload;
pub use template::{render, with_prefix};
