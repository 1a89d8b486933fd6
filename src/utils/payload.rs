//! Publish payload generation.
//!
//! Every publish command streams the same content file into the producer.
//! The file is created once with seeded pseudo-random bytes so repeated runs
//! publish identical content.

use crate::config::PayloadConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};

const CHUNK_SIZE: usize = 64 * 1024;

/// Create the payload file if it does not exist yet.
///
/// Returns `true` when a new file was written.
pub fn ensure_payload(config: &PayloadConfig) -> Result<bool> {
    if config.path.exists() {
        log::debug!("Reusing payload file {:?}", config.path);
        return Ok(false);
    }

    if let Some(parent) = config.path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create payload directory '{}'", parent.display()))?;
    }

    let file = File::create(&config.path)
        .wrap_err_with(|| format!("Failed to create payload file '{}'", config.path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    let mut remaining = config.size_bytes;
    while remaining > 0 {
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        rng.fill_bytes(&mut chunk[..n]);
        writer.write_all(&chunk[..n])?;
        remaining -= n as u64;
    }
    writer.flush()?;

    log::info!("Wrote {} byte payload to {:?}", config.size_bytes, config.path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_payload_is_deterministic() {
        let dir = tempdir().unwrap();
        let a = PayloadConfig {
            path: dir.path().join("a.bin"),
            size_bytes: 100_000,
            seed: 3,
        };
        let b = PayloadConfig {
            path: dir.path().join("nested/b.bin"),
            ..a.clone()
        };

        assert!(ensure_payload(&a).unwrap());
        assert!(ensure_payload(&b).unwrap());

        let bytes_a = std::fs::read(&a.path).unwrap();
        let bytes_b = std::fs::read(&b.path).unwrap();
        assert_eq!(bytes_a.len(), 100_000);
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn test_existing_payload_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.bin");
        std::fs::write(&path, b"keep").unwrap();

        let config = PayloadConfig {
            path: path.clone(),
            size_bytes: 10,
            seed: 0,
        };
        assert!(!ensure_payload(&config).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");
    }
}
