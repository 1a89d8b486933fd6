//! Consolidated advertisement log.

use crate::monitor::RouterMisses;
use crate::network::{CommandError, RouterControl};
use color_eyre::eyre::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Written in place of a router's log when it cannot be read
pub const NO_LOG_MARKER: &str = "[No advert log found]";

/// Append-only result log file
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty the file, creating it and its parent directory if needed
    pub fn truncate(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        File::create(&self.path)
            .with_context(|| format!("Failed to truncate result log {}", self.path.display()))?;
        Ok(())
    }

    pub fn open(&self) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

/// Copies each router's advertisement log into a sink
pub struct AdvertLogCollector<'a> {
    network: &'a dyn RouterControl,
}

impl<'a> AdvertLogCollector<'a> {
    pub fn new(network: &'a dyn RouterControl) -> Self {
        Self { network }
    }

    /// Append a `label` section with one block per router.
    ///
    /// Never fails: unreadable logs become [`NO_LOG_MARKER`] and write errors
    /// are logged. Returns how many router logs were copied.
    pub fn collect(&self, routers: &[String], label: &str, sink: &mut dyn Write) -> usize {
        match self.write_section(routers, label, sink) {
            Ok(found) => {
                log::info!("[{}] Collected advert logs from {}/{} routers", label, found, routers.len());
                found
            }
            Err(e) => {
                log::warn!("[{}] Failed to write advert logs: {}", label, e);
                0
            }
        }
    }

    fn write_section(&self, routers: &[String], label: &str, sink: &mut dyn Write) -> io::Result<usize> {
        write!(sink, "\n===== {} =====\n", label)?;

        let mut found = 0;
        for router in routers {
            write!(sink, "\n--- Node {} ---\n", router)?;
            match self.network.advert_log(router) {
                Ok(content) => {
                    sink.write_all(content.as_bytes())?;
                    found += 1;
                }
                Err(e @ CommandError::LogUnavailable { .. }) => {
                    log::debug!("{}", e);
                    writeln!(sink, "{}", NO_LOG_MARKER)?;
                }
                Err(e) => {
                    log::warn!("[{}] Could not read advert log of {}: {}", label, router, e);
                    writeln!(sink, "{}", NO_LOG_MARKER)?;
                }
            }
        }
        sink.flush()?;
        Ok(found)
    }
}

/// Append the names each router was still missing when a phase timed out
pub fn write_missing_report(label: &str, misses: &[RouterMisses], sink: &mut dyn Write) -> io::Result<()> {
    write!(sink, "\n===== {} (missing routes) =====\n", label)?;
    for entry in misses.iter().filter(|m| !m.missing.is_empty()) {
        write!(sink, "\n--- Node {} ---\n", entry.router)?;
        if let Some(error) = &entry.error {
            writeln!(sink, "route query failed: {}", error)?;
        }
        for name in &entry.missing {
            writeln!(sink, "{}", name)?;
        }
    }
    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct LogNetwork {
        hosts: Vec<String>,
        logs: HashMap<String, String>,
    }

    impl RouterControl for LogNetwork {
        fn hosts(&self) -> &[String] {
            &self.hosts
        }

        fn publish(&self, _router: &str, _name: &str) -> Result<(), CommandError> {
            Ok(())
        }

        fn route_table(&self, _router: &str) -> Result<String, CommandError> {
            Ok(String::new())
        }

        fn advert_log(&self, router: &str) -> Result<String, CommandError> {
            self.logs
                .get(router)
                .cloned()
                .ok_or_else(|| CommandError::LogUnavailable {
                    router: router.to_string(),
                    path: PathBuf::from(format!("/tmp/minindn/{}/advert_log.txt", router)),
                })
        }
    }

    #[test]
    fn test_collect_with_missing_log() {
        let net = LogNetwork {
            hosts: vec!["a".to_string(), "b".to_string()],
            logs: HashMap::from([("a".to_string(), "adv /minindn/a/p0\n".to_string())]),
        };
        let mut out = Vec::new();
        let found = AdvertLogCollector::new(&net).collect(net.hosts(), "Cycle 1 convergence", &mut out);

        assert_eq!(found, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n===== Cycle 1 convergence =====\n\
             \n--- Node a ---\nadv /minindn/a/p0\n\
             \n--- Node b ---\n[No advert log found]\n"
        );
    }

    #[test]
    fn test_collect_survives_broken_sink() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let net = LogNetwork {
            hosts: vec!["a".to_string()],
            logs: HashMap::new(),
        };
        assert_eq!(AdvertLogCollector::new(&net).collect(net.hosts(), "x", &mut Broken), 0);
    }

    #[test]
    fn test_result_log_truncate_then_append() {
        let dir = TempDir::new().unwrap();
        let log = ResultLog::new(dir.path().join("nested").join("final_advert_log.txt"));
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(log.path(), "stale run\n").unwrap();

        log.truncate().unwrap();
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "");

        writeln!(log.open().unwrap(), "one").unwrap();
        writeln!(log.open().unwrap(), "two").unwrap();
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_missing_report_lists_only_routers_with_misses() {
        let misses = vec![
            RouterMisses {
                router: "a".to_string(),
                missing: vec![],
                error: None,
            },
            RouterMisses {
                router: "b".to_string(),
                missing: vec!["/minindn/b/p5".to_string()],
                error: None,
            },
        ];
        let mut out = Vec::new();
        write_missing_report("Cycle 1", &misses, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Node a"));
        assert!(text.contains("\n--- Node b ---\n/minindn/b/p5\n"));
    }
}
