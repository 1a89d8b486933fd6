//! Pool source readers.
//!
//! Two formats are recognized:
//! - `lines`: one prefix per line, blank lines ignored, no escaping
//! - `csv`: header row with a `prefix` column; other columns are ignored and
//!   rows with an empty `prefix` are skipped

use super::types::{Prefix, PrefixPool};
use super::PoolError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// Column holding the prefix in tabular sources
const PREFIX_COLUMN: &str = "prefix";

/// On-disk layout of a prefix source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Lines,
    Csv,
}

impl SourceFormat {
    /// Guess the format from the file extension (`.csv` → tabular, anything else → lines)
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SourceFormat::Csv,
            _ => SourceFormat::Lines,
        }
    }
}

/// Load a prefix pool from `path`.
///
/// When `format` is `None` it is inferred from the extension.
pub fn load_pool(path: &Path, format: Option<SourceFormat>) -> Result<PrefixPool, PoolError> {
    let format = format.unwrap_or_else(|| SourceFormat::infer(path));

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PoolError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => PoolError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let entries = match format {
        SourceFormat::Lines => read_lines(file, path)?,
        SourceFormat::Csv => read_tabular(file, path)?,
    };

    if entries.is_empty() {
        return Err(PoolError::EmptyPool {
            path: path.to_path_buf(),
        });
    }

    log::debug!("Loaded {} prefixes from {:?} ({:?})", entries.len(), path, format);
    Ok(PrefixPool::new(entries, path))
}

fn read_lines(file: File, path: &Path) -> Result<Vec<Prefix>, PoolError> {
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| PoolError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if let Some(prefix) = Prefix::parse(&line) {
            entries.push(prefix);
        }
    }
    Ok(entries)
}

fn read_tabular(file: File, path: &Path) -> Result<Vec<Prefix>, PoolError> {
    let tabular_err = |e: csv::Error| PoolError::Tabular {
        path: path.to_path_buf(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let column = reader
        .headers()
        .map_err(tabular_err)?
        .iter()
        .position(|h| h.trim() == PREFIX_COLUMN)
        .ok_or_else(|| PoolError::MissingColumn {
            path: path.to_path_buf(),
        })?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(tabular_err)?;
        if let Some(prefix) = record.get(column).and_then(Prefix::parse) {
            entries.push(prefix);
        }
    }
    Ok(entries)
}
