use std::path::{Path, PathBuf};
use std::fs;
use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::core::config::CacheConfig;
use crate::core::error::Result;
use crate::core::types::Fingerprint;

pub const TABLE_EXTENSION: &str = ".tsv.gz";

/// File naming of one collection's cached tables
///
/// base:   <dir>/<fingerprint><suffix>.tsv.gz
/// sorted: <dir>/<fingerprint>_<suffix>_<sort code>.tsv.gz
#[derive(Debug, Clone)]
pub struct CacheLayout {
    pub base_dir: PathBuf,
    pub suffix: String,
}

/// A table file found in the cache directory
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    pub sorted: bool,
}

impl CacheLayout {
    pub fn new(config: CacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.base_dir)?;

        Ok(CacheLayout {
            base_dir: config.base_dir,
            suffix: config.collection_suffix,
        })
    }

    pub fn base_table_name(&self, fingerprint: &Fingerprint) -> String {
        format!("{}{}", fingerprint, self.suffix)
    }

    pub fn sorted_table_name(&self, fingerprint: &Fingerprint, sort_code: &str) -> String {
        format!("{}_{}_{}", fingerprint, self.suffix, sort_code)
    }

    pub fn base_table_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", self.base_table_name(fingerprint), TABLE_EXTENSION))
    }

    pub fn sorted_table_path(&self, fingerprint: &Fingerprint, sort_code: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", self.sorted_table_name(fingerprint, sort_code), TABLE_EXTENSION))
    }

    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    /// Published tables of this collection. In-flight temp files are skipped.
    pub fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let mut tables = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(TABLE_EXTENSION) else {
                continue;
            };

            let sorted_marker = format!("_{}_", self.suffix);
            let sorted = match stem.find(&sorted_marker) {
                Some(pos) => is_sort_code(&stem[pos + sorted_marker.len()..]),
                None => false,
            };
            if !sorted && !stem.ends_with(&self.suffix) {
                continue;
            }

            let metadata = entry.metadata()?;
            tables.push(TableInfo {
                path: entry.path(),
                size_bytes: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                sorted,
            });
        }

        tables.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(tables)
    }
}

// <digits><a|d> repeated
fn is_sort_code(code: &str) -> bool {
    let mut saw_digit = false;
    let mut saw_key = false;
    for c in code.chars() {
        match c {
            '0'..='9' => saw_digit = true,
            'a' | 'd' if saw_digit => {
                saw_digit = false;
                saw_key = true;
            }
            _ => return false,
        }
    }
    saw_key && !saw_digit
}
