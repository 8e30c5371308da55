use std::fs;
use std::path::{Path, PathBuf};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::schema::schema::{CollectionSchema, IndexHome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortBackend {
    Unix,   // Spawn the system `sort`
    Merge,  // In-process external merge sort
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub pangenome_index_dir: PathBuf,
    pub comparison_genome_index_dir: PathBuf,

    // Base tables at or below this size (bytes, compressed) are sorted
    // straight to the caller instead of being persisted
    pub max_sort_mem_size: u64,
    pub default_limit: usize,

    pub sort_backend: SortBackend,
    pub merge_chunk_lines: usize,   // Lines per in-memory run for SortBackend::Merge
    pub sort_temp_dir: Option<PathBuf>,   // Spill directory of either backend; system temp dir when unset

    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pangenome_index_dir: PathBuf::from("./data/pangenome_index"),
            comparison_genome_index_dir: PathBuf::from("./data/comparison_genome_index"),
            max_sort_mem_size: 250_000,
            default_limit: 50,
            sort_backend: SortBackend::Unix,
            merge_chunk_lines: 100_000,
            sort_temp_dir: None,
            debug: false,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Both index directories rooted under one base directory.
    pub fn with_root(root: &Path) -> Self {
        Config {
            pangenome_index_dir: root.join("pangenome_index"),
            comparison_genome_index_dir: root.join("comparison_genome_index"),
            ..Config::default()
        }
    }

    pub fn index_dir(&self, home: IndexHome) -> &Path {
        match home {
            IndexHome::Pangenome => &self.pangenome_index_dir,
            IndexHome::ComparisonGenome => &self.comparison_genome_index_dir,
        }
    }

    pub fn cache_config(&self, schema: &CollectionSchema) -> CacheConfig {
        CacheConfig {
            base_dir: self.index_dir(schema.home).to_path_buf(),
            collection_suffix: schema.suffix.clone(),
        }
    }
}

/// Where one collection's tables live and how their file names are suffixed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub base_dir: PathBuf,
    pub collection_suffix: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::collections;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"pangenome-index-dir": "/tmp/pg", "sort-backend": "merge", "debug": true}"#,
        ).unwrap();

        assert_eq!(config.pangenome_index_dir, PathBuf::from("/tmp/pg"));
        assert_eq!(config.sort_backend, SortBackend::Merge);
        assert!(config.debug);
        assert_eq!(config.max_sort_mem_size, 250_000);
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.sort_temp_dir, None);
    }

    #[test]
    fn sort_temp_dir_is_read_from_json() {
        let config: Config = serde_json::from_str(r#"{"sort-temp-dir": "/scratch/sort"}"#).unwrap();
        assert_eq!(config.sort_temp_dir, Some(PathBuf::from("/scratch/sort")));
    }

    #[test]
    fn collections_map_to_their_home_directory() {
        let config = Config::with_root(Path::new("/cache"));

        let orthologs = config.cache_config(&collections::orthologs());
        assert_eq!(orthologs.base_dir, PathBuf::from("/cache/pangenome_index"));
        assert_eq!(orthologs.collection_suffix, "_orthologs");

        let families = config.cache_config(&collections::families());
        assert_eq!(families.base_dir, PathBuf::from("/cache/comparison_genome_index"));
    }
}
