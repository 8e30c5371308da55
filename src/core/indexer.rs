use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::cache::object_store::ObjectStore;
use crate::cache::table_cache::TableCache;
use crate::core::config::{Config, SortBackend};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{IndexCounters, IndexStats};
use crate::core::types::SortKey;
use crate::schema::collections;
use crate::schema::schema::CollectionSchema;
use crate::search::filter::QueryFilter;
use crate::search::results::SearchResult;
use crate::sort::coordinator::SortCoordinator;
use crate::sort::external::{ExternalSort, UnixSort};
use crate::sort::merge::MergeSort;
use crate::storage::layout::{CacheLayout, TableInfo};

/// Query parameters shared by every collection search.
///
/// `num_found` is only for callers that got the exact total from an
/// earlier call with the same ref and query; never pass a guess or 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "ref")]
    pub object_ref: Option<String>,
    pub query: Option<String>,
    pub sort_by: Option<Vec<SortKey>>,
    pub start: Option<usize>,
    pub limit: Option<usize>,
    pub num_found: Option<usize>,
}

impl SearchParams {
    pub fn new(object_ref: &str) -> Self {
        SearchParams {
            object_ref: Some(object_ref.to_string()),
            ..Default::default()
        }
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn sort_by(mut self, keys: Vec<SortKey>) -> Self {
        self.sort_by = Some(keys);
        self
    }

    pub fn page(mut self, start: usize, limit: usize) -> Self {
        self.start = Some(start);
        self.limit = Some(limit);
        self
    }

    pub fn num_found(mut self, num_found: usize) -> Self {
        self.num_found = Some(num_found);
        self
    }
}

/// Cache, sorter and filter of one collection type
pub struct CollectionIndex {
    pub cache: TableCache,
    pub sorter: SortCoordinator,
    pub filter: QueryFilter,
}

impl CollectionIndex {
    pub fn search(
        &self,
        token: Option<&str>,
        object_ref: &str,
        query: &str,
        sort_by: &[SortKey],
        start: usize,
        limit: usize,
        num_found: Option<usize>,
    ) -> Result<SearchResult> {
        let fingerprint = self.cache.ensure(object_ref, token)?;
        let source = self.sorter.sorted_view(&fingerprint, sort_by)?;
        self.filter.run(source, query, start, limit, num_found)
    }
}

/// Entry point: one `CollectionIndex` per collection type, built from a
/// shared config, object store and sorter.
pub struct PanIndexer {
    config: Config,
    collections: HashMap<String, CollectionIndex>,
    counters: Arc<IndexCounters>,
}

impl PanIndexer {
    /// Indexer over the built-in pangenome and comparison-genome collections
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Result<Self> {
        Self::with_collections(config, store, collections::all())
    }

    pub fn with_collections(
        config: Config,
        store: Arc<dyn ObjectStore>,
        schemas: Vec<CollectionSchema>,
    ) -> Result<Self> {
        let sorter: Arc<dyn ExternalSort> = match (config.sort_backend, &config.sort_temp_dir) {
            (SortBackend::Unix, None) => Arc::new(UnixSort::new()),
            (SortBackend::Unix, Some(dir)) => Arc::new(UnixSort::new().with_temp_dir(dir.clone())),
            (SortBackend::Merge, None) => Arc::new(MergeSort::new(config.merge_chunk_lines)),
            (SortBackend::Merge, Some(dir)) => {
                Arc::new(MergeSort::new(config.merge_chunk_lines).with_spill_dir(dir.clone()))
            }
        };
        let counters = Arc::new(IndexCounters::new());

        let mut indexes = HashMap::new();
        for schema in schemas {
            let layout = CacheLayout::new(config.cache_config(&schema))?;
            let index = CollectionIndex {
                cache: TableCache::new(layout.clone(), schema.clone(), store.clone(), counters.clone()),
                sorter: SortCoordinator::new(
                    layout,
                    schema.clone(),
                    sorter.clone(),
                    config.max_sort_mem_size,
                    counters.clone(),
                ),
                filter: QueryFilter::new(schema.clone()),
            };
            indexes.insert(schema.name.clone(), index);
        }

        Ok(PanIndexer {
            config,
            collections: indexes,
            counters,
        })
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionIndex> {
        self.collections.get(name)
    }

    pub fn stats(&self) -> IndexStats {
        self.counters.snapshot()
    }

    /// Filtered, sorted page of `collection` for the object in `params`
    pub fn search(&self, collection: &str, token: Option<&str>, params: &SearchParams) -> Result<SearchResult> {
        let index = self.collection(collection).ok_or_else(|| Error::new(
            ErrorKind::InvalidArgument,
            format!("Unknown collection '{}'", collection),
        ))?;
        let object_ref = params.object_ref.as_deref().ok_or_else(|| Error::new(
            ErrorKind::InvalidArgument,
            "Parameter 'ref' is required".to_string(),
        ))?;

        let query = params.query.as_deref().unwrap_or("");
        let sort_by = params.sort_by.as_deref().unwrap_or(&[]);
        let start = params.start.unwrap_or(0);
        let limit = params.limit.unwrap_or(self.config.default_limit);

        let timer = Instant::now();
        self.counters.record_search();
        let result = index.search(token, object_ref, query, sort_by, start, limit, params.num_found)?;

        let elapsed_ms = timer.elapsed().as_millis() as u64;
        if self.config.debug {
            info!(object_ref, collection, query, start, limit, num_found = result.num_found, elapsed_ms, "search");
        } else {
            debug!(object_ref, collection, query, start, limit, num_found = result.num_found, elapsed_ms, "search");
        }

        Ok(result)
    }

    pub fn search_orthologs_from_pangenome(&self, token: Option<&str>, params: &SearchParams) -> Result<SearchResult> {
        self.search("orthologs", token, params)
    }

    pub fn search_families_from_comparison_genome(&self, token: Option<&str>, params: &SearchParams) -> Result<SearchResult> {
        self.search("families", token, params)
    }

    pub fn search_functions_from_comparison_genome(&self, token: Option<&str>, params: &SearchParams) -> Result<SearchResult> {
        self.search("functions", token, params)
    }

    pub fn search_comparison_genome_from_comparison_genome(&self, token: Option<&str>, params: &SearchParams) -> Result<SearchResult> {
        self.search("genomes", token, params)
    }

    /// Cached tables of one collection
    pub fn list_tables(&self, collection: &str) -> Result<Vec<TableInfo>> {
        match self.collection(collection) {
            Some(index) => index.cache.layout.list_tables(),
            None => Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("Unknown collection '{}'", collection),
            )),
        }
    }
}
