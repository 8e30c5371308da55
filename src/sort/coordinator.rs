use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::IndexCounters;
use crate::core::types::{Fingerprint, SortKey};
use crate::schema::schema::CollectionSchema;
use crate::sort::external::ExternalSort;
use crate::sort::spec::SortPlan;
use crate::storage::layout::CacheLayout;
use crate::storage::line_source::LineSource;

/// Hands out base tables in the requested order, caching sorted copies
pub struct SortCoordinator {
    pub layout: CacheLayout,
    pub schema: CollectionSchema,
    pub sorter: Arc<dyn ExternalSort>,
    pub max_sort_mem_size: u64,
    pub counters: Arc<IndexCounters>,
}

impl SortCoordinator {
    pub fn new(
        layout: CacheLayout,
        schema: CollectionSchema,
        sorter: Arc<dyn ExternalSort>,
        max_sort_mem_size: u64,
        counters: Arc<IndexCounters>,
    ) -> Self {
        SortCoordinator {
            layout,
            schema,
            sorter,
            max_sort_mem_size,
            counters,
        }
    }

    /// Lines of the base table for `fingerprint`, ordered by `sort_by`.
    ///
    /// Base tables up to `max_sort_mem_size` bytes are sorted straight into
    /// the returned source; larger ones are sorted into the cache first so
    /// the next identical request is a plain file read.
    pub fn sorted_view(&self, fingerprint: &Fingerprint, sort_by: &[SortKey]) -> Result<LineSource> {
        let base = self.layout.base_table_path(fingerprint);
        if !base.is_file() {
            return Err(Error::new(
                ErrorKind::MissingBaseTable,
                format!("File not found: {}", base.display()),
            ));
        }

        // Resolve before the empty check so bad column names always fail
        let plan = SortPlan::resolve(&self.schema, sort_by)?;
        if plan.is_empty() {
            return LineSource::open(&base);
        }

        let code = plan.code();
        let sorted = self.layout.sorted_table_path(fingerprint, &code);
        if sorted.is_file() {
            self.counters.record_sorted_hit();
            debug!(table = %sorted.display(), "sorted table cache hit");
            return LineSource::open(&sorted);
        }

        let base_size = fs::metadata(&base)?.len();
        let start = Instant::now();

        if base_size <= self.max_sort_mem_size {
            self.counters.record_sort_streamed();
            debug!(
                collection = %self.schema.name,
                sort_code = %code,
                sorter = self.sorter.name(),
                base_size,
                "streaming sort without caching"
            );
            return self.sorter.stream(&base, &plan);
        }

        let summary = self.sorter
            .persist(&base, &plan, &sorted)
            .map_err(Error::into_cache_write)?;
        self.counters.record_sorted_build();
        info!(
            collection = %self.schema.name,
            sort_code = %code,
            sorter = self.sorter.name(),
            lines = summary.line_count,
            size_bytes = summary.size_bytes,
            checksum = format_args!("{:08x}", summary.checksum),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sorted table built"
        );

        LineSource::open(&sorted)
    }
}
