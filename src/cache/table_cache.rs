use std::sync::Arc;
use std::time::Instant;
use serde_json::Value;
use tracing::{debug, info};
use crate::cache::object_store::ObjectStore;
use crate::codec::record_codec::RecordCodec;
use crate::core::error::{Error, Result};
use crate::core::stats::IndexCounters;
use crate::core::types::Fingerprint;
use crate::schema::schema::CollectionSchema;
use crate::storage::layout::CacheLayout;
use crate::storage::table_writer::{TableSummary, TableWriter};

/// Materializes one collection of an upstream object as a base table,
/// once per content version. Tables are never rewritten or expired.
pub struct TableCache {
    pub layout: CacheLayout,
    pub schema: CollectionSchema,
    pub store: Arc<dyn ObjectStore>,
    pub counters: Arc<IndexCounters>,
}

impl TableCache {
    pub fn new(
        layout: CacheLayout,
        schema: CollectionSchema,
        store: Arc<dyn ObjectStore>,
        counters: Arc<IndexCounters>,
    ) -> Self {
        TableCache {
            layout,
            schema,
            store,
            counters,
        }
    }

    /// Make sure the base table for the current version of `object_ref`
    /// exists and return that version's fingerprint.
    pub fn ensure(&self, object_ref: &str, token: Option<&str>) -> Result<Fingerprint> {
        let fingerprint = self.store.resolve_version(object_ref, token)?;
        let path = self.layout.base_table_path(&fingerprint);

        if path.is_file() {
            self.counters.record_base_hit();
            debug!(object_ref, table = %path.display(), "base table cache hit");
            return Ok(fingerprint);
        }

        let start = Instant::now();
        let object = self.store.fetch_projected(object_ref, token, &self.schema.projection_paths())?;
        let fetched_ms = start.elapsed().as_millis() as u64;

        let summary = self.build(&fingerprint, &object).map_err(Error::into_cache_write)?;
        self.counters.record_base_build();
        info!(
            object_ref,
            collection = %self.schema.name,
            fingerprint = %fingerprint,
            records = summary.line_count,
            size_bytes = summary.size_bytes,
            checksum = format_args!("{:08x}", summary.checksum),
            fetch_ms = fetched_ms,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "base table built"
        );

        Ok(fingerprint)
    }

    fn build(&self, fingerprint: &Fingerprint, object: &Value) -> Result<TableSummary> {
        let records = match object.get(&self.schema.name) {
            Some(Value::Array(records)) => records.as_slice(),
            Some(Value::Null) => &[],
            None => {
                return Err(Error::upstream(format!(
                    "Object has no '{}' field", self.schema.name
                )));
            }
            Some(_) => {
                return Err(Error::upstream(format!(
                    "Object field '{}' is not a list", self.schema.name
                )));
            }
        };

        let mut writer = TableWriter::create(self.layout.dir(), &self.layout.base_table_name(fingerprint))?;
        for record in records {
            writer.write_line(&RecordCodec::encode(record, &self.schema))?;
        }
        writer.finish(&self.layout.base_table_path(fingerprint))
    }
}
