use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;
use crate::core::types::Record;

/// One page of a filtered collection.
///
/// Serializes as `{query, start, num_found, <collection>: [...]}`, the
/// record list keyed by collection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub collection: String,
    pub query: String,
    pub start: usize,
    pub records: Vec<Record>,
    pub num_found: usize,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one field across the page, in order
    pub fn column(&self, field: &str) -> Vec<Option<&str>> {
        self.records.iter().map(|r| r.get_field(field)).collect()
    }
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("query", &self.query)?;
        map.serialize_entry("start", &self.start)?;
        map.serialize_entry("num_found", &self.num_found)?;
        map.serialize_entry(&self.collection, &self.records)?;
        map.end()
    }
}
