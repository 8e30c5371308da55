use std::fmt;
use serde::{Deserialize, Serialize, Serializer};
use serde::ser::SerializeMap;

/// Content version of a remote object; partitions the table cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Fingerprint(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One decoded table row. Field order follows the collection schema;
/// empty cells come back as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Record { fields: Vec::with_capacity(capacity) }
    }

    pub fn add_field(&mut self, name: String, value: Option<String>) {
        self.fields.push((name, value));
    }

    /// `None` both for unknown fields and for absent values
    pub fn get_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One `(column, ascending)` entry of a sort_by list.
/// Accepts `["id", true]` as well as the integer form `["id", 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSortKey", into = "RawSortKey")]
pub struct SortKey {
    pub column: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn new(column: &str, ascending: bool) -> Self {
        SortKey {
            column: column.to_string(),
            ascending,
        }
    }

    pub fn asc(column: &str) -> Self {
        Self::new(column, true)
    }

    pub fn desc(column: &str) -> Self {
        Self::new(column, false)
    }
}

#[derive(Serialize, Deserialize)]
struct RawSortKey(String, Flag);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl From<RawSortKey> for SortKey {
    fn from(raw: RawSortKey) -> Self {
        let ascending = match raw.1 {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        };
        SortKey { column: raw.0, ascending }
    }
}

impl From<SortKey> for RawSortKey {
    fn from(key: SortKey) -> Self {
        RawSortKey(key.column, Flag::Bool(key.ascending))
    }
}
