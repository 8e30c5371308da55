use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use crate::core::error::{Error, Result};
use crate::core::types::Fingerprint;

/// Upstream store the cached tables are built from.
///
/// `resolve_version` must be cheap relative to `fetch_projected`: it runs on
/// every request, the fetch only on a cache miss.
pub trait ObjectStore: Send + Sync {
    fn resolve_version(&self, object_ref: &str, token: Option<&str>) -> Result<Fingerprint>;

    /// Fetch the object restricted to `paths` (`/<key>/[*]/<field>` style)
    fn fetch_projected(&self, object_ref: &str, token: Option<&str>, paths: &[String]) -> Result<Value>;
}

/// SHA-256 of the serialized content, lower-case hex
pub fn content_fingerprint(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Fingerprint(format!("{:x}", hasher.finalize()))
}

/// Keep only the parts of `object` named by `paths`. `[*]` selects every
/// element of an array; other segments are object keys.
pub fn project(object: &Value, paths: &[String]) -> Value {
    let mut out = Value::Null;
    for path in paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        project_into(object, &segments, &mut out);
    }
    out
}

fn project_into(src: &Value, segments: &[&str], dst: &mut Value) {
    let Some((segment, rest)) = segments.split_first() else {
        *dst = src.clone();
        return;
    };

    if *segment == "[*]" {
        let Value::Array(items) = src else { return };
        if !matches!(dst, Value::Array(_)) {
            *dst = Value::Array(vec![Value::Null; items.len()]);
        }
        if let Value::Array(out) = dst {
            for (item, slot) in items.iter().zip(out.iter_mut()) {
                project_into(item, rest, slot);
            }
        }
        return;
    }

    let Some(child) = src.get(*segment) else { return };
    if !dst.is_object() {
        *dst = Value::Object(Map::new());
    }
    if let Value::Object(map) = dst {
        let slot = map.entry(segment.to_string()).or_insert(Value::Null);
        project_into(child, rest, slot);
    }
}

/// Objects held in memory, keyed by ref. Replacing an object changes its
/// fingerprint the same way a new upstream version would.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (Fingerprint, Arc<Value>)>>,
    required_token: Option<String>,
    pub resolve_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject calls that don't present exactly this token
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    pub fn put(&self, object_ref: &str, object: Value) -> Result<Fingerprint> {
        let fingerprint = content_fingerprint(&serde_json::to_vec(&object)?);
        self.objects
            .write()
            .insert(object_ref.to_string(), (fingerprint.clone(), Arc::new(object)));
        Ok(fingerprint)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    fn check_token(&self, token: Option<&str>) -> Result<()> {
        match &self.required_token {
            Some(required) if token != Some(required.as_str()) => {
                Err(Error::upstream("Authentication failed for object store"))
            }
            _ => Ok(()),
        }
    }

    fn lookup(&self, object_ref: &str) -> Result<(Fingerprint, Arc<Value>)> {
        self.objects
            .read()
            .get(object_ref)
            .cloned()
            .ok_or_else(|| Error::upstream(format!("No object with reference {}", object_ref)))
    }
}

impl ObjectStore for MemoryObjectStore {
    fn resolve_version(&self, object_ref: &str, token: Option<&str>) -> Result<Fingerprint> {
        self.resolve_calls.fetch_add(1, Ordering::Relaxed);
        self.check_token(token)?;
        Ok(self.lookup(object_ref)?.0)
    }

    fn fetch_projected(&self, object_ref: &str, token: Option<&str>, paths: &[String]) -> Result<Value> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        self.check_token(token)?;
        let (_, object) = self.lookup(object_ref)?;
        Ok(project(&object, paths))
    }
}

/// Objects stored as JSON files, `<root>/<ref with '/' as '_'>.json`
#[derive(Debug, Clone)]
pub struct JsonDirObjectStore {
    pub root: PathBuf,
}

impl JsonDirObjectStore {
    pub fn new(root: PathBuf) -> Self {
        JsonDirObjectStore { root }
    }

    pub fn object_path(&self, object_ref: &str) -> PathBuf {
        self.root.join(format!("{}.json", object_ref.replace('/', "_")))
    }

    fn read(&self, object_ref: &str) -> Result<Vec<u8>> {
        let path = self.object_path(object_ref);
        fs::read(&path).map_err(|e| {
            Error::upstream(format!("Cannot read object {} from {}: {}", object_ref, path.display(), e))
        })
    }
}

impl ObjectStore for JsonDirObjectStore {
    fn resolve_version(&self, object_ref: &str, _token: Option<&str>) -> Result<Fingerprint> {
        Ok(content_fingerprint(&self.read(object_ref)?))
    }

    fn fetch_projected(&self, object_ref: &str, _token: Option<&str>, paths: &[String]) -> Result<Value> {
        let object: Value = serde_json::from_slice(&self.read(object_ref)?)
            .map_err(|e| Error::upstream(format!("Object {} is not valid JSON: {}", object_ref, e)))?;
        Ok(project(&object, paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use crate::core::error::ErrorKind;

    #[test]
    fn projection_keeps_only_named_fields() {
        let object = json!({
            "id": "pg1",
            "orthologs": [
                {"id": "o1", "type": "t", "md5": "x", "orthologs": [["g", 1.0, "r"]]},
                {"id": "o2", "function": "f"}
            ]
        });
        let paths = vec!["/orthologs/[*]/id".to_string(), "/orthologs/[*]/function".to_string()];

        assert_eq!(
            project(&object, &paths),
            json!({"orthologs": [{"id": "o1"}, {"id": "o2", "function": "f"}]})
        );
    }

    #[test]
    fn fingerprint_tracks_content() {
        let store = MemoryObjectStore::new();
        let first = store.put("1/2/3", json!({"orthologs": []})).unwrap();
        assert_eq!(store.resolve_version("1/2/3", None).unwrap(), first);

        let second = store.put("1/2/3", json!({"orthologs": [{"id": "a"}]})).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.resolve_version("1/2/3", None).unwrap(), second);
    }

    #[test]
    fn same_length_content_gets_distinct_fingerprints() {
        let first = content_fingerprint(br#"{"orthologs":[{"id":"sgxnDxSukNOr"}]}"#);
        let second = content_fingerprint(br#"{"orthologs":[{"id":"MceHPMISCxux"}]}"#);

        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 64);
        assert!(first.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn unknown_ref_and_bad_token_are_upstream_errors() {
        let store = MemoryObjectStore::new().with_required_token("secret");
        store.put("a", json!({})).unwrap();

        assert_eq!(store.resolve_version("b", Some("secret")).unwrap_err().kind, ErrorKind::UpstreamFetch);
        assert_eq!(store.resolve_version("a", None).unwrap_err().kind, ErrorKind::UpstreamFetch);
        assert!(store.resolve_version("a", Some("secret")).is_ok());
    }

    #[test]
    fn json_dir_store_reads_files_by_ref() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonDirObjectStore::new(tmp.path().to_path_buf());
        fs::write(store.object_path("12/3/1"), br#"{"genomes": [{"id": "g1", "name": "E. coli"}]}"#).unwrap();

        assert!(store.object_path("12/3/1").ends_with("12_3_1.json"));
        let fetched = store
            .fetch_projected("12/3/1", None, &["/genomes/[*]/name".to_string()])
            .unwrap();
        assert_eq!(fetched, json!({"genomes": [{"name": "E. coli"}]}));
        assert_eq!(store.resolve_version("9/9/9", None).unwrap_err().kind, ErrorKind::UpstreamFetch);
    }
}
