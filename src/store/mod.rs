//! Path-addressed JSON document store.
//!
//! The whole bot state lives in one JSON document on disk, with two
//! top-level namespaces (`tags` and `pages`). The store keeps the parsed
//! document in memory behind a single writer lock and writes it back in
//! full after every mutation, so a reader always sees the most recent
//! completed write and concurrent mutations cannot interleave.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};

/// Errors from reading or writing the backing document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store file could not be read or written.
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store file (or a record inside it) is not valid JSON of the
    /// expected shape.
    #[error("store document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    doc: Value,
}

/// Durable key-value persistence over a single JSON document.
///
/// All mutations go through one lock, and compound read-modify-write
/// operations run inside a single [`Store::update`] closure, so two
/// concurrent cursor advances on the same record cannot lose an update.
#[derive(Debug)]
pub struct Store {
    inner: Mutex<Inner>,
}

impl Store {
    /// Opens the document at `path`, creating an empty document if the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the file exists but does not
    /// parse as JSON, or [`StoreError::Io`] if it cannot be read.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let doc = match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Value::Object(Map::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: Mutex::new(Inner {
                path: path.to_path_buf(),
                doc,
            }),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Returns a snapshot of the entire document.
    pub fn document(&self) -> Value {
        self.lock().doc.clone()
    }

    /// Resolves a dotted path (e.g. `"tags.install"`) into the document
    /// and returns a clone of the value there, or `None` if any segment
    /// is absent. Absence is not an error.
    pub fn get(&self, path: &str) -> Option<Value> {
        resolve(&self.lock().doc, path).cloned()
    }

    /// Deep-sets `value` at a dotted path, creating intermediate objects
    /// as needed, and persists the document.
    pub fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        deep_set(&mut inner.doc, path, value);
        inner.persist()
    }

    /// Removes the value at a dotted path and persists the document.
    /// Returns whether anything was actually removed.
    pub fn remove(&self, path: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let removed = deep_remove(&mut inner.doc, path);
        if removed {
            inner.persist()?;
        }
        Ok(removed)
    }

    /// Runs `f` against the whole document under the writer lock and
    /// persists afterwards. If `f` fails, nothing is written.
    ///
    /// This is the atomicity primitive: any read-modify-write that must
    /// not race another caller belongs inside one `update` closure.
    pub fn update<T, E>(&self, f: impl FnOnce(&mut Value) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut inner = self.lock();
        let snapshot = inner.doc.clone();
        match f(&mut inner.doc) {
            Ok(out) => {
                inner.persist().map_err(E::from)?;
                Ok(out)
            }
            Err(e) => {
                // Roll back so a failed mutation is invisible to the
                // next reader, in memory as on disk.
                inner.doc = snapshot;
                Err(e)
            }
        }
    }

    /// Runs a read-only closure against the document under the lock.
    pub fn read<T, E>(&self, f: impl FnOnce(&Value) -> Result<T, E>) -> Result<T, E> {
        f(&self.lock().doc)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-closure leaves the in-memory document unpersisted
        // but structurally valid, so keep serving it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    /// Writes the document to a temp file in the same directory, then
    /// renames it over the real file so a crash can never leave a
    /// truncated store behind.
    fn persist(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let bytes = serde_json::to_vec_pretty(&self.doc)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

/// Returns the named top-level namespace of the document as a mutable
/// object, creating it (and overwriting anything non-object in its
/// place) if needed.
pub(crate) fn namespace_mut<'a>(doc: &'a mut Value, name: &str) -> &'a mut Map<String, Value> {
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    let Value::Object(map) = doc else {
        unreachable!("document was just reset to an object")
    };
    let entry = map
        .entry(name.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    let Value::Object(namespace) = entry else {
        unreachable!("namespace was just reset to an object")
    };
    namespace
}

fn resolve<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, segment| value.get(segment))
}

fn deep_set(doc: &mut Value, path: &str, value: Value) {
    let mut current = doc;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            // Overwrite scalars in the way of an intermediate segment.
            *current = Value::Object(Map::new());
        }
        let map = match current.as_object_mut() {
            Some(map) => map,
            None => return,
        };

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

fn deep_remove(doc: &mut Value, path: &str) -> bool {
    let mut current = doc;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let map = match current.as_object_mut() {
            Some(map) => map,
            None => return false,
        };

        if segments.peek().is_none() {
            return map.remove(segment).is_some();
        }

        current = match map.get_mut(segment) {
            Some(next) => next,
            None => return false,
        };
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    /// Creates a store in a temporary directory.
    fn create_test_store() -> (Store, tempfile::TempDir) {
        let dir = tempdir().expect("Failed to create temp directory");
        let store = Store::open(&dir.path().join("store.json")).expect("Failed to open store");
        (store, dir)
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.document(), json!({}), "Fresh store should be empty");
    }

    #[test]
    fn test_open_corrupt_file() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").expect("Failed to write file");

        match Store::open(&path) {
            Err(StoreError::Corrupt(_)) => {}
            other => panic!("Expected Corrupt error, got {other:?}"),
        }
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let (store, _dir) = create_test_store();

        store.set("tags.install.page", json!(2)).expect("Failed to set");

        assert_eq!(store.get("tags.install.page"), Some(json!(2)));
        assert_eq!(store.get("tags.install"), Some(json!({ "page": 2 })));
    }

    #[test]
    fn test_get_absent_path_is_none() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.get("tags.missing"), None, "Absent path should be None");
    }

    #[test]
    fn test_set_overwrites_scalar_in_the_way() {
        let (store, _dir) = create_test_store();

        store.set("tags", json!("oops")).expect("Failed to set");
        store.set("tags.install", json!(1)).expect("Failed to set");

        assert_eq!(store.get("tags.install"), Some(json!(1)));
    }

    #[test]
    fn test_remove() {
        let (store, _dir) = create_test_store();

        store.set("pages.123", json!({ "page": 0 })).expect("Failed to set");
        assert!(store.remove("pages.123").expect("Failed to remove"));
        assert_eq!(store.get("pages.123"), None);

        assert!(
            !store.remove("pages.123").expect("Failed to remove"),
            "Removing an absent key should report false"
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("store.json");

        {
            let store = Store::open(&path).expect("Failed to open store");
            store.set("tags.install", json!({ "pages": ["a"] })).expect("Failed to set");
        }

        let reopened = Store::open(&path).expect("Failed to reopen store");
        assert_eq!(
            reopened.get("tags.install"),
            Some(json!({ "pages": ["a"] })),
            "Value should survive reopen"
        );
    }

    #[test]
    fn test_file_is_valid_json_after_write() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("store.json");

        let store = Store::open(&path).expect("Failed to open store");
        store.set("tags.a", json!(1)).expect("Failed to set");

        let bytes = fs::read(&path).expect("Failed to read store file");
        let parsed: Value = serde_json::from_slice(&bytes).expect("Store file should be valid JSON");
        assert_eq!(parsed, json!({ "tags": { "a": 1 } }));
    }

    #[test]
    fn test_update_failure_persists_nothing() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("store.json");

        let store = Store::open(&path).expect("Failed to open store");
        store.set("tags.a", json!(1)).expect("Failed to set");

        let result: Result<(), StoreError> = store.update(|doc| {
            deep_set(doc, "tags.a", json!(2));
            Err(StoreError::Io(io::Error::other("boom")))
        });
        assert!(result.is_err());

        let reopened = Store::open(&path).expect("Failed to reopen store");
        assert_eq!(
            reopened.get("tags.a"),
            Some(json!(1)),
            "Failed update should not reach disk"
        );
    }
}
