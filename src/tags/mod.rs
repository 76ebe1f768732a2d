//! Tag storage.
//!
//! A tag is a named piece of documentation whose content is split into
//! fixed-size pages at write time. Tags live under the `tags` namespace
//! of the store document and are addressed by the exact (case-sensitive)
//! command word a user types.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Store, StoreError};

/// Fixed page size, in characters. Chunk boundaries are purely
/// positional; no regard for word or line breaks.
pub const PAGE_SIZE: usize = 678;

const NAMESPACE: &str = "tags";

/// A named, paginated content entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Attribution string: the submitter's handle, or the source URL for
    /// mirrored documentation.
    pub user_tag: String,

    /// Identifier of the submitter.
    pub user_id: String,

    /// The original full text, retained alongside its pagination.
    pub content: String,

    /// When the tag was (last) written.
    pub date: DateTime<Utc>,

    /// `content` split into [`PAGE_SIZE`]-character chunks, in order.
    pub pages: Vec<String>,

    /// True when the content was mirrored from the documentation source
    /// rather than submitted by a user.
    pub from_source: bool,
}

/// Splits `content` into [`PAGE_SIZE`]-character pages.
///
/// Every page except possibly the last is exactly [`PAGE_SIZE`]
/// characters, and concatenating the pages restores the content. Empty
/// content yields exactly one empty page: a tag always has at least one
/// page to display.
pub fn paginate(content: &str) -> Vec<String> {
    if content.is_empty() {
        return vec![String::new()];
    }

    content
        .chars()
        .collect::<Vec<char>>()
        .chunks(PAGE_SIZE)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Typed CRUD over the `tags` namespace of the store document.
#[derive(Clone)]
pub struct TagRepository {
    store: Arc<Store>,
}

impl TagRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Writes (or overwrites) a tag, recomputing its date and pages from
    /// `content`. Last write wins; there is no name validation beyond
    /// the map key itself.
    pub fn add(
        &self,
        name: &str,
        user_tag: &str,
        user_id: &str,
        content: &str,
        from_source: bool,
    ) -> Result<Tag, StoreError> {
        let tag = Tag {
            user_tag: user_tag.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            date: Utc::now(),
            pages: paginate(content),
            from_source,
        };

        self.store.update(|doc| {
            write_tag(doc, name, &tag)?;
            Ok::<_, StoreError>(())
        })?;

        tracing::debug!(name, pages = tag.pages.len(), from_source, "stored tag");
        Ok(tag)
    }

    /// Looks up a tag by name.
    pub fn get(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        self.store
            .read(|doc| tag_in_doc(doc, name).map_err(StoreError::from))
    }

    /// Full snapshot of every stored tag, keyed by name.
    pub fn all(&self) -> Result<BTreeMap<String, Tag>, StoreError> {
        self.store.read(|doc| {
            let mut tags = BTreeMap::new();
            if let Some(map) = doc.get(NAMESPACE).and_then(Value::as_object) {
                for (name, value) in map {
                    let tag: Tag =
                        serde_json::from_value(value.clone()).map_err(StoreError::from)?;
                    tags.insert(name.clone(), tag);
                }
            }
            Ok(tags)
        })
    }

    /// Deletes a tag by name. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        self.store.update(|doc| {
            let removed = doc
                .get_mut(NAMESPACE)
                .and_then(Value::as_object_mut)
                .map(|map| map.remove(name).is_some())
                .unwrap_or(false);
            Ok::<_, StoreError>(removed)
        })
    }
}

/// Reads a tag out of a raw store document. Used by the pagination
/// engine to resolve tags inside an atomic `update` closure.
pub(crate) fn tag_in_doc(doc: &Value, name: &str) -> Result<Option<Tag>, serde_json::Error> {
    match doc.get(NAMESPACE).and_then(|tags| tags.get(name)) {
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        None => Ok(None),
    }
}

pub(crate) fn write_tag(doc: &mut Value, name: &str, tag: &Tag) -> Result<(), StoreError> {
    let value = serde_json::to_value(tag)?;
    crate::store::namespace_mut(doc, NAMESPACE).insert(name.to_string(), value);
    Ok(())
}
