//! Page session tracking.
//!
//! Every paginated message the bot posts gets one session record, keyed
//! by the id of the message that triggered it. The session holds the
//! current page cursor plus the page count cached at creation time, and
//! lives under the `pages` namespace of the store document.
//!
//! Session creation is two-phase: the record is written before the bot's
//! reply message exists (`Pending`), then patched with the reply's id
//! once it does (`Rendered`).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Store, StoreError};

const NAMESPACE: &str = "pages";

/// Render state of a session's bot-side message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum RenderPhase {
    /// The session exists but the bot's reply has not been sent yet.
    Pending,
    /// The reply exists; `botMessage` is its platform id.
    #[serde(rename_all = "camelCase")]
    Rendered { bot_message: String },
}

/// Per-rendered-message pagination state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSession {
    /// Channel the paginated message lives in.
    #[serde(rename = "channelID")]
    pub channel_id: String,

    /// User who issued the original command.
    #[serde(rename = "userID")]
    pub user_id: String,

    /// Name of the tag being paged through. A weak reference: deleting
    /// the tag leaves this dangling and navigation reports not-found.
    pub tag: String,

    /// Zero-based cursor into the tag's pages.
    pub page: usize,

    /// Total page count cached when the session was created. Navigation
    /// wraps over this snapshot even if the tag is rewritten later.
    pub pages: usize,

    #[serde(flatten)]
    pub phase: RenderPhase,

    pub created_at: DateTime<Utc>,

    /// Last navigation or render-patch time; drives eviction.
    pub updated_at: DateTime<Utc>,
}

impl PageSession {
    /// A fresh `Pending` session pointing at page zero.
    pub fn new(channel_id: &str, user_id: &str, tag: &str, pages: usize) -> Self {
        let now = Utc::now();
        Self {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            tag: tag.to_string(),
            page: 0,
            pages,
            phase: RenderPhase::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Typed CRUD over the `pages` namespace of the store document.
#[derive(Clone)]
pub struct PageTracker {
    store: Arc<Store>,
}

impl PageTracker {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Writes a full session record, overwriting any existing one for
    /// the same message id.
    pub fn create(&self, message_id: &str, session: &PageSession) -> Result<(), StoreError> {
        self.store.update(|doc| {
            write_session(doc, message_id, session)?;
            Ok::<_, StoreError>(())
        })
    }

    /// Looks up a session by the triggering message's id.
    pub fn get(&self, message_id: &str) -> Result<Option<PageSession>, StoreError> {
        self.store
            .read(|doc| session_in_doc(doc, message_id).map_err(StoreError::from))
    }

    /// Patches the bot-reply message id into an existing session,
    /// completing the two-phase creation. Returns whether the session
    /// existed.
    pub fn mark_rendered(&self, message_id: &str, bot_message: &str) -> Result<bool, StoreError> {
        self.modify(message_id, |session| {
            session.phase = RenderPhase::Rendered {
                bot_message: bot_message.to_string(),
            };
        })
    }

    /// Moves an existing session's cursor. Returns whether the session
    /// existed.
    pub fn set_cursor(&self, message_id: &str, page: usize) -> Result<bool, StoreError> {
        self.modify(message_id, |session| session.page = page)
    }

    /// Deletes a session. Removes from the page namespace only; a tag
    /// that happens to share the message id is untouched.
    pub fn delete(&self, message_id: &str) -> Result<bool, StoreError> {
        self.store
            .update(|doc| Ok::<_, StoreError>(remove_session(doc, message_id)))
    }

    /// Full snapshot of every live session, keyed by message id.
    pub fn all(&self) -> Result<BTreeMap<String, PageSession>, StoreError> {
        self.store.read(|doc| {
            let mut sessions = BTreeMap::new();
            if let Some(map) = doc.get(NAMESPACE).and_then(Value::as_object) {
                for (id, value) in map {
                    let session: PageSession =
                        serde_json::from_value(value.clone()).map_err(StoreError::from)?;
                    sessions.insert(id.clone(), session);
                }
            }
            Ok(sessions)
        })
    }

    /// Evicts sessions whose last activity is older than `max_age`.
    /// Returns how many were removed.
    ///
    /// Sessions have no implicit expiry; whoever embeds the tracker
    /// decides when to sweep.
    pub fn prune_stale(&self, max_age: Duration) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - max_age;
        let pruned = self.store.update(|doc| {
            let Some(map) = doc.get_mut(NAMESPACE).and_then(Value::as_object_mut) else {
                return Ok::<_, StoreError>(0);
            };

            let stale: Vec<String> = map
                .iter()
                .filter(|(_, value)| {
                    match serde_json::from_value::<PageSession>((*value).clone()) {
                        Ok(session) => session.updated_at < cutoff,
                        // Unreadable records are stale by definition.
                        Err(_) => true,
                    }
                })
                .map(|(id, _)| id.clone())
                .collect();

            for id in &stale {
                map.remove(id);
            }
            Ok(stale.len())
        })?;

        if pruned > 0 {
            tracing::info!(pruned, "evicted stale page sessions");
        }
        Ok(pruned)
    }

    fn modify(
        &self,
        message_id: &str,
        apply: impl FnOnce(&mut PageSession),
    ) -> Result<bool, StoreError> {
        self.store.update(|doc| {
            let Some(mut session) =
                session_in_doc(doc, message_id).map_err(StoreError::from)?
            else {
                return Ok(false);
            };
            apply(&mut session);
            session.updated_at = Utc::now();
            write_session(doc, message_id, &session)?;
            Ok(true)
        })
    }
}

/// Reads a session out of a raw store document. Used by the pagination
/// engine inside atomic `update` closures.
pub(crate) fn session_in_doc(
    doc: &Value,
    message_id: &str,
) -> Result<Option<PageSession>, serde_json::Error> {
    match doc.get(NAMESPACE).and_then(|pages| pages.get(message_id)) {
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        None => Ok(None),
    }
}

/// Removes a session from a raw store document. Touches the page
/// namespace only.
pub(crate) fn remove_session(doc: &mut Value, message_id: &str) -> bool {
    doc.get_mut(NAMESPACE)
        .and_then(Value::as_object_mut)
        .map(|map| map.remove(message_id).is_some())
        .unwrap_or(false)
}

pub(crate) fn write_session(
    doc: &mut Value,
    message_id: &str,
    session: &PageSession,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(session)?;
    crate::store::namespace_mut(doc, NAMESPACE).insert(message_id.to_string(), value);
    Ok(())
}
