//! The pagination engine.
//!
//! Drives one page cursor per rendered message: `start` creates the
//! session and renders page zero, `next`/`previous` wrap the cursor
//! around the page count cached at session creation, and `dismiss`
//! drops the session. Every navigation runs its whole read-modify-write
//! inside one store `update` closure, so concurrent clicks on the same
//! message can never lose an update.

use std::sync::Arc;

use chrono::Utc;

use crate::pages::{self, PageSession, RenderPhase};
use crate::store::{Store, StoreError};
use crate::tags::{self, Tag};

/// Fixed hint appended to every rendered page.
pub const NAV_HINT: &str = "Use the buttons below to flip between pages.";

/// Attribution notice for tags mirrored from the documentation source.
pub const SOURCE_NOTICE: &str =
    "Mirrored from the official documentation; see the source for original formatting.";

/// What the presentation layer needs to draw one page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Page text with ellipsis, attribution and navigation hint already
    /// folded in.
    pub content: String,
    /// 1-based page number for display.
    pub page: usize,
    /// Total page count.
    pub pages: usize,
}

/// Errors surfaced to the interaction handler.
#[derive(Debug, thiserror::Error)]
pub enum PaginateError {
    /// No tag with that name exists (or it was deleted mid-session).
    #[error("tag '{0}' not found")]
    TagNotFound(String),

    /// No pagination session is tracked for that message.
    #[error("no pagination session for message {0}")]
    SessionNotFound(String),

    /// The store failed underneath.
    #[error(transparent)]
    Store(#[from] StoreError),
}

enum Direction {
    Forward,
    Back,
}

/// Advances, retreats and renders page cursors.
#[derive(Clone)]
pub struct Paginator {
    store: Arc<Store>,
}

impl Paginator {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Creates a `Pending` session for `message_id` at page zero and
    /// returns the rendered first page.
    pub fn start(
        &self,
        tag_name: &str,
        message_id: &str,
        channel_id: &str,
        user_id: &str,
    ) -> Result<RenderedPage, PaginateError> {
        self.store.update(|doc| {
            let tag = tags::tag_in_doc(doc, tag_name)
                .map_err(StoreError::from)?
                .ok_or_else(|| PaginateError::TagNotFound(tag_name.to_string()))?;

            // Guard: a tag record with no pages still paginates as one
            // empty page.
            let count = tag.pages.len().max(1);
            let session = PageSession::new(channel_id, user_id, tag_name, count);
            pages::write_session(doc, message_id, &session)?;

            tracing::debug!(tag = tag_name, message_id, pages = count, "started pagination");
            Ok(render(&tag, 0))
        })
    }

    /// Records the bot's reply message id on the session, completing the
    /// two-phase creation.
    pub fn mark_rendered(&self, message_id: &str, bot_message: &str) -> Result<(), PaginateError> {
        self.store.update(|doc| {
            let mut session = require_session(doc, message_id)?;
            session.phase = RenderPhase::Rendered {
                bot_message: bot_message.to_string(),
            };
            session.updated_at = Utc::now();
            pages::write_session(doc, message_id, &session)?;
            Ok(())
        })
    }

    /// Advances the cursor, wrapping past the last page back to the
    /// first, and returns the newly current page.
    pub fn next(&self, message_id: &str) -> Result<RenderedPage, PaginateError> {
        self.advance(message_id, Direction::Forward)
    }

    /// Retreats the cursor, wrapping before the first page to the last,
    /// and returns the newly current page.
    pub fn previous(&self, message_id: &str) -> Result<RenderedPage, PaginateError> {
        self.advance(message_id, Direction::Back)
    }

    /// Drops the session (the delete control).
    pub fn dismiss(&self, message_id: &str) -> Result<(), PaginateError> {
        self.store.update(|doc| {
            // Read first so dismissing a dead session is NotFound, not a
            // silent no-op.
            require_session(doc, message_id)?;
            let removed = pages::remove_session(doc, message_id);
            debug_assert!(removed);
            Ok(())
        })
    }

    fn advance(&self, message_id: &str, direction: Direction) -> Result<RenderedPage, PaginateError> {
        self.store.update(|doc| {
            let mut session = require_session(doc, message_id)?;
            let tag = tags::tag_in_doc(doc, &session.tag)
                .map_err(StoreError::from)?
                .ok_or_else(|| PaginateError::TagNotFound(session.tag.clone()))?;

            // Wrap over the count cached at creation: the snapshot the
            // user was shown, not the tag's current shape.
            let count = session.pages.max(1);
            session.page = match direction {
                Direction::Forward => (session.page + 1) % count,
                Direction::Back => (session.page + count - 1) % count,
            };
            session.updated_at = Utc::now();

            let page = session.page;
            pages::write_session(doc, message_id, &session)?;
            Ok(render(&tag, page))
        })
    }
}

fn require_session(
    doc: &serde_json::Value,
    message_id: &str,
) -> Result<PageSession, PaginateError> {
    pages::session_in_doc(doc, message_id)
        .map_err(StoreError::from)?
        .ok_or_else(|| PaginateError::SessionNotFound(message_id.to_string()))
}

/// Renders one page of a tag for display.
///
/// The page text gets an ellipsis whenever the tag has more than one
/// page (even on the final, untruncated page), then the attribution
/// notice for mirrored tags, then the navigation hint. The cursor is
/// clamped into the tag's current pages so a tag that shrank after the
/// session started shows its last page instead of failing.
pub fn render(tag: &Tag, page: usize) -> RenderedPage {
    let total = tag.pages.len().max(1);
    let index = page.min(total - 1);

    let mut content = tag.pages.get(index).cloned().unwrap_or_default();
    if total > 1 {
        content.push_str("...");
    }
    if tag.from_source {
        content.push_str("\n\n");
        content.push_str(SOURCE_NOTICE);
    }
    content.push_str("\n\n");
    content.push_str(NAV_HINT);

    RenderedPage {
        content,
        page: index + 1,
        pages: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagRepository;
    use tempfile::tempdir;

    struct Fixture {
        paginator: Paginator,
        repo: TagRepository,
        tracker: crate::pages::PageTracker,
        _dir: tempfile::TempDir,
    }

    fn create_fixture() -> Fixture {
        let dir = tempdir().expect("Failed to create temp directory");
        let store =
            Arc::new(Store::open(&dir.path().join("store.json")).expect("Failed to open store"));
        Fixture {
            paginator: Paginator::new(store.clone()),
            repo: TagRepository::new(store.clone()),
            tracker: crate::pages::PageTracker::new(store),
            _dir: dir,
        }
    }

    /// Adds a tag with exactly `pages` full-size pages.
    fn add_tag_with_pages(fixture: &Fixture, name: &str, pages: usize) {
        let content = "x".repeat(crate::tags::PAGE_SIZE * pages);
        fixture
            .repo
            .add(name, "alice", "1", &content, false)
            .expect("Failed to add tag");
    }

    #[test]
    fn test_start_renders_first_page() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 3);

        let rendered = fixture
            .paginator
            .start("install", "msg-1", "chan-1", "user-1")
            .expect("Failed to start");

        assert_eq!(rendered.page, 1, "Display page is 1-based");
        assert_eq!(rendered.pages, 3);

        let session = fixture
            .tracker
            .get("msg-1")
            .expect("Failed to get session")
            .expect("Session should exist");
        assert_eq!(session.page, 0);
        assert_eq!(session.pages, 3);
        assert_eq!(session.phase, RenderPhase::Pending);
    }

    #[test]
    fn test_start_unknown_tag() {
        let fixture = create_fixture();
        match fixture.paginator.start("missing", "msg-1", "chan", "user") {
            Err(PaginateError::TagNotFound(name)) => assert_eq!(name, "missing"),
            other => panic!("Expected TagNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_next_wraps_around() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 3);
        fixture
            .paginator
            .start("install", "msg-1", "chan", "user")
            .expect("Failed to start");

        let displays: Vec<usize> = (0..3)
            .map(|_| fixture.paginator.next("msg-1").expect("Failed to advance").page)
            .collect();
        assert_eq!(displays, vec![2, 3, 1], "Three nexts from page 1 show 2, 3, 1");
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 3);
        fixture
            .paginator
            .start("install", "msg-1", "chan", "user")
            .expect("Failed to start");

        let rendered = fixture.paginator.previous("msg-1").expect("Failed to retreat");
        assert_eq!(rendered.page, 3, "Previous from the first page wraps to the last");
    }

    #[test]
    fn test_single_page_navigation_is_fixed() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "note", 1);
        fixture
            .paginator
            .start("note", "msg-1", "chan", "user")
            .expect("Failed to start");

        assert_eq!(fixture.paginator.next("msg-1").expect("Failed to advance").page, 1);
        assert_eq!(fixture.paginator.previous("msg-1").expect("Failed to retreat").page, 1);
    }

    #[test]
    fn test_end_to_end_1400_chars() {
        let fixture = create_fixture();
        fixture
            .repo
            .add("guide", "alice", "1", &"x".repeat(1400), false)
            .expect("Failed to add tag");

        let first = fixture
            .paginator
            .start("guide", "msg-1", "chan", "user")
            .expect("Failed to start");
        assert_eq!((first.page, first.pages), (1, 3));

        assert_eq!(fixture.paginator.next("msg-1").expect("next").page, 2);
        assert_eq!(fixture.paginator.next("msg-1").expect("next").page, 3);
        assert_eq!(
            fixture.paginator.next("msg-1").expect("next").page,
            1,
            "Fourth page wraps back to the first"
        );
    }

    #[test]
    fn test_navigation_after_session_deleted() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 3);
        fixture
            .paginator
            .start("install", "msg-1", "chan", "user")
            .expect("Failed to start");

        fixture.paginator.dismiss("msg-1").expect("Failed to dismiss");

        for result in [
            fixture.paginator.next("msg-1"),
            fixture.paginator.previous("msg-1"),
        ] {
            match result {
                Err(PaginateError::SessionNotFound(id)) => assert_eq!(id, "msg-1"),
                other => panic!("Expected SessionNotFound, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_navigation_after_tag_deleted() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 3);
        fixture
            .paginator
            .start("install", "msg-1", "chan", "user")
            .expect("Failed to start");

        fixture.repo.delete("install").expect("Failed to delete tag");

        match fixture.paginator.next("msg-1") {
            Err(PaginateError::TagNotFound(name)) => assert_eq!(name, "install"),
            other => panic!("Expected TagNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_dismiss_twice_is_not_found() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 1);
        fixture
            .paginator
            .start("install", "msg-1", "chan", "user")
            .expect("Failed to start");

        fixture.paginator.dismiss("msg-1").expect("First dismiss should succeed");
        assert!(matches!(
            fixture.paginator.dismiss("msg-1"),
            Err(PaginateError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_mark_rendered_transition() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 2);
        fixture
            .paginator
            .start("install", "msg-1", "chan", "user")
            .expect("Failed to start");

        fixture
            .paginator
            .mark_rendered("msg-1", "bot-7")
            .expect("Failed to mark rendered");

        let session = fixture
            .tracker
            .get("msg-1")
            .expect("Failed to get session")
            .expect("Session should exist");
        assert_eq!(
            session.phase,
            RenderPhase::Rendered {
                bot_message: "bot-7".to_string()
            }
        );
    }

    #[test]
    fn test_render_multi_page_ellipsis() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "long", 2);
        let tag = fixture.repo.get("long").expect("get").expect("Tag should exist");

        // The ellipsis lands on every page of a multi-page tag, final
        // page included.
        for page in 0..2 {
            let rendered = render(&tag, page);
            let body = rendered
                .content
                .split(NAV_HINT)
                .next()
                .expect("Content should contain the hint");
            assert!(body.trim_end().ends_with("..."), "Page {page} should carry the ellipsis");
        }
    }

    #[test]
    fn test_render_single_page_no_ellipsis() {
        let fixture = create_fixture();
        fixture
            .repo
            .add("short", "alice", "1", "just a line", false)
            .expect("Failed to add tag");
        let tag = fixture.repo.get("short").expect("get").expect("Tag should exist");

        let rendered = render(&tag, 0);
        assert!(rendered.content.starts_with("just a line\n\n"));
        assert!(!rendered.content.contains("..."));
        assert!(rendered.content.ends_with(NAV_HINT));
    }

    #[test]
    fn test_render_attribution_only_for_source_tags() {
        let fixture = create_fixture();
        fixture
            .repo
            .add("mirrored", "https://example.com/doc.md", "ingest", "docs", true)
            .expect("Failed to add tag");
        fixture
            .repo
            .add("local", "alice", "1", "docs", false)
            .expect("Failed to add tag");

        let mirrored = fixture.repo.get("mirrored").expect("get").expect("exists");
        let local = fixture.repo.get("local").expect("get").expect("exists");

        let rendered = render(&mirrored, 0);
        assert!(rendered.content.contains(SOURCE_NOTICE));
        let notice_at = rendered.content.find(SOURCE_NOTICE).expect("notice present");
        let hint_at = rendered.content.find(NAV_HINT).expect("hint present");
        assert!(notice_at < hint_at, "Attribution comes before the navigation hint");

        assert!(!render(&local, 0).content.contains(SOURCE_NOTICE));
    }

    #[test]
    fn test_render_empty_content_tag() {
        let fixture = create_fixture();
        fixture
            .repo
            .add("empty", "alice", "1", "", false)
            .expect("Failed to add tag");
        let tag = fixture.repo.get("empty").expect("get").expect("exists");

        let rendered = render(&tag, 0);
        assert_eq!((rendered.page, rendered.pages), (1, 1));
        assert!(rendered.content.ends_with(NAV_HINT));
    }

    #[test]
    fn test_render_clamps_stale_cursor() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "shrunk", 1);
        let tag = fixture.repo.get("shrunk").expect("get").expect("exists");

        // Cursor from a session created when the tag was larger.
        let rendered = render(&tag, 5);
        assert_eq!((rendered.page, rendered.pages), (1, 1));
    }

    #[test]
    fn test_concurrent_next_loses_no_updates() {
        let fixture = create_fixture();
        add_tag_with_pages(&fixture, "install", 3);
        fixture
            .paginator
            .start("install", "msg-1", "chan", "user")
            .expect("Failed to start");

        std::thread::scope(|scope| {
            for _ in 0..100 {
                let paginator = &fixture.paginator;
                scope.spawn(move || {
                    paginator.next("msg-1").expect("Concurrent next should succeed");
                });
            }
        });

        let session = fixture
            .tracker
            .get("msg-1")
            .expect("Failed to get session")
            .expect("Session should exist");
        assert_eq!(
            session.page,
            100 % 3,
            "100 concurrent advances must land on (0 + 100) mod 3"
        );
    }
}
