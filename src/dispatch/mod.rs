//! Chat-facing dispatch.
//!
//! This is the boundary the platform adapter talks to: it matches
//! incoming messages against the configured command prefixes and the
//! stored tag names, and demultiplexes button interactions back to the
//! pagination engine via `<action>-<messageID>` control ids.
//!
//! Not-found conditions (a session swept away, a tag deleted
//! mid-session) degrade to a user-visible notice here; only store
//! failures propagate as errors.

use std::fmt;
use std::str::FromStr;

use crate::paginate::{PaginateError, Paginator, RenderedPage};

/// Notice shown when a control refers to a dead session or tag.
pub const GONE_NOTICE: &str = "This page is no longer available.";

/// The three navigation controls attached to a paginated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    /// Retreat one page (wrapping).
    Previous,
    /// Dismiss the paginated message.
    Delete,
    /// Advance one page (wrapping).
    Next,
}

impl NavAction {
    /// Opaque control id carried by the rendered button:
    /// `<action>-<messageID>`.
    pub fn control_id(&self, message_id: &str) -> String {
        format!("{self}-{message_id}")
    }

    /// Parses a control id back into the action and the message id it
    /// belongs to. Returns `None` for ids this bot did not mint.
    pub fn parse(control_id: &str) -> Option<(Self, &str)> {
        let (action, message_id) = control_id.split_once('-')?;
        Some((action.parse().ok()?, message_id))
    }
}

impl fmt::Display for NavAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavAction::Previous => write!(f, "previous"),
            NavAction::Delete => write!(f, "delete"),
            NavAction::Next => write!(f, "next"),
        }
    }
}

impl FromStr for NavAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "previous" => Ok(NavAction::Previous),
            "delete" => Ok(NavAction::Delete),
            "next" => Ok(NavAction::Next),
            other => Err(format!("Unknown navigation action: '{other}'")),
        }
    }
}

/// Control ids for the three buttons of one paginated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavControls {
    pub previous: String,
    pub delete: String,
    pub next: String,
}

impl NavControls {
    pub fn for_message(message_id: &str) -> Self {
        Self {
            previous: NavAction::Previous.control_id(message_id),
            delete: NavAction::Delete.control_id(message_id),
            next: NavAction::Next.control_id(message_id),
        }
    }
}

/// What the adapter should do in response to a button interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionReply {
    /// Edit the paginated message to show this page.
    Page(RenderedPage),
    /// Delete the paginated message.
    Dismiss,
    /// The referenced session or tag is gone; tell the user.
    Notice(String),
    /// The control id is not one of ours; do nothing.
    Ignored,
}

/// Routes messages and interactions to the pagination engine.
pub struct Dispatcher {
    prefixes: Vec<String>,
    paginator: Paginator,
}

impl Dispatcher {
    pub fn new(prefixes: Vec<String>, paginator: Paginator) -> Self {
        Self { prefixes, paginator }
    }

    /// Handles an incoming chat message.
    ///
    /// A message that starts with a configured prefix and whose first
    /// word names an existing tag starts pagination and returns the
    /// rendered first page with its controls. Anything else returns
    /// `None`; higher-level command routing owns the rest of the
    /// surface.
    pub fn handle_message(
        &self,
        message_id: &str,
        channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<Option<(RenderedPage, NavControls)>, PaginateError> {
        let Some(word) = self.command_word(text) else {
            return Ok(None);
        };

        match self.paginator.start(word, message_id, channel_id, user_id) {
            Ok(page) => {
                tracing::info!(tag = word, message_id, "serving paginated tag");
                Ok(Some((page, NavControls::for_message(message_id))))
            }
            // Unrecognized first words are not ours to answer.
            Err(PaginateError::TagNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Records the bot's reply message id once the adapter has sent it.
    pub fn message_rendered(
        &self,
        message_id: &str,
        bot_message: &str,
    ) -> Result<(), PaginateError> {
        self.paginator.mark_rendered(message_id, bot_message)
    }

    /// Handles a button interaction by its control id.
    pub fn handle_interaction(&self, control_id: &str) -> Result<InteractionReply, PaginateError> {
        let Some((action, message_id)) = NavAction::parse(control_id) else {
            return Ok(InteractionReply::Ignored);
        };

        let result = match action {
            NavAction::Previous => self.paginator.previous(message_id).map(InteractionReply::Page),
            NavAction::Next => self.paginator.next(message_id).map(InteractionReply::Page),
            NavAction::Delete => self.paginator.dismiss(message_id).map(|()| InteractionReply::Dismiss),
        };

        match result {
            Ok(reply) => Ok(reply),
            Err(PaginateError::SessionNotFound(_)) | Err(PaginateError::TagNotFound(_)) => {
                tracing::debug!(control_id, "interaction against a dead session");
                Ok(InteractionReply::Notice(GONE_NOTICE.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Strips a configured prefix and returns the first word, if any.
    fn command_word<'a>(&self, text: &'a str) -> Option<&'a str> {
        let body = self
            .prefixes
            .iter()
            .find_map(|prefix| text.strip_prefix(prefix.as_str()))?;
        body.split_whitespace().next()
    }
}
