//! Bulk ingestion from the remote documentation repository.
//!
//! On startup the bot mirrors a directory of Markdown documents into
//! the tag repository: the source lists a logical path into document
//! name / raw-text URL pairs, each text is fetched and normalized, and
//! the result is stored as a `fromSource` tag attributed to its URL.
//!
//! Transient fetch failures are retried with a fixed backoff before the
//! whole load is declared failed; the startup caller treats that as
//! fatal, since steady-state serving depends on the mirror.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;
use crate::tags::TagRepository;

/// `userId` recorded on mirrored tags.
pub const SOURCE_USER_ID: &str = "ingest";

/// Timeout for establishing a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for an entire request including the response body.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from listing or fetching remote documentation.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The documentation source could not be reached or answered badly.
    #[error("documentation source request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The listing response did not have the expected shape.
    #[error("unexpected listing response: {0}")]
    Listing(String),

    /// Storing a fetched document failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How often and how patiently to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 500,
        }
    }
}

/// A remote source of documentation texts.
///
/// `list` maps a logical path to document-key / raw-text-URL pairs;
/// `fetch` resolves one URL to its text.
pub trait DocSource {
    fn list(&self, path: &str) -> Result<BTreeMap<String, String>, IngestError>;
    fn fetch(&self, url: &str) -> Result<String, IngestError>;
}

/// One entry of a contents-API directory listing.
#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    download_url: Option<String>,
}

/// `DocSource` over a repository-hosting contents API: the listing is a
/// JSON array of `{name, download_url}` entries, filtered to Markdown
/// files, keyed by file stem.
pub struct HttpDocSource {
    client: reqwest::blocking::Client,
    api_url: String,
}

impl HttpDocSource {
    /// Builds a source rooted at a contents-API URL.
    pub fn new(api_url: &str) -> Result<Self, IngestError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tagdex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

impl DocSource for HttpDocSource {
    fn list(&self, path: &str) -> Result<BTreeMap<String, String>, IngestError> {
        let url = format!("{}/{}", self.api_url, path.trim_matches('/'));
        let entries: Vec<ListingEntry> = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()
            .map_err(|e| IngestError::Listing(e.to_string()))?;

        let mut documents = BTreeMap::new();
        for entry in entries {
            let Some(stem) = entry.name.strip_suffix(".md") else {
                continue;
            };
            let Some(download_url) = entry.download_url else {
                continue;
            };
            documents.insert(stem.to_string(), download_url);
        }

        if documents.is_empty() {
            return Err(IngestError::Listing(format!(
                "no Markdown documents under '{path}'"
            )));
        }
        Ok(documents)
    }

    fn fetch(&self, url: &str) -> Result<String, IngestError> {
        Ok(self.client.get(url).send()?.error_for_status()?.text()?)
    }
}

/// Strips leading `#` heading markers (and the spaces after them) from
/// every heading line, leaving the heading text itself.
pub fn strip_heading_markers(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        let stripped = line.trim_start_matches('#');
        if stripped.len() != line.len() {
            lines.push(stripped.trim_start());
        } else {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Mirrors every document under `path` into the tag repository.
///
/// Each document lands as a tag named after its key, attributed to its
/// raw URL, flagged `fromSource`. Returns how many tags were written.
pub fn bulk_load(
    repo: &TagRepository,
    source: &dyn DocSource,
    path: &str,
    retry: &RetryPolicy,
) -> Result<usize, IngestError> {
    let listing = with_retry(retry, "list", || source.list(path))?;
    tracing::info!(path, documents = listing.len(), "mirroring documentation");

    let mut loaded = 0;
    for (key, url) in listing {
        let raw = with_retry(retry, &key, || source.fetch(&url))?;
        let content = strip_heading_markers(&raw);
        repo.add(&key, &url, SOURCE_USER_ID, &content, true)?;
        loaded += 1;
    }

    tracing::info!(loaded, "documentation mirror complete");
    Ok(loaded)
}

fn with_retry<T>(
    retry: &RetryPolicy,
    what: &str,
    mut f: impl FnMut() -> Result<T, IngestError>,
) -> Result<T, IngestError> {
    let attempts = retry.attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(what, attempt, error = %e, "fetch failed, retrying");
                thread::sleep(Duration::from_millis(retry.backoff_ms));
            }
            Err(e) => return Err(e),
        }
    }
}
