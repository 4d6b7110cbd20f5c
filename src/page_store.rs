use crate::page::{next_id, Page, PageId};
use crate::store::{KeyValueStore, StoreError, WriteOptions};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const PAGES_KEY: &str = "journalPages";

/// Why a stored collection could not be used.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("stored pages are not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("stored pages are not a JSON array")]
    NotAnArray,

    #[error("stored pages have the wrong shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// What happened when the collection was loaded at startup.
#[derive(Debug)]
pub enum LoadOutcome {
    Empty,
    Restored(usize),
    Recovered(DecodeError),
    /// The store could not be read at all; the session starts empty.
    Unavailable(StoreError),
}

/// Result of a best-effort write.
#[derive(Debug)]
#[must_use]
pub enum Durability {
    Written,
    Lost(StoreError),
}

impl Durability {
    pub fn is_written(&self) -> bool {
        matches!(self, Durability::Written)
    }
}

/// Parses the persisted form. Blank and empty containers decode to no pages.
pub fn decode_pages(raw: &str) -> Result<Vec<Page>, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "{}" || trimmed == "[]" {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(trimmed).map_err(DecodeError::Json)?;
    if !value.is_array() {
        return Err(DecodeError::NotAnArray);
    }
    serde_json::from_value(value).map_err(DecodeError::Shape)
}

pub fn encode_pages(pages: &[Page]) -> Result<String, StoreError> {
    Ok(serde_json::to_string(pages)?)
}

/// Owns the journal pages and writes them through to the store after every
/// mutation.
pub struct PageStore<S: KeyValueStore> {
    pages: Vec<Page>,
    store: S,
    last_issued: Option<PageId>,
}

impl<S: KeyValueStore> PageStore<S> {
    /// Loads the collection from `store`. Bad data is logged and replaced by
    /// an empty collection, never returned as an error.
    pub fn load(store: S) -> (Self, LoadOutcome) {
        let (pages, outcome) = match store.read(PAGES_KEY) {
            Err(e) => {
                error!(error = %e, "page storage unreadable, starting empty");
                (Vec::new(), LoadOutcome::Unavailable(e))
            }
            Ok(None) => (Vec::new(), LoadOutcome::Empty),
            Ok(Some(raw)) => match decode_pages(&raw) {
                Ok(pages) if pages.is_empty() => (pages, LoadOutcome::Empty),
                Ok(pages) => {
                    let pages = dedup_ids(pages);
                    let count = pages.len();
                    (pages, LoadOutcome::Restored(count))
                }
                Err(e) => {
                    error!(error = %e, raw = %raw, "invalid stored pages, starting empty");
                    (Vec::new(), LoadOutcome::Recovered(e))
                }
            },
        };

        let last_issued = pages.iter().map(|p| p.id).max();
        info!(pages = pages.len(), "page store loaded");
        (
            PageStore {
                pages,
                store,
                last_issued,
            },
            outcome,
        )
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add_entry(&mut self) -> (PageId, Durability) {
        self.add_entry_at(Utc::now())
    }

    pub fn add_entry_at(&mut self, now: DateTime<Utc>) -> (PageId, Durability) {
        let id = match next_id(now, self.last_issued) {
            Some(id) => {
                self.last_issued = Some(id);
                id
            }
            None => {
                let id = self.smallest_free_id();
                warn!(id, "no ids left above the newest page, reusing a free one");
                id
            }
        };
        let page = Page::new(id, now);
        debug!(id, timestamp = %page.timestamp, "page added");
        self.pages.push(page);
        (id, self.persist())
    }

    pub fn delete_entry(&mut self, id: PageId) -> Durability {
        let before = self.pages.len();
        self.pages.retain(|p| p.id != id);
        if self.pages.len() == before {
            debug!(id, "delete of unknown page ignored");
        }
        self.persist()
    }

    pub fn update_content(&mut self, id: PageId, content: &str) -> Durability {
        match self.pages.iter_mut().find(|p| p.id == id) {
            Some(page) => page.content = content.to_string(),
            None => debug!(id, "update of unknown page ignored"),
        }
        self.persist()
    }

    fn smallest_free_id(&self) -> PageId {
        let taken: HashSet<PageId> = self.pages.iter().map(|p| p.id).collect();
        (1..=PageId::MAX)
            .find(|id| !taken.contains(id))
            .unwrap_or_default()
    }

    /// Writes the whole collection. Failures are logged and handed back;
    /// in-memory state stays as it is.
    pub fn persist(&mut self) -> Durability {
        let written = encode_pages(&self.pages)
            .and_then(|json| self.store.write(PAGES_KEY, &json, &WriteOptions::long_lived()));
        match written {
            Ok(()) => Durability::Written,
            Err(e) => {
                warn!(error = %e, pages = self.pages.len(), "pages not persisted");
                Durability::Lost(e)
            }
        }
    }
}

fn dedup_ids(pages: Vec<Page>) -> Vec<Page> {
    let mut seen = HashSet::new();
    let total = pages.len();
    let unique: Vec<Page> = pages.into_iter().filter(|p| seen.insert(p.id)).collect();
    if unique.len() != total {
        warn!(dropped = total - unique.len(), "dropped pages with duplicate ids");
    }
    unique
}
