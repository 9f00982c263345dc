//! Pagination types for Favro API responses.
//!
//! Favro wraps every list response in an envelope carrying a server-issued
//! `requestId`, the current page (0-indexed) and the total page count.
//! Later pages of the same query are requested by echoing the request id
//! together with the next page number.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a Favro list response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    /// Token correlating the pages of one query.
    pub request_id: String,
    /// Page number of this response (0-indexed).
    #[serde(default)]
    pub page: u32,
    /// Total number of pages.
    #[serde(default)]
    pub pages: u32,
    /// The entities on this page.
    #[serde(default)]
    pub entities: Vec<Value>,
}

/// Position within a paginated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub request_id: String,
    pub page: u32,
    pub pages: u32,
}

impl PageCursor {
    /// Cursor describing the page an envelope carried.
    #[must_use]
    pub fn from_envelope(envelope: &PageEnvelope) -> Self {
        Self {
            request_id: envelope.request_id.clone(),
            page: envelope.page,
            pages: envelope.pages,
        }
    }

    /// Whether the declared page count extends beyond this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.page.saturating_add(1) < self.pages
    }

    /// Query parameters requesting the page after this one.
    #[must_use]
    pub fn next_query(&self) -> Vec<(String, String)> {
        vec![
            ("requestId".to_string(), self.request_id.clone()),
            ("page".to_string(), (self.page + 1).to_string()),
        ]
    }
}

/// Entities accumulated by one paginated fetch, in page order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityCollection {
    /// The entities, in the order their pages arrived.
    pub entities: Vec<Value>,
    /// Number of pages successfully read.
    pub pages_fetched: u32,
    /// Whether a failure cut the fetch short.
    pub truncated: bool,
}

impl EntityCollection {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page's entities.
    pub fn push_page(&mut self, entities: Vec<Value>) {
        self.entities.extend(entities);
        self.pages_fetched += 1;
    }

    /// Returns true if no entity was fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns an iterator over the entities.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.entities.iter()
    }

    /// Consume the collection, keeping only the entities.
    #[must_use]
    pub fn into_entities(self) -> Vec<Value> {
        self.entities
    }
}

impl From<Vec<Value>> for EntityCollection {
    fn from(entities: Vec<Value>) -> Self {
        Self {
            entities,
            pages_fetched: 1,
            truncated: false,
        }
    }
}

impl IntoIterator for EntityCollection {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
