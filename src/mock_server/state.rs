//! Mock server state management.
//!
//! Provides the in-memory data store for the mock Favro API server.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

/// Default number of entities per page, as served by Favro.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A request as seen by the mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Request path without the leading slash (e.g. `cards`).
    pub path: String,
    /// Value of the `organizationId` header.
    pub organization: Option<String>,
    /// Value of the backend identifier header.
    pub backend: Option<String>,
    /// `requestId` query parameter.
    pub request_id: Option<String>,
    /// `page` query parameter.
    pub page: Option<u32>,
    /// Whether Basic credentials were supplied.
    pub authenticated: bool,
}

/// Shared state for the mock server.
///
/// Collections are keyed by endpoint and the scope they were listed for:
/// the organization for users, collections, tags and widgets, the widget
/// for columns and cards, the card for task lists, tasks and comments.
#[derive(Debug)]
pub struct MockState {
    /// Organizations of the account.
    pub organizations: Vec<Value>,

    /// Scoped collections indexed by [`MockState::key`].
    pub collections: HashMap<String, Vec<Value>>,

    /// Attachment bodies served under `/files/{name}`.
    pub files: HashMap<String, Vec<u8>>,

    /// Entities per page.
    pub page_size: usize,

    /// Backend identifier returned on every response.
    pub backend_id: Option<String>,

    /// Static `(remaining, reset)` rate-limit headers returned on every response.
    pub rate_limit: Option<(String, String)>,

    /// Pages (by collection key and page number) that answer with HTTP 500.
    pub failing_pages: HashSet<(String, u32)>,

    /// Reject requests without Basic credentials.
    pub require_auth: bool,

    /// Every request received, in order.
    pub requests: Vec<RecordedRequest>,

    /// Open paginated queries: request id to collection key.
    pub(crate) queries: HashMap<String, String>,

    next_request_id: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            organizations: Vec::new(),
            collections: HashMap::new(),
            files: HashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            backend_id: None,
            rate_limit: None,
            failing_pages: HashSet::new(),
            require_auth: false,
            requests: Vec::new(),
            queries: HashMap::new(),
            next_request_id: 0,
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Key of the collection listed at `path` for `scope`.
    pub fn key(path: &str, scope: &str) -> String {
        format!("{path}:{scope}")
    }

    /// Add an organization.
    pub fn with_organization(mut self, organization: Value) -> Self {
        self.organizations.push(organization);
        self
    }

    /// Set the entities listed at `path` for `scope`.
    pub fn with_entities(mut self, path: &str, scope: &str, entities: Vec<Value>) -> Self {
        self.set_entities(path, scope, entities);
        self
    }

    /// Set the entities listed at `path` for `scope`, in place.
    pub fn set_entities(&mut self, path: &str, scope: &str, entities: Vec<Value>) {
        self.collections.insert(Self::key(path, scope), entities);
    }

    /// Serve `body` under `/files/{name}`.
    pub fn with_file(mut self, name: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(name.to_string(), body.into());
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Return this backend identifier on every response.
    pub fn with_backend_id(mut self, backend_id: &str) -> Self {
        self.backend_id = Some(backend_id.to_string());
        self
    }

    /// Return these rate-limit headers on every response.
    pub fn with_rate_limit(mut self, remaining: &str, reset: &str) -> Self {
        self.rate_limit = Some((remaining.to_string(), reset.to_string()));
        self
    }

    /// Answer page `page` of the collection at `path`/`scope` with HTTP 500.
    pub fn with_failing_page(mut self, path: &str, scope: &str, page: u32) -> Self {
        self.failing_pages.insert((Self::key(path, scope), page));
        self
    }

    /// Require Basic credentials on every request.
    pub fn with_required_auth(mut self) -> Self {
        self.require_auth = true;
        self
    }

    /// Entities listed under a collection key.
    pub fn entities(&self, key: &str) -> &[Value] {
        if key == "organizations" {
            return &self.organizations;
        }
        self.collections.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Open a paginated query and return its request id.
    pub(crate) fn open_query(&mut self, key: &str) -> String {
        self.next_request_id += 1;
        let request_id = format!("req-{}", self.next_request_id);
        self.queries.insert(request_id.clone(), key.to_string());
        request_id
    }

    /// Requests received for `path`.
    pub fn requests_for(&self, path: &str) -> Vec<&RecordedRequest> {
        self.requests.iter().filter(|r| r.path == path).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_entities_by_key() {
        let state = MockState::new()
            .with_organization(json!({"organizationId": "o1"}))
            .with_entities("users", "o1", vec![json!({"userId": "u1"})]);

        assert_eq!(state.entities("organizations").len(), 1);
        assert_eq!(state.entities(&MockState::key("users", "o1")).len(), 1);
        assert!(state.entities(&MockState::key("users", "o2")).is_empty());
    }

    #[test]
    fn test_query_ids_are_unique() {
        let mut state = MockState::new();
        let first = state.open_query("organizations");
        let second = state.open_query("organizations");

        assert_ne!(first, second);
        assert_eq!(state.queries.get(&first).map(String::as_str), Some("organizations"));
    }

    #[test]
    fn test_page_size_is_at_least_one() {
        assert_eq!(MockState::new().with_page_size(0).page_size, 1);
    }
}
