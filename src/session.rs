//! Per-run export session state.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::client::{FavroClient, BACKEND_HEADER, ORGANIZATION_HEADER};
use crate::error::{ExportError, Result};
use crate::pacer::RequestPacer;

/// Mutable state threaded through every request of one export run.
///
/// Holds the client, the backend shard the account was routed to, the
/// optional organization scope and the request pacer. Requests are issued
/// strictly one after another, and whatever response *N* teaches the
/// session is applied before request *N + 1* is built.
#[derive(Debug)]
pub struct ExportSession {
    client: FavroClient,
    backend_id: Option<String>,
    organization_scope: Option<String>,
    pacer: RequestPacer,
    requests: u64,
}

impl ExportSession {
    /// Create a session with no routing or pacing knowledge yet.
    pub fn new(client: FavroClient) -> Self {
        Self {
            client,
            backend_id: None,
            organization_scope: None,
            pacer: RequestPacer::new(),
            requests: 0,
        }
    }

    /// Restrict every request of the session to one organization.
    #[must_use]
    pub fn with_organization_scope(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_scope = Some(organization_id.into());
        self
    }

    /// The underlying client.
    pub fn client(&self) -> &FavroClient {
        &self.client
    }

    /// The organization scope override, if any.
    pub fn organization_scope(&self) -> Option<&str> {
        self.organization_scope.as_deref()
    }

    /// The pinned backend identifier, once observed.
    pub fn backend_id(&self) -> Option<&str> {
        self.backend_id.as_deref()
    }

    /// Number of API requests issued so far.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub(crate) fn pacer_mut(&mut self) -> &mut RequestPacer {
        &mut self.pacer
    }

    pub(crate) fn count_request(&mut self) {
        self.requests += 1;
    }

    /// Record the backend identifier from a response.
    ///
    /// The first identifier seen is pinned for the rest of the session. A
    /// response naming a different backend does not move the pin, and a
    /// response without the header leaves it untouched.
    pub fn pin_backend(&mut self, backend_id: Option<&str>) {
        let Some(seen) = backend_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return;
        };

        match &self.backend_id {
            None => {
                tracing::debug!(backend_id = seen, "pinned backend");
                self.backend_id = Some(seen.to_string());
            }
            Some(pinned) if pinned != seen => {
                tracing::warn!(
                    pinned = %pinned,
                    seen,
                    "response came from a different backend, keeping the pinned one"
                );
            }
            Some(_) => {}
        }
    }

    /// Organization to scope a request to: the explicit one, else the
    /// session override.
    pub fn organization_for<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit
            .filter(|s| !s.is_empty())
            .or(self.organization_scope.as_deref())
    }

    /// Routing headers for the next request.
    pub fn request_headers(&self, organization: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(org) = self.organization_for(organization) {
            headers.insert(
                HeaderName::from_static(ORGANIZATION_HEADER),
                header_value(org)?,
            );
        }

        if let Some(backend) = &self.backend_id {
            headers.insert(HeaderName::from_static(BACKEND_HEADER), header_value(backend)?);
        }

        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ExportError::InvalidHeader(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_API_URL;

    fn session() -> ExportSession {
        ExportSession::new(FavroClient::new("u", "t", DEFAULT_API_URL).unwrap())
    }

    #[test]
    fn test_first_backend_is_pinned() {
        let mut session = session();
        session.pin_backend(None);
        assert_eq!(session.backend_id(), None);

        session.pin_backend(Some("backend-1"));
        session.pin_backend(Some("backend-2"));
        session.pin_backend(None);
        session.pin_backend(Some(""));
        assert_eq!(session.backend_id(), Some("backend-1"));
    }

    #[test]
    fn test_headers_before_and_after_pinning() {
        let mut session = session();
        let headers = session.request_headers(None).unwrap();
        assert!(headers.is_empty());

        session.pin_backend(Some("backend-1"));
        let headers = session.request_headers(Some("org-1")).unwrap();
        assert_eq!(headers.get(ORGANIZATION_HEADER).unwrap(), "org-1");
        assert_eq!(headers.get(BACKEND_HEADER).unwrap(), "backend-1");
    }

    #[test]
    fn test_explicit_organization_beats_scope() {
        let session = session().with_organization_scope("scoped");
        assert_eq!(session.organization_for(None), Some("scoped"));
        assert_eq!(session.organization_for(Some("explicit")), Some("explicit"));
        assert_eq!(session.organization_for(Some("")), Some("scoped"));
    }

    #[test]
    fn test_invalid_header_value_is_an_error() {
        let session = session();
        assert!(session.request_headers(Some("bad\nvalue")).is_err());
    }
}
