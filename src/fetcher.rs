//! Paginated fetch of one logical Favro query.
//!
//! A fetch walks every page of a list endpoint, echoing the server's
//! request id on each follow-up page, and accumulates the entities in page
//! order. Failures are fail-soft: whatever pages arrived before the failure
//! are returned and the collection is flagged as truncated.

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::client::{FavroClient, BACKEND_HEADER};
use crate::error::{ExportError, Result};
use crate::pagination::{EntityCollection, PageCursor, PageEnvelope};
use crate::session::ExportSession;
use crate::traits::ResourceSource;

/// Maximum pages to fetch for one query (safety limit).
const MAX_PAGES: u32 = 1000;

/// One logical list query against the Favro API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Endpoint path relative to the API base (e.g. `cards`).
    pub path: String,
    /// Query parameters identifying the parent resource.
    pub query: Vec<(String, String)>,
    /// Organization the query is scoped to.
    pub organization: Option<String>,
}

impl FetchRequest {
    /// Query an endpoint without parent parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            organization: None,
        }
    }

    /// Scope the query to an organization.
    #[must_use]
    pub fn organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization = Some(organization_id.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Fetch every page of a query.
///
/// Never fails: a transport error, a status outside 200/201/202/204 or a
/// malformed page ends the fetch and returns the pages read so far with
/// `truncated` set.
#[tracing::instrument(skip(session, request), fields(path = %request.path))]
pub async fn fetch_all(session: &mut ExportSession, request: &FetchRequest) -> EntityCollection {
    let mut collection = EntityCollection::new();
    let mut cursor: Option<PageCursor> = None;

    loop {
        let envelope = match fetch_page(session, request, cursor.as_ref()).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(
                    path = %request.path,
                    page = cursor.as_ref().map(|c| c.page + 1).unwrap_or(0),
                    error = %e,
                    "page request failed, keeping {} entities already fetched",
                    collection.len()
                );
                collection.truncated = true;
                break;
            }
        };

        let next = PageCursor::from_envelope(&envelope);
        tracing::debug!(
            page = next.page,
            pages = next.pages,
            entities = envelope.entities.len(),
            "received page"
        );

        if let Some(previous) = &cursor {
            if next.page <= previous.page {
                tracing::warn!(
                    requested = previous.page + 1,
                    received = next.page,
                    "server did not advance the page, stopping"
                );
                break;
            }
        }

        collection.push_page(envelope.entities);

        if !next.has_more() {
            break;
        }

        if collection.pages_fetched >= MAX_PAGES {
            tracing::warn!("Reached pagination limit of {} pages, stopping", MAX_PAGES);
            collection.truncated = true;
            break;
        }

        cursor = Some(next);
    }

    collection
}

/// Request a single page.
///
/// `Ok(None)` means an accepted response with no body (e.g. 204), which
/// ends the query.
async fn fetch_page(
    session: &mut ExportSession,
    request: &FetchRequest,
    cursor: Option<&PageCursor>,
) -> Result<Option<PageEnvelope>> {
    session.pacer_mut().wait_if_needed().await;

    let headers = session.request_headers(request.organization.as_deref())?;
    let mut query = request.query.clone();
    if let Some(cursor) = cursor {
        query.extend(cursor.next_query());
    }

    session.count_request();
    let response = session.client().get(&request.path, headers, &query).await?;

    // Routing and pacing apply to the next request whatever this one's outcome
    observe_response(session, response.headers());

    let response = FavroClient::check_response(response).await?;
    let body = response.text().await.map_err(ExportError::HttpError)?;
    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: PageEnvelope = serde_json::from_str(&body)?;
    Ok(Some(envelope))
}

fn observe_response(session: &mut ExportSession, headers: &HeaderMap) {
    let backend = headers.get(BACKEND_HEADER).and_then(|v| v.to_str().ok());
    session.pin_backend(backend);
    session.pacer_mut().observe(headers);
}

#[async_trait]
impl ResourceSource for ExportSession {
    async fn fetch_all(&mut self, request: &FetchRequest) -> EntityCollection {
        fetch_all(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = FetchRequest::new("columns")
            .organization("org-1")
            .param("widgetCommonId", "w-1");

        assert_eq!(request.path, "columns");
        assert_eq!(request.organization.as_deref(), Some("org-1"));
        assert_eq!(
            request.query,
            vec![("widgetCommonId".to_string(), "w-1".to_string())]
        );
    }
}
